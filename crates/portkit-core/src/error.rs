//! Error types for the portkit facade.
//!
//! Most facade operations report "not found" conditions through sentinel
//! values (`Option::None`, a spawn-failed process status, a conversion
//! status). This enum covers the remaining failures: OS errors that the
//! caller may want to inspect, malformed caller input, and misuse of closed
//! handles.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the portkit facade.
#[derive(Debug, Error)]
pub enum PortkitError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid open mode: {mode:?}")]
    InvalidMode { mode: String },

    #[error("Invalid seek offset {offset}")]
    InvalidOffset { offset: i64 },

    #[error("File position {0} does not fit in a signed 64-bit offset")]
    OffsetOverflow(u64),

    // Environment errors
    #[error("Invalid environment variable name: {0:?}")]
    InvalidEnvName(String),

    // Process errors
    #[error("Failed to spawn {command}: {message}")]
    SpawnFailed { command: String, message: String },

    // Encoding errors
    #[error("Unsupported conversion from {from} to {to}")]
    UnsupportedEncoding { to: String, from: String },

    #[error("Malformed input at byte {offset}")]
    MalformedInput { offset: usize },

    #[error("{0} handle is already closed")]
    HandleClosed(&'static str),

    // Timer errors
    #[error("Timer is already running")]
    TimerAlreadyRunning,

    #[error("Timer is not running")]
    TimerNotRunning,

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for portkit operations.
pub type Result<T> = std::result::Result<T, PortkitError>;

impl From<std::io::Error> for PortkitError {
    fn from(err: std::io::Error) -> Self {
        PortkitError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl PortkitError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        PortkitError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// The raw OS error code behind this error, if there is one.
    ///
    /// The facade does not interpret these codes; they are passed through so
    /// callers can make their own decisions (e.g. permission vs. busy file).
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            PortkitError::Io {
                source: Some(source),
                ..
            } => source.raw_os_error(),
            _ => None,
        }
    }

    /// The `io::ErrorKind` behind this error, if it came from the OS.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            PortkitError::Io {
                source: Some(source),
                ..
            } => Some(source.kind()),
            _ => None,
        }
    }

    /// Check if this error is caused by using a handle after it was closed.
    pub fn is_handle_closed(&self) -> bool {
        matches!(self, PortkitError::HandleClosed(_))
    }
}
