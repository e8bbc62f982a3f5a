//! Centralized configuration for the portkit facade.
//!
//! The facade has no runtime configuration file; these constants are the
//! knobs that differ per platform or that callers may want to reference.

/// Subprocess launch configuration.
pub struct ProcessConfig;

impl ProcessConfig {
    /// Exit code reported by [`crate::ProcessStatus::code`] when the child
    /// could not be spawned at all.
    pub const SPAWN_FAILED_EXIT_CODE: i32 = -1;
    /// Shell used to interpret argument strings on POSIX hosts.
    pub const POSIX_SHELL: &'static str = "/bin/sh";
    /// Shell used to interpret pipe command lines on Windows hosts.
    pub const WINDOWS_SHELL: &'static str = "cmd";
    /// Shell convention for a child killed by a signal: `128 + signo`.
    pub const SIGNAL_EXIT_BASE: i32 = 128;
}

/// Path and executable lookup configuration.
pub struct PathConfig;

impl PathConfig {
    /// Extensions tried, in order, when probing for an executable on
    /// Windows-class hosts.
    pub const WINDOWS_EXECUTABLE_EXTENSIONS: &'static [&'static str] =
        &[".exe", ".com", ".bat", ".cmd"];
    /// Ghostscript console executables, in preference order.
    pub const WINDOWS_GHOSTSCRIPT_CANDIDATES: &'static [&'static str] =
        &["gswin32c.exe", "gswin64c.exe"];
    pub const POSIX_GHOSTSCRIPT: &'static str = "gs";
    /// Environment variable holding the executable search path.
    pub const SEARCH_PATH_VAR: &'static str = "PATH";
}

/// Buffered file I/O configuration.
pub struct IoConfig;

impl IoConfig {
    pub const STREAM_BUFFER_CAPACITY: usize = 8 * 1024;
}

/// Whole-buffer recoding configuration.
pub struct EncodingConfig;

impl EncodingConfig {
    /// Minimum output buffer size for a whole-buffer recode.
    pub const RECODE_MIN_OUTPUT: usize = 64;
    /// Factor applied to the output buffer when the transcoder reports that
    /// it is full.
    pub const RECODE_GROWTH_FACTOR: usize = 2;
}
