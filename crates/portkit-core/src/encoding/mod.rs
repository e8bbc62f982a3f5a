//! Streaming character-encoding conversion.
//!
//! A [`Transcoder`] is an open conversion session between two named
//! encodings. It is fed byte buffers incrementally and reports, for each
//! call, exactly how much input it consumed and how much output it produced.
//! That makes it resumable across buffer boundaries: a multi-byte sequence
//! cut off at the end of one buffer is left unconsumed and must be presented
//! again, followed by the next chunk.
//!
//! # Backends
//!
//! - **Unix**: the C library's `iconv`, so every charset the host knows is
//!   available.
//! - **Everything else**: the builtin Unicode codec (UTF-8/16/32, ASCII,
//!   Latin-1). It can also be selected explicitly with
//!   [`Transcoder::open_builtin`].

mod builtin;
#[cfg(unix)]
mod iconv;

pub use builtin::Charset;

use crate::config::EncodingConfig;
use crate::error::{PortkitError, Result};
use tracing::debug;

/// Why a [`Transcoder::convert`] call stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertStatus {
    /// All input was consumed.
    Complete,
    /// The input ends inside a multi-byte sequence. The partial sequence was
    /// not consumed.
    IncompleteInput,
    /// The next character did not fit in the output buffer. Retry with more
    /// output space; no input was lost.
    OutputFull,
    /// The input holds a sequence that is invalid in the source encoding, or
    /// a character the target encoding cannot represent. `consumed` points
    /// at its first byte.
    InvalidInput,
}

/// Progress made by one conversion call.
///
/// The counts are valid whatever the status, so partial progress is never
/// hidden behind an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    /// Bytes taken from the input.
    pub consumed: usize,
    /// Bytes written to the output.
    pub produced: usize,
    pub status: ConvertStatus,
}

impl Conversion {
    pub fn is_complete(&self) -> bool {
        self.status == ConvertStatus::Complete
    }
}

/// Which implementation backs a [`Transcoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Iconv,
    Builtin,
}

enum Backend {
    #[cfg(unix)]
    Iconv(iconv::IconvHandle),
    Builtin(builtin::UnicodeCodec),
}

impl Backend {
    fn kind(&self) -> BackendKind {
        match self {
            #[cfg(unix)]
            Backend::Iconv(_) => BackendKind::Iconv,
            Backend::Builtin(_) => BackendKind::Builtin,
        }
    }

    fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Conversion {
        match self {
            #[cfg(unix)]
            Backend::Iconv(handle) => handle.convert(input, output),
            Backend::Builtin(codec) => codec.convert(input, output),
        }
    }

    fn finish(&mut self, output: &mut [u8]) -> Conversion {
        match self {
            #[cfg(unix)]
            Backend::Iconv(handle) => handle.finish(output),
            Backend::Builtin(_) => Conversion {
                consumed: 0,
                produced: 0,
                status: ConvertStatus::Complete,
            },
        }
    }

    fn close(self) -> Result<()> {
        match self {
            #[cfg(unix)]
            Backend::Iconv(handle) => handle.close(),
            Backend::Builtin(_) => Ok(()),
        }
    }
}

/// An open conversion session. See the [module docs](self).
///
/// The session moves from open to closed exactly once, through
/// [`close`](Self::close) or by being dropped. Using it after `close`
/// returns [`PortkitError::HandleClosed`].
pub struct Transcoder {
    to: String,
    from: String,
    backend: Option<Backend>,
}

impl Transcoder {
    /// Open a session converting from `from` to `to` with the host backend.
    ///
    /// Fails with [`PortkitError::UnsupportedEncoding`] if either name is
    /// unknown to the backend.
    pub fn open(to: &str, from: &str) -> Result<Self> {
        #[cfg(unix)]
        {
            let handle = iconv::IconvHandle::open(to, from)?;
            Ok(Self::with_backend(to, from, Backend::Iconv(handle)))
        }

        #[cfg(not(unix))]
        {
            Self::open_builtin(to, from)
        }
    }

    /// Open a session backed by the builtin Unicode codec on any host.
    pub fn open_builtin(to: &str, from: &str) -> Result<Self> {
        let codec =
            builtin::UnicodeCodec::new(to, from).ok_or_else(|| PortkitError::UnsupportedEncoding {
                to: to.to_string(),
                from: from.to_string(),
            })?;
        Ok(Self::with_backend(to, from, Backend::Builtin(codec)))
    }

    fn with_backend(to: &str, from: &str, backend: Backend) -> Self {
        debug!("Opened {:?} transcoder {} -> {}", backend.kind(), from, to);
        Self {
            to: to.to_string(),
            from: from.to_string(),
            backend: Some(backend),
        }
    }

    /// Convert as much of `input` into `output` as possible.
    pub fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Result<Conversion> {
        let backend = self.backend_mut()?;
        Ok(backend.convert(input, output))
    }

    /// Write whatever the target encoding needs to return to its initial
    /// state. Only stateful encodings (e.g. ISO-2022 variants) emit bytes.
    pub fn finish(&mut self, output: &mut [u8]) -> Result<Conversion> {
        let backend = self.backend_mut()?;
        Ok(backend.finish(output))
    }

    /// Release the session. A second call returns `HandleClosed`.
    pub fn close(&mut self) -> Result<()> {
        let backend = self
            .backend
            .take()
            .ok_or(PortkitError::HandleClosed("transcoder"))?;
        debug!("Closing transcoder {} -> {}", self.from, self.to);
        backend.close()
    }

    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// Backend of an open session.
    pub fn backend(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(Backend::kind)
    }

    pub fn source_encoding(&self) -> &str {
        &self.from
    }

    pub fn target_encoding(&self) -> &str {
        &self.to
    }

    fn backend_mut(&mut self) -> Result<&mut Backend> {
        self.backend
            .as_mut()
            .ok_or(PortkitError::HandleClosed("transcoder"))
    }
}

impl std::fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcoder")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("backend", &self.backend())
            .finish()
    }
}

/// Recode a whole UTF-8 buffer to UTF-16 code units (no terminator).
///
/// Fails with [`PortkitError::MalformedInput`] at the offset of the first
/// invalid or truncated sequence.
pub fn recode_utf8_to_wide(input: &[u8]) -> Result<Vec<u16>> {
    let mut transcoder = Transcoder::open_builtin("UTF-16LE", "UTF-8")?;
    let mut output = vec![0u8; EncodingConfig::RECODE_MIN_OUTPUT.max(input.len())];
    let mut consumed = 0;
    let mut produced = 0;

    loop {
        let step = transcoder.convert(&input[consumed..], &mut output[produced..])?;
        consumed += step.consumed;
        produced += step.produced;
        match step.status {
            ConvertStatus::Complete => break,
            ConvertStatus::OutputFull => {
                let grown = output.len() * EncodingConfig::RECODE_GROWTH_FACTOR;
                output.resize(grown, 0);
            }
            ConvertStatus::IncompleteInput | ConvertStatus::InvalidInput => {
                return Err(PortkitError::MalformedInput { offset: consumed });
            }
        }
    }
    transcoder.close()?;

    Ok(output[..produced]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}
