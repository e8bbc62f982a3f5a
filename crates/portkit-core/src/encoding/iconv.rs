//! Host `iconv(3)` backend.
//!
//! This module owns the FFI boundary to the C library's conversion
//! functions and is therefore allowed to use `unsafe`.
#![allow(unsafe_code)]

use super::{Conversion, ConvertStatus};
use crate::error::{PortkitError, Result};
use std::ffi::CString;
use std::io;
use std::os::raw::{c_char, c_int};
use tracing::warn;

/// `(iconv_t)-1`, returned by `iconv_open` on failure.
const INVALID_DESCRIPTOR: usize = usize::MAX;
/// `(size_t)-1`, returned by `iconv` on failure.
const ICONV_ERROR: usize = usize::MAX;

/// An open `iconv_t` descriptor. Closed on drop.
pub(super) struct IconvHandle {
    cd: libc::iconv_t,
}

// SAFETY: an iconv descriptor is plain heap state owned by this handle; it
// may be used from any thread as long as it is not used concurrently, which
// `&mut self` on every operation guarantees.
unsafe impl Send for IconvHandle {}

impl IconvHandle {
    pub(super) fn open(to: &str, from: &str) -> Result<Self> {
        let unsupported = || PortkitError::UnsupportedEncoding {
            to: to.to_string(),
            from: from.to_string(),
        };
        let to_c = CString::new(to).map_err(|_| unsupported())?;
        let from_c = CString::new(from).map_err(|_| unsupported())?;

        // SAFETY: both arguments are valid NUL-terminated strings that live
        // for the duration of the call.
        let cd = unsafe { libc::iconv_open(to_c.as_ptr(), from_c.as_ptr()) };
        if cd as usize == INVALID_DESCRIPTOR {
            return Err(unsupported());
        }
        Ok(Self { cd })
    }

    pub(super) fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Conversion {
        let mut in_ptr = input.as_ptr() as *mut c_char;
        let mut in_left = input.len();
        let mut out_ptr = output.as_mut_ptr() as *mut c_char;
        let mut out_left = output.len();

        // SAFETY: the pointer/length pairs describe the live `input` and
        // `output` slices. iconv never writes through the input pointer and
        // never writes more than `out_left` bytes of output.
        let rc = unsafe {
            libc::iconv(
                self.cd,
                &mut in_ptr,
                &mut in_left,
                &mut out_ptr,
                &mut out_left,
            )
        };

        Conversion {
            consumed: input.len() - in_left,
            produced: output.len() - out_left,
            status: status_of(rc),
        }
    }

    /// Emit whatever sequence returns the target to its initial shift state.
    pub(super) fn finish(&mut self, output: &mut [u8]) -> Conversion {
        let mut out_ptr = output.as_mut_ptr() as *mut c_char;
        let mut out_left = output.len();

        // SAFETY: a null input buffer asks iconv to write the reset sequence
        // only; the output pair describes the live `output` slice.
        let rc = unsafe {
            libc::iconv(
                self.cd,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                &mut out_ptr,
                &mut out_left,
            )
        };

        Conversion {
            consumed: 0,
            produced: output.len() - out_left,
            status: status_of(rc),
        }
    }

    pub(super) fn close(mut self) -> Result<()> {
        match self.release() {
            0 => Ok(()),
            _ => Err(io::Error::last_os_error().into()),
        }
    }

    fn release(&mut self) -> c_int {
        if self.cd as usize == INVALID_DESCRIPTOR {
            return 0;
        }
        // SAFETY: `cd` came from a successful `iconv_open` and is closed at
        // most once because it is invalidated right after.
        let rc = unsafe { libc::iconv_close(self.cd) };
        self.cd = INVALID_DESCRIPTOR as libc::iconv_t;
        rc
    }
}

impl Drop for IconvHandle {
    fn drop(&mut self) {
        if self.release() != 0 {
            warn!("iconv_close failed: {}", io::Error::last_os_error());
        }
    }
}

fn status_of(rc: usize) -> ConvertStatus {
    if rc != ICONV_ERROR {
        return ConvertStatus::Complete;
    }
    match io::Error::last_os_error().raw_os_error() {
        Some(libc::E2BIG) => ConvertStatus::OutputFull,
        Some(libc::EINVAL) => ConvertStatus::IncompleteInput,
        _ => ConvertStatus::InvalidInput,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_charset_is_rejected() {
        assert!(matches!(
            IconvHandle::open("UTF-16LE", "NO-SUCH-CHARSET-XYZ"),
            Err(PortkitError::UnsupportedEncoding { .. })
        ));
        assert!(IconvHandle::open("UTF\0-8", "UTF-8").is_err());
    }

    #[test]
    fn test_ascii_to_utf16le() {
        let mut handle = IconvHandle::open("UTF-16LE", "UTF-8").unwrap();
        let mut out = [0u8; 8];
        let step = handle.convert(b"ok", &mut out);
        assert_eq!(step.status, ConvertStatus::Complete);
        assert_eq!(step.consumed, 2);
        assert_eq!(&out[..step.produced], &[b'o', 0, b'k', 0]);
        handle.close().unwrap();
    }

    #[test]
    fn test_finish_on_stateless_target_writes_nothing() {
        let mut handle = IconvHandle::open("UTF-8", "ISO-8859-1").unwrap();
        let mut out = [0u8; 4];
        let step = handle.finish(&mut out);
        assert_eq!(step.status, ConvertStatus::Complete);
        assert_eq!(step.produced, 0);
    }
}
