//! Caller-owned facade state.
//!
//! The facade keeps exactly two pieces of state: the external-tool timer and
//! the short form of the installation directory. Both live in a
//! [`PlatformContext`] owned by the caller rather than in globals, so
//! independent contexts (e.g. parallel tests) never interfere.
//!
//! The context is `!Sync`. Sharing one between threads needs an external
//! lock, which the compiler enforces.

use crate::error::{PortkitError, Result};
use crate::timer::SysTimer;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Timer and short-path cache for one facade user.
#[derive(Debug, Default)]
pub struct PlatformContext {
    timer: SysTimer,
    short_dir: OnceCell<PathBuf>,
}

impl PlatformContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the external-tool timer.
    pub fn timer_start(&mut self) -> Result<()> {
        self.timer.start()
    }

    /// Stop the external-tool timer, returning the accumulated seconds.
    pub fn timer_stop(&mut self) -> Result<f64> {
        self.timer.stop()
    }

    /// Accumulated seconds, including a running session.
    pub fn elapsed_seconds(&self) -> f64 {
        self.timer.elapsed_seconds()
    }

    pub fn timer(&self) -> &SysTimer {
        &self.timer
    }

    /// Compute the short form of the current directory, once.
    ///
    /// The first successful call fixes the cached value; later calls return
    /// it without looking at the filesystem again, even if the directory has
    /// since been moved or removed. A failed computation is not cached.
    pub fn compute_short_dir_once(&self) -> Result<&Path> {
        if let Some(dir) = self.short_dir.get() {
            return Ok(dir);
        }
        let cwd = std::env::current_dir()?;
        self.compute_short_dir_once_for(&cwd)
    }

    /// Like [`compute_short_dir_once`](Self::compute_short_dir_once), for an
    /// explicit installation directory.
    pub fn compute_short_dir_once_for(&self, long: &Path) -> Result<&Path> {
        if let Some(dir) = self.short_dir.get() {
            trace!("Short directory already cached: {}", dir.display());
            return Ok(dir);
        }

        let short = short_path(long)?;
        debug!("Short directory for {} is {}", long.display(), short.display());
        Ok(self.short_dir.get_or_init(|| short))
    }

    /// The cached short directory, if it has been computed.
    pub fn short_dir(&self) -> Option<&Path> {
        self.short_dir.get().map(PathBuf::as_path)
    }
}

/// 8.3-safe form of an existing path.
///
/// # Platform Behavior
/// - **Windows**: `GetShortPathNameW`
/// - **Everything else**: the absolute path itself (no short names exist)
#[cfg(windows)]
#[allow(unsafe_code)]
fn short_path(long: &Path) -> Result<PathBuf> {
    use std::ffi::OsString;
    use std::os::windows::ffi::{OsStrExt, OsStringExt};
    use windows_sys::Win32::Storage::FileSystem::GetShortPathNameW;

    let wide: Vec<u16> = long
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    // SAFETY: `wide` is NUL-terminated and outlives the call; a null output
    // buffer with length 0 only queries the required size.
    let needed = unsafe { GetShortPathNameW(wide.as_ptr(), std::ptr::null_mut(), 0) };
    if needed == 0 {
        return Err(PortkitError::io_with_path(
            std::io::Error::last_os_error(),
            long,
        ));
    }

    let mut buf = vec![0u16; needed as usize];
    // SAFETY: `buf` has room for `needed` UTF-16 units including the NUL.
    let written = unsafe { GetShortPathNameW(wide.as_ptr(), buf.as_mut_ptr(), needed) };
    if written == 0 || written >= needed {
        return Err(PortkitError::io_with_path(
            std::io::Error::last_os_error(),
            long,
        ));
    }
    buf.truncate(written as usize);
    Ok(PathBuf::from(OsString::from_wide(&buf)))
}

#[cfg(not(windows))]
fn short_path(long: &Path) -> Result<PathBuf> {
    std::fs::metadata(long).map_err(|e| PortkitError::io_with_path(e, long))?;
    if long.is_absolute() {
        Ok(long.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(long))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_timer_through_context() {
        let mut ctx = PlatformContext::new();
        ctx.timer_start().unwrap();
        let first = ctx.elapsed_seconds();
        let second = ctx.elapsed_seconds();
        assert!(second >= first);
        assert!(ctx.timer().is_running());

        let total = ctx.timer_stop().unwrap();
        assert!(total >= second);
        assert!(ctx.timer_stop().is_err());
    }

    #[test]
    fn test_short_dir_starts_empty() {
        let ctx = PlatformContext::new();
        assert!(ctx.short_dir().is_none());
    }

    #[test]
    fn test_short_dir_for_existing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = PlatformContext::new();
        let short = ctx.compute_short_dir_once_for(temp_dir.path()).unwrap().to_path_buf();

        assert!(short.exists());
        assert_eq!(ctx.short_dir(), Some(short.as_path()));

        #[cfg(not(windows))]
        assert_eq!(short, temp_dir.path());
    }

    #[test]
    fn test_short_dir_failure_is_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = PlatformContext::new();

        let missing = temp_dir.path().join("not-there");
        assert!(ctx.compute_short_dir_once_for(&missing).is_err());
        assert!(ctx.short_dir().is_none());

        assert!(ctx.compute_short_dir_once_for(temp_dir.path()).is_ok());
        assert!(ctx.short_dir().is_some());
    }

    #[test]
    fn test_current_directory_short_form() {
        let ctx = PlatformContext::new();
        let short = ctx.compute_short_dir_once().unwrap();
        assert!(short.is_absolute());
    }
}
