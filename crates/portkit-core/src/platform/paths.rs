//! Path conventions of the host platform.
//!
//! Everything here is lexical: separators, absolute-path detection and the
//! per-OS constants are decided by the compiled target, never by probing the
//! filesystem. The only exception is [`ghostscript_command`], which looks on
//! `PATH` for the Windows console binaries.

use crate::config::PathConfig;
use crate::platform::env;
use tracing::debug;

/// Path syntax convention.
///
/// The host convention is [`PathStyle::HOST`]; the other variant stays
/// available so that both conventions can be checked from any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// `/` separators, `:` list separator, absolute paths start with `/`.
    Posix,
    /// `\` separators (`/` accepted), `;` list separator, drive letters and
    /// UNC prefixes.
    Windows,
}

impl PathStyle {
    #[cfg(windows)]
    pub const HOST: PathStyle = PathStyle::Windows;
    #[cfg(not(windows))]
    pub const HOST: PathStyle = PathStyle::Posix;

    /// Directory separator.
    pub const fn separator(self) -> char {
        match self {
            PathStyle::Posix => '/',
            PathStyle::Windows => '\\',
        }
    }

    /// Separator between entries of a search path such as `PATH`.
    pub const fn list_separator(self) -> char {
        match self {
            PathStyle::Posix => ':',
            PathStyle::Windows => ';',
        }
    }

    /// Check whether `path` is absolute under this convention.
    ///
    /// Windows paths may start with a drive designator (`C:`); what follows
    /// it must be a separator for the path to be absolute, so `C:foo` is
    /// drive-relative. UNC paths (`\\server\share`) start with a separator
    /// and are therefore absolute too.
    pub fn is_absolute(self, path: &str) -> bool {
        match self {
            PathStyle::Posix => path.starts_with('/'),
            PathStyle::Windows => {
                let bytes = path.as_bytes();
                let rest = if bytes.len() > 1 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
                {
                    &bytes[2..]
                } else {
                    bytes
                };
                matches!(rest.first(), Some(b'/') | Some(b'\\'))
            }
        }
    }

    /// Rewrite separators in `path` to this convention, in place.
    ///
    /// POSIX paths are left alone: a backslash is a legal file name
    /// character there.
    pub fn correct(self, path: &mut String) {
        if self == PathStyle::Windows && path.contains('/') {
            *path = path.replace('/', "\\");
        }
    }

    /// Corrected form of a whole search-path list, or `None` if every entry
    /// already follows this convention.
    pub fn corrected_search_path(self, value: &str) -> Option<String> {
        let mut corrected = value.to_string();
        self.correct(&mut corrected);
        (corrected != value).then_some(corrected)
    }
}

/// Directory separator of the host.
pub fn path_separator() -> char {
    PathStyle::HOST.separator()
}

/// Search-path list separator of the host.
pub fn path_list_separator() -> char {
    PathStyle::HOST.list_separator()
}

/// Lexically check whether `path` is absolute on the host.
///
/// Never touches the filesystem and never resolves symlinks.
pub fn is_absolute_path(path: &str) -> bool {
    PathStyle::HOST.is_absolute(path)
}

/// Whether file names on the host's native filesystem are case sensitive.
///
/// # Platform Behavior
/// - **Windows/macOS**: `false`
/// - **Everything else**: `true`
pub fn file_system_is_case_sensitive() -> bool {
    !cfg!(any(windows, target_os = "macos", target_os = "ios"))
}

/// Normalize separators in `path` to the host convention.
pub fn correct_path(path: &mut String) {
    PathStyle::HOST.correct(path);
}

/// Normalize the separators of every entry of the `PATH` variable.
///
/// Returns `true` if the variable was rewritten.
pub fn correct_search_path() -> bool {
    let Some(current) = env::getenv(PathConfig::SEARCH_PATH_VAR) else {
        return false;
    };
    let Some(corrected) = PathStyle::HOST.corrected_search_path(&current) else {
        return false;
    };
    debug!("Normalizing separators in {}", PathConfig::SEARCH_PATH_VAR);
    env::setenv(PathConfig::SEARCH_PATH_VAR, &corrected).is_ok()
}

/// Path of the null device.
///
/// # Platform Behavior
/// - **Windows**: `NUL`
/// - **Everything else**: `/dev/null`
pub fn dev_null_path() -> &'static str {
    #[cfg(windows)]
    {
        "NUL"
    }
    #[cfg(not(windows))]
    {
        "/dev/null"
    }
}

/// Suffix carried by executables on the host (`.exe` on Windows, empty
/// elsewhere).
pub fn command_extension() -> &'static str {
    #[cfg(windows)]
    {
        ".exe"
    }
    #[cfg(not(windows))]
    {
        ""
    }
}

/// Name of the PostScript interpreter to invoke on the host.
///
/// # Platform Behavior
/// - **Windows**: the first of `gswin32c.exe`, `gswin64c.exe` found on
///   `PATH`; `gswin32c.exe` if neither is installed
/// - **Everything else**: `gs`
pub fn ghostscript_command() -> &'static str {
    #[cfg(windows)]
    {
        let candidates = PathConfig::WINDOWS_GHOSTSCRIPT_CANDIDATES;
        candidates
            .iter()
            .copied()
            .find(|name| super::permissions::check_executable(name))
            .unwrap_or(candidates[0])
    }
    #[cfg(not(windows))]
    {
        PathConfig::POSIX_GHOSTSCRIPT
    }
}

/// Split a search path on the host list separator, skipping empty entries.
pub(crate) fn split_search_path(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(path_list_separator())
        .filter(|entry| !entry.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posix_absolute_paths() {
        let style = PathStyle::Posix;
        assert!(style.is_absolute("/"));
        assert!(style.is_absolute("/usr/bin/gs"));
        assert!(!style.is_absolute("usr/bin"));
        assert!(!style.is_absolute("./a"));
        assert!(!style.is_absolute(""));
        assert!(!style.is_absolute("C:\\Windows"));
        assert!(!style.is_absolute("\\\\server\\share"));
    }

    #[test]
    fn test_windows_absolute_paths() {
        let style = PathStyle::Windows;
        assert!(style.is_absolute("C:\\Windows"));
        assert!(style.is_absolute("c:/tools/gs"));
        assert!(style.is_absolute("\\\\server\\share\\file"));
        assert!(style.is_absolute("\\temp"));
        assert!(style.is_absolute("/temp"));
        assert!(!style.is_absolute("C:relative"));
        assert!(!style.is_absolute("C:"));
        assert!(!style.is_absolute("docs\\index.html"));
        assert!(!style.is_absolute("1:\\nope"));
        assert!(!style.is_absolute(""));
    }

    #[test]
    fn test_host_matches_style() {
        assert_eq!(path_separator(), PathStyle::HOST.separator());
        assert_eq!(path_list_separator(), PathStyle::HOST.list_separator());

        #[cfg(unix)]
        {
            assert_eq!(path_separator(), '/');
            assert_eq!(path_list_separator(), ':');
            assert!(is_absolute_path("/etc/hosts"));
        }

        #[cfg(windows)]
        {
            assert_eq!(path_separator(), '\\');
            assert_eq!(path_list_separator(), ';');
            assert!(is_absolute_path("C:\\Windows"));
        }
    }

    #[test]
    fn test_correct_path_windows_style() {
        let mut path = String::from("C:/Program Files/gs/bin");
        PathStyle::Windows.correct(&mut path);
        assert_eq!(path, "C:\\Program Files\\gs\\bin");
    }

    #[test]
    fn test_correct_path_posix_style_keeps_backslashes() {
        let mut path = String::from("/tmp/odd\\name");
        PathStyle::Posix.correct(&mut path);
        assert_eq!(path, "/tmp/odd\\name");
    }

    #[test]
    fn test_corrected_search_path_windows_style() {
        let style = PathStyle::Windows;
        assert_eq!(
            style.corrected_search_path("C:/gs/bin;D:/tools;C:\\Windows").as_deref(),
            Some("C:\\gs\\bin;D:\\tools;C:\\Windows")
        );
        assert_eq!(style.corrected_search_path("C:\\gs\\bin;D:\\tools"), None);
        assert_eq!(style.corrected_search_path(""), None);
    }

    #[test]
    fn test_corrected_search_path_posix_style_is_untouched() {
        let style = PathStyle::Posix;
        assert_eq!(style.corrected_search_path("/usr/bin:/bin"), None);
        assert_eq!(style.corrected_search_path("/opt/odd\\dir:/bin"), None);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_correct_search_path_leaves_posix_path_alone() {
        let before = env::getenv(PathConfig::SEARCH_PATH_VAR);
        assert!(!correct_search_path());
        assert_eq!(env::getenv(PathConfig::SEARCH_PATH_VAR), before);
    }

    #[test]
    fn test_platform_constants() {
        #[cfg(unix)]
        {
            assert_eq!(dev_null_path(), "/dev/null");
            assert_eq!(command_extension(), "");
            assert_eq!(ghostscript_command(), "gs");
        }

        #[cfg(windows)]
        {
            assert_eq!(dev_null_path(), "NUL");
            assert_eq!(command_extension(), ".exe");
            assert!(ghostscript_command().starts_with("gswin"));
        }

        #[cfg(target_os = "linux")]
        assert!(file_system_is_case_sensitive());

        #[cfg(any(windows, target_os = "macos"))]
        assert!(!file_system_is_case_sensitive());
    }

    #[test]
    fn test_split_search_path_skips_empty_entries() {
        let sep = path_list_separator();
        let value = format!("a{sep}{sep}b{sep}");
        let entries: Vec<&str> = split_search_path(&value).collect();
        assert_eq!(entries, vec!["a", "b"]);
    }
}
