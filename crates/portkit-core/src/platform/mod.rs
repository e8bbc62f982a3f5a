//! Platform abstraction layer.
//!
//! All `#[cfg]` branching on the target OS lives in this module, so callers
//! see a single contract wherever they are compiled.
//!
//! # Architecture
//!
//! Each submodule handles a specific cross-platform concern:
//! - `env` - Environment variable access
//! - `file` - Buffered file I/O with 64-bit offsets
//! - `paths` - Separators, absolute-path detection and per-OS constants
//! - `permissions` - Executable detection and `PATH` lookup
//! - `process` - Blocking subprocess launch and pipes
//!
//! # Supported Platforms
//!
//! - **Linux**: Full support
//! - **macOS**: Full support
//! - **Windows**: Full support (builtin transcoder instead of iconv)

pub mod env;
pub mod file;
pub mod paths;
pub mod permissions;
pub mod process;

// Re-export commonly used items
pub use env::{getenv, setenv, unsetenv};
pub use file::{remove, FileOffset, OpenMode, PortableFile, Whence};
pub use paths::{
    command_extension, correct_path, correct_search_path, dev_null_path,
    file_system_is_case_sensitive, ghostscript_command, is_absolute_path, path_list_separator,
    path_separator, PathStyle,
};
pub use permissions::{check_executable, find_executable, is_executable};
pub use process::{current_process_id, run, Pipe, PipeMode, ProcessStatus};

use serde::{Deserialize, Serialize};

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        "unknown"
    }
}

/// Returns true if the current platform is supported.
pub fn is_supported_platform() -> bool {
    cfg!(any(target_os = "linux", target_os = "windows", target_os = "macos"))
}

/// Snapshot of the constants the facade exposes for this host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub platform: String,
    pub supported: bool,
    pub process_id: u32,
    pub path_separator: char,
    pub path_list_separator: char,
    pub case_sensitive: bool,
    pub dev_null: String,
    pub command_extension: String,
    pub ghostscript: String,
}

impl PlatformInfo {
    pub fn current() -> Self {
        Self {
            platform: current_platform().to_string(),
            supported: is_supported_platform(),
            process_id: current_process_id(),
            path_separator: path_separator(),
            path_list_separator: path_list_separator(),
            case_sensitive: file_system_is_case_sensitive(),
            dev_null: dev_null_path().to_string(),
            command_extension: command_extension().to_string(),
            ghostscript: ghostscript_command().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_platform() {
        let platform = current_platform();
        assert!(["linux", "windows", "macos", "unknown"].contains(&platform));
    }

    #[test]
    fn test_is_supported_platform() {
        #[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
        assert!(is_supported_platform());
    }

    #[test]
    fn test_platform_info_matches_facade() {
        let info = PlatformInfo::current();
        assert_eq!(info.platform, current_platform());
        assert_eq!(info.process_id, std::process::id());
        assert_eq!(info.path_separator, path_separator());
        assert_eq!(info.dev_null, dev_null_path());
        assert_eq!(info.ghostscript, ghostscript_command());
    }
}
