//! Executable detection and lookup.
//!
//! These are capability probes: they inspect file metadata and the `PATH`
//! variable but never spawn a process.

use crate::config::PathConfig;
use crate::platform::{env, paths};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Check if an existing regular file may be executed by this process.
///
/// # Platform Behavior
/// - **Linux/macOS**: `access(path, X_OK)`
/// - **Windows**: Extension is one of `.exe`, `.com`, `.bat`, `.cmd`
pub fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use nix::unistd::{access, AccessFlags};
        access(path, AccessFlags::X_OK).is_ok()
    }

    #[cfg(windows)]
    {
        has_executable_extension(path)
    }

    #[cfg(not(any(unix, windows)))]
    {
        true
    }
}

/// Locate an executable the way the host shell would.
///
/// A name that is absolute or contains a separator is checked directly.
/// A bare name is searched in every `PATH` entry. On Windows-class hosts a
/// name without an executable extension is also tried with each of them.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let found = if paths::is_absolute_path(name) || has_separator(name) {
        candidates(Path::new(name)).find(|candidate| is_executable(candidate))
    } else {
        let search_path = env::getenv(PathConfig::SEARCH_PATH_VAR).unwrap_or_default();
        let hit = paths::split_search_path(&search_path)
            .flat_map(|dir| candidates(&Path::new(dir).join(name)))
            .find(|candidate| is_executable(candidate));
        hit
    };

    match &found {
        Some(path) => trace!("Resolved {} to {}", name, path.display()),
        None => debug!("No executable named {} found", name),
    }
    found
}

/// Check whether `name` resolves to an executable. Never spawns a process.
pub fn check_executable(name: &str) -> bool {
    find_executable(name).is_some()
}

fn has_separator(name: &str) -> bool {
    name.contains('/') || name.contains(paths::path_separator())
}

#[cfg_attr(not(windows), allow(dead_code))]
fn has_executable_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = format!(".{}", ext.to_string_lossy().to_lowercase());
            PathConfig::WINDOWS_EXECUTABLE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn candidates(base: &Path) -> impl Iterator<Item = PathBuf> {
    #[cfg_attr(not(windows), allow(unused_mut))]
    let mut list = vec![base.to_path_buf()];

    #[cfg(windows)]
    if !has_executable_extension(base) {
        for ext in PathConfig::WINDOWS_EXECUTABLE_EXTENSIONS {
            let mut with_ext = base.as_os_str().to_os_string();
            with_ext.push(ext);
            list.push(PathBuf::from(with_ext));
        }
    }

    list.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    /// Give `path` the permissions an installed tool would have.
    fn make_executable(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        #[cfg(not(unix))]
        let _ = path;
    }

    #[cfg(unix)]
    #[test]
    fn test_plain_file_is_not_executable() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("notes");
        File::create(&file_path).unwrap();
        assert!(!is_executable(&file_path));

        make_executable(&file_path);
        assert!(is_executable(&file_path));
    }

    #[cfg(unix)]
    #[test]
    fn test_bare_name_resolves_to_search_path_entry() {
        let found = find_executable("sh").unwrap();
        assert!(found.is_absolute());
        assert!(found.ends_with("sh"));

        let search_path = env::getenv(PathConfig::SEARCH_PATH_VAR).unwrap();
        let dir = found.parent().unwrap();
        assert!(paths::split_search_path(&search_path).any(|entry| Path::new(entry) == dir));
    }

    #[test]
    fn test_is_executable_windows() {
        #[cfg(windows)]
        {
            let temp_dir = TempDir::new().unwrap();
            let exe = temp_dir.path().join("tool.exe");
            let txt = temp_dir.path().join("notes.txt");
            File::create(&exe).unwrap();
            File::create(&txt).unwrap();

            assert!(is_executable(&exe));
            assert!(!is_executable(&txt));
        }
    }

    #[test]
    fn test_directories_are_not_executable() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!is_executable(temp_dir.path()));
    }

    #[test]
    fn test_find_executable_direct_path() {
        let temp_dir = TempDir::new().unwrap();
        let name = format!("portkit-tool{}", paths::command_extension());
        let tool = temp_dir.path().join(&name);
        File::create(&tool).unwrap();
        make_executable(&tool);

        let found = find_executable(tool.to_str().unwrap());
        assert_eq!(found.as_deref(), Some(tool.as_path()));
    }

    #[test]
    fn test_find_executable_missing() {
        assert!(find_executable("").is_none());
        assert!(find_executable("   ").is_none());
        assert!(!check_executable("portkit-nonexistent-command-xyz"));
    }

    #[test]
    fn test_find_executable_on_search_path() {
        #[cfg(unix)]
        assert!(check_executable("sh"));

        #[cfg(windows)]
        assert!(check_executable("cmd"));
    }

    #[test]
    fn test_executable_extension_matching() {
        assert!(has_executable_extension(Path::new("gswin32c.EXE")));
        assert!(has_executable_extension(Path::new("build.bat")));
        assert!(!has_executable_extension(Path::new("readme.txt")));
        assert!(!has_executable_extension(Path::new("gs")));
    }
}
