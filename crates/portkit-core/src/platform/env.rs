//! Process environment access.
//!
//! Thin wrappers over `std::env` that never panic: names and values are
//! validated before they reach the OS, and a missing variable is `None`.
//! Changes are process-wide and inherited by children spawned afterwards.

use crate::error::{PortkitError, Result};
use tracing::trace;

/// Read an environment variable.
///
/// Returns `None` if the variable is unset. Values that are not valid
/// Unicode are converted lossily.
pub fn getenv(name: &str) -> Option<String> {
    if validate_name(name).is_err() {
        return None;
    }
    std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
}

/// Set an environment variable for this process and its future children.
pub fn setenv(name: &str, value: &str) -> Result<()> {
    validate_name(name)?;
    if value.contains('\0') {
        return Err(PortkitError::Other(format!(
            "Value for environment variable {name} contains a NUL byte"
        )));
    }
    trace!("setenv {}", name);
    std::env::set_var(name, value);
    Ok(())
}

/// Remove an environment variable. Removing an unset variable is a no-op.
pub fn unsetenv(name: &str) -> Result<()> {
    validate_name(name)?;
    trace!("unsetenv {}", name);
    std::env::remove_var(name);
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(PortkitError::InvalidEnvName(name.to_string()));
    }
    Ok(())
}
