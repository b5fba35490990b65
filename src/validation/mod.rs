//! Input validation module.
//!
//! Service names arrive as build-time constants but are still checked
//! before they reach the service-control tool or the filesystem.

mod display_name;
mod file_name;
mod registry_name;

pub use display_name::validate_display_name;
pub use file_name::validate_executable_name;
pub use registry_name::validate_registry_name;

use crate::error::InstallerError;

/// Validate every naming field of a service variant, in registry,
/// display, executable order.
pub fn validate_service_identity(
    registry_name: &str,
    display_name: &str,
    executable_name: &str,
) -> Result<(), InstallerError> {
    validate_registry_name(registry_name)?;
    validate_display_name(display_name)?;
    validate_executable_name(executable_name)?;
    Ok(())
}
