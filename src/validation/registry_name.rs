//! Service registry name validation.
//!
//! The registry name is handed to the service-control tool as a bare
//! argument, so only `[A-Za-z0-9_-]+` is accepted.

use crate::error::{InstallerError, ValidationErrorKind};

/// Maximum length of a service key name accepted by the service control manager.
const MAX_REGISTRY_NAME_LENGTH: usize = 256;

/// Validate a service registry name.
///
/// # Example
///
/// ```
/// use r2k_installer::validation::validate_registry_name;
///
/// assert!(validate_registry_name("R2k_BasculaServicio_Local").is_ok());
/// assert!(validate_registry_name("svc; del C:\\").is_err());
/// ```
pub fn validate_registry_name(name: &str) -> Result<(), InstallerError> {
    if name.is_empty() {
        return Err(InstallerError::Validation {
            kind: ValidationErrorKind::EmptyField {
                field: "registry_name",
            },
        });
    }

    if name.len() > MAX_REGISTRY_NAME_LENGTH {
        return Err(InstallerError::Validation {
            kind: ValidationErrorKind::InvalidField {
                field: "registry_name",
                value: name.to_string(),
                reason: format!(
                    "exceeds maximum length of {} characters",
                    MAX_REGISTRY_NAME_LENGTH
                ),
            },
        });
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(InstallerError::Validation {
            kind: ValidationErrorKind::InvalidField {
                field: "registry_name",
                value: name.to_string(),
                reason: format!("character {:?} is not allowed", bad),
            },
        });
    }

    Ok(())
}
