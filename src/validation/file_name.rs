//! Executable file name validation.
//!
//! The executable name is joined onto the install directory, so it must
//! be a single path component.

use crate::error::{InstallerError, ValidationErrorKind};

use super::display_name::find_forbidden;

/// Validate an executable file name.
pub fn validate_executable_name(name: &str) -> Result<(), InstallerError> {
    if name.is_empty() {
        return Err(InstallerError::Validation {
            kind: ValidationErrorKind::EmptyField {
                field: "executable_name",
            },
        });
    }

    let reason = if name.contains("..") {
        Some("contains a '..' sequence".to_string())
    } else if name.contains('/') || name.contains('\\') {
        Some("contains a path separator".to_string())
    } else if name.contains(':') {
        Some("contains a drive or stream separator".to_string())
    } else {
        find_forbidden(name).map(|bad| format!("character {:?} is not allowed", bad))
    };

    match reason {
        Some(reason) => Err(InstallerError::Validation {
            kind: ValidationErrorKind::InvalidField {
                field: "executable_name",
                value: name.to_string(),
                reason,
            },
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_file_names() {
        assert!(validate_executable_name("R2k_TicketServicio_Remote.exe").is_ok());
        assert!(validate_executable_name("scale-local").is_ok());
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(validate_executable_name("..").is_err());
        assert!(validate_executable_name("..\\..\\Windows\\evil.exe").is_err());
        assert!(validate_executable_name("svc..exe").is_err());
        assert!(validate_executable_name("bin/svc").is_err());
        assert!(validate_executable_name("C:svc.exe").is_err());
    }

    #[test]
    fn test_punctuation_rejected() {
        assert!(validate_executable_name("svc&.exe").is_err());
        assert!(validate_executable_name("svc`.exe").is_err());
    }

    #[test]
    fn test_error_names_field() {
        let err = validate_executable_name("a/b").unwrap_err();
        assert!(err.to_string().contains("executable_name"));
    }
}
