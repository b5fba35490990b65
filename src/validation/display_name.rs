//! Display name validation.

use crate::error::{InstallerError, ValidationErrorKind};

/// Characters that could break out of a quoted tool argument.
pub(crate) const FORBIDDEN_PUNCTUATION: &[char] = &['"', '\'', '`', '$', '&', '|', ';', '\n', '\r'];

/// Find the first forbidden character in `value`, if any.
pub(crate) fn find_forbidden(value: &str) -> Option<char> {
    value.chars().find(|c| FORBIDDEN_PUNCTUATION.contains(c))
}

/// Validate a human-readable display name.
///
/// Spaces, parentheses and accented letters are fine; quotes, backticks
/// and shell metacharacters are not.
pub fn validate_display_name(name: &str) -> Result<(), InstallerError> {
    if name.trim().is_empty() {
        return Err(InstallerError::Validation {
            kind: ValidationErrorKind::EmptyField {
                field: "display_name",
            },
        });
    }

    if let Some(bad) = find_forbidden(name) {
        return Err(InstallerError::Validation {
            kind: ValidationErrorKind::InvalidField {
                field: "display_name",
                value: name.to_string(),
                reason: format!("character {:?} is not allowed", bad),
            },
        });
    }

    Ok(())
}
