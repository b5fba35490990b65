//! Audit entry types.
//!
//! Defines the structure of audit log entries.

use serde::Serialize;
use uuid::Uuid;

/// What an operation acted on and who asked for it.
#[derive(Debug, Clone, Serialize)]
pub struct AuditSubject {
    /// Lifecycle operation name (`install`, `uninstall`, ...).
    pub operation: String,
    /// Variant id, e.g. `scale-local`.
    pub variant_id: String,
    /// Name the service is registered under.
    pub registry_name: String,
    /// Login name of the operator running the installer.
    pub operator: String,
}

/// A single audit log entry.
///
/// Records one lifecycle operation: its subject, result and timing.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// RFC 3339 timestamp when the operation finished.
    pub timestamp: String,
    /// Unique identifier for the operation, shared with the tracing output.
    pub operation_id: Uuid,
    #[serde(flatten)]
    pub subject: AuditSubject,
    /// Result of the operation.
    pub result: AuditResult,
    /// Execution duration in milliseconds.
    pub duration_ms: u64,
}

impl AuditEntry {
    /// Create a new audit entry for a successful operation.
    pub fn success(
        timestamp: String,
        operation_id: Uuid,
        subject: AuditSubject,
        detail: Option<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            timestamp,
            operation_id,
            subject,
            result: AuditResult::Success { detail },
            duration_ms,
        }
    }

    /// Create a new audit entry for a failed operation.
    pub fn failure(
        timestamp: String,
        operation_id: Uuid,
        subject: AuditSubject,
        error_code: String,
        error_message: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            timestamp,
            operation_id,
            subject,
            result: AuditResult::Failure {
                error_code,
                error_message,
            },
            duration_ms,
        }
    }
}

/// Result of an operation for audit purposes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum AuditResult {
    #[serde(rename = "success")]
    Success {
        /// Extra context, e.g. a failed auto-start after install.
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    #[serde(rename = "failure")]
    Failure {
        /// Stable error code.
        error_code: String,
        /// Error message.
        error_message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> AuditSubject {
        AuditSubject {
            operation: "install".to_string(),
            variant_id: "scale-local".to_string(),
            registry_name: "R2k_BasculaServicio_Local".to_string(),
            operator: "admin".to_string(),
        }
    }

    #[test]
    fn test_audit_entry_success_serialization() {
        let entry = AuditEntry::success(
            "2024-01-15T10:30:45.123Z".to_string(),
            Uuid::nil(),
            subject(),
            None,
            15,
        );

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"status\":\"success\""));
        assert!(json.contains("\"operation\":\"install\""));
        assert!(json.contains("\"variant_id\":\"scale-local\""));
        assert!(json.contains("\"duration_ms\":15"));
        assert!(!json.contains("\"detail\""));
    }

    #[test]
    fn test_audit_entry_failure_serialization() {
        let entry = AuditEntry::failure(
            "2024-01-15T10:30:45.123Z".to_string(),
            Uuid::nil(),
            subject(),
            "ALREADY_INSTALLED".to_string(),
            "variant 'scale-remote' is already installed in this family".to_string(),
            5,
        );

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"status\":\"failure\""));
        assert!(json.contains("\"error_code\":\"ALREADY_INSTALLED\""));
        assert!(json.contains("\"registry_name\":\"R2k_BasculaServicio_Local\""));
    }
}
