//! Error types for the R2k installer.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the installer.
#[derive(Error, Debug)]
pub enum InstallerError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The variant registry could not be built.
    #[error("Registry error: {message}")]
    Registry { message: String },

    /// Validation errors.
    #[error("Validation error: {kind}")]
    Validation { kind: ValidationErrorKind },

    /// Classified outcome of a lifecycle operation.
    #[error("{kind}")]
    Lifecycle { kind: LifecycleErrorKind },

    /// Command execution errors.
    #[error("Command error: {kind}")]
    Command { kind: CommandErrorKind },

    /// The audit trail could not be written.
    #[error("Audit error: {message}")]
    Audit { message: String },

    /// Log file or directory could not be opened.
    #[error("Log access error: {kind}")]
    LogAccess { kind: LogAccessErrorKind },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validation error kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    #[error("field '{field}' is empty")]
    EmptyField { field: &'static str },

    #[error("field '{field}' has an invalid value '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Semantic outcomes of lifecycle operations that are not plain success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleErrorKind {
    #[error("variant '{variant}' is already installed in this family")]
    AlreadyInstalled { variant: String },

    #[error("service '{service}' already exists in the service registry: {output}")]
    Conflict { service: String, output: String },

    #[error("failed to write payload to {path}: {message}")]
    PayloadWrite { path: PathBuf, message: String },

    #[error("service registration failed: {output}")]
    Registration { output: String },

    #[error("service '{service}' is not installed")]
    NotInstalled { service: String },

    #[error("service '{service}' is marked for deletion and will be removed once its process exits")]
    PendingDeletion { service: String },

    #[error("service deregistration failed: {output}")]
    Deregistration { output: String },

    #[error("service was deregistered but {path} could not be removed: {message}")]
    Cleanup { path: PathBuf, message: String },

    #[error("service '{service}' is already running")]
    AlreadyRunning { service: String },

    #[error("service '{service}' is not running")]
    NotRunning { service: String },

    #[error("service start failed: {output}")]
    Start { output: String },

    #[error("service stop failed: {output}")]
    Stop { output: String },

    #[error("service '{service}' did not stop within {timeout_secs} seconds; start was not attempted")]
    RestartTimeout { service: String, timeout_secs: u64 },
}

/// Command error kinds.
#[derive(Error, Debug)]
pub enum CommandErrorKind {
    #[error("Command execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("Command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

/// Log access error kinds.
#[derive(Error, Debug)]
pub enum LogAccessErrorKind {
    #[error("log file does not exist: {path}")]
    FileMissing { path: PathBuf },

    #[error("log directory does not exist: {path}")]
    DirectoryMissing { path: PathBuf },

    #[error("could not launch viewer: {message}")]
    ViewerFailed { message: String },
}

impl LifecycleErrorKind {
    /// Stable identifier for audit records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyInstalled { .. } => "ALREADY_INSTALLED",
            Self::Conflict { .. } => "CONFLICT",
            Self::PayloadWrite { .. } => "PAYLOAD_WRITE_ERROR",
            Self::Registration { .. } => "REGISTRATION_ERROR",
            Self::NotInstalled { .. } => "NOT_INSTALLED",
            Self::PendingDeletion { .. } => "PENDING_DELETION",
            Self::Deregistration { .. } => "DEREGISTRATION_ERROR",
            Self::Cleanup { .. } => "CLEANUP_ERROR",
            Self::AlreadyRunning { .. } => "ALREADY_RUNNING",
            Self::NotRunning { .. } => "NOT_RUNNING",
            Self::Start { .. } => "START_ERROR",
            Self::Stop { .. } => "STOP_ERROR",
            Self::RestartTimeout { .. } => "RESTART_TIMEOUT",
        }
    }
}

impl InstallerError {
    /// Stable identifier for audit records and result screens.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Registry { .. } => "REGISTRY_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Lifecycle { kind } => kind.code(),
            Self::Command { kind } => match kind {
                CommandErrorKind::ExecutionFailed { .. } => "EXECUTION_FAILED",
                CommandErrorKind::Timeout { .. } => "COMMAND_TIMEOUT",
            },
            Self::Audit { .. } => "AUDIT_ERROR",
            Self::LogAccess { .. } => "LOG_ACCESS_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// True for outcomes that will complete on their own.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::Lifecycle {
                kind: LifecycleErrorKind::PendingDeletion { .. }
            }
        )
    }

    /// The lifecycle kind, if this is a classified lifecycle outcome.
    pub fn lifecycle_kind(&self) -> Option<&LifecycleErrorKind> {
        match self {
            Self::Lifecycle { kind } => Some(kind),
            _ => None,
        }
    }
}

impl From<LifecycleErrorKind> for InstallerError {
    fn from(kind: LifecycleErrorKind) -> Self {
        Self::Lifecycle { kind }
    }
}

impl From<ValidationErrorKind> for InstallerError {
    fn from(kind: ValidationErrorKind) -> Self {
        Self::Validation { kind }
    }
}

/// Result type alias for installer operations.
pub type InstallerResult<T> = Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_codes() {
        let err: InstallerError = LifecycleErrorKind::RestartTimeout {
            service: "svc".to_string(),
            timeout_secs: 15,
        }
        .into();
        assert_eq!(err.code(), "RESTART_TIMEOUT");
        assert!(err.to_string().contains("15 seconds"));
    }

    #[test]
    fn test_only_pending_deletion_is_soft() {
        let pending: InstallerError = LifecycleErrorKind::PendingDeletion {
            service: "svc".to_string(),
        }
        .into();
        let missing: InstallerError = LifecycleErrorKind::NotInstalled {
            service: "svc".to_string(),
        }
        .into();
        assert!(pending.is_soft());
        assert!(!missing.is_soft());
    }

    #[test]
    fn test_validation_message_names_field() {
        let err: InstallerError = ValidationErrorKind::InvalidField {
            field: "display_name",
            value: "a`b".to_string(),
            reason: "contains '`'".to_string(),
        }
        .into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("display_name"));
    }
}
