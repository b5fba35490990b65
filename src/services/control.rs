//! OS service-control facility interface.
//!
//! Implementations run the raw operations and hand back the tool's
//! captured output. Only a failure to run the tool at all is an `Err`;
//! a non-zero outcome is data, classified by the `classify` module.

use std::path::Path;
use std::time::Duration;

use crate::config::RecoveryConfig;
use crate::error::InstallerResult;
use crate::executor::ToolOutput;

/// Everything needed to register a service. Services are always
/// registered to start at boot.
#[derive(Debug, Clone)]
pub struct ServiceSpec<'a> {
    pub name: &'a str,
    pub binary_path: &'a Path,
    pub display_name: &'a str,
}

/// Restart-on-crash policy handed to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Failure-free period after which the failure count resets.
    pub reset_after: Duration,
    pub restart_delay: Duration,
    pub restart_attempts: u32,
}

impl RecoveryPolicy {
    /// Failure actions in `restart/<ms>/restart/<ms>/...` form.
    pub fn actions(&self) -> String {
        let delay_ms = self.restart_delay.as_millis();
        (0..self.restart_attempts)
            .map(|_| format!("restart/{}", delay_ms))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl From<&RecoveryConfig> for RecoveryPolicy {
    fn from(config: &RecoveryConfig) -> Self {
        Self {
            reset_after: Duration::from_secs(config.reset_seconds),
            restart_delay: Duration::from_millis(config.restart_delay_ms),
            restart_attempts: config.restart_attempts,
        }
    }
}

/// Raw operations of the OS service-control facility.
///
/// Implementations must be safe to call from several threads at once;
/// the OS serializes operations on any one service name.
pub trait ServiceControl: Send + Sync {
    /// Query the current state of `name`.
    fn query(&self, name: &str) -> InstallerResult<ToolOutput>;

    /// Register a new service.
    fn create(&self, spec: &ServiceSpec<'_>) -> InstallerResult<ToolOutput>;

    /// Set the restart-on-crash policy of `name`.
    fn configure_recovery(&self, name: &str, policy: &RecoveryPolicy) -> InstallerResult<ToolOutput>;

    fn start(&self, name: &str) -> InstallerResult<ToolOutput>;

    fn stop(&self, name: &str) -> InstallerResult<ToolOutput>;

    /// Remove the registration of `name`.
    fn delete(&self, name: &str) -> InstallerResult<ToolOutput>;

    /// Process id currently hosting `name`, if it has one.
    fn process_id(&self, name: &str) -> InstallerResult<Option<u32>>;

    /// Forcibly terminate a process (and its children).
    fn kill_process(&self, pid: u32) -> InstallerResult<ToolOutput>;
}

/// Wrap a binary path in double quotes.
///
/// Without them the service manager reads `C:\Program Files\X\x.exe` as
/// `C:\Program` followed by arguments.
pub fn quote_binary_path(path: &Path) -> String {
    format!("\"{}\"", path.display())
}
