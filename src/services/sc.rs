//! `sc.exe` backend for the service-control interface.

use std::time::Duration;

use tracing::debug;

use crate::error::InstallerResult;
use crate::executor::{run_command, SubprocessBuilder, ToolOutput};

use super::classify::parse_pid;
use super::control::{quote_binary_path, RecoveryPolicy, ServiceControl, ServiceSpec};

const SC_PROGRAM: &str = "sc.exe";
const TASKKILL_PROGRAM: &str = "taskkill.exe";

/// Drives the Windows service control manager through `sc.exe`.
///
/// Options are passed the way `sc` expects them: `name=` and its value
/// as two separate arguments.
#[derive(Debug, Clone)]
pub struct ScServiceControl {
    timeout: Duration,
}

impl ScServiceControl {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn sc(&self, args: &[&str]) -> InstallerResult<ToolOutput> {
        SubprocessBuilder::new(SC_PROGRAM)
            .args(args.iter().copied())
            .timeout(self.timeout)
            .run()
    }
}

impl ServiceControl for ScServiceControl {
    fn query(&self, name: &str) -> InstallerResult<ToolOutput> {
        self.sc(&["query", name])
    }

    fn create(&self, spec: &ServiceSpec<'_>) -> InstallerResult<ToolOutput> {
        let bin_path = quote_binary_path(spec.binary_path);
        self.sc(&[
            "create",
            spec.name,
            "binPath=",
            &bin_path,
            "start=",
            "auto",
            "DisplayName=",
            spec.display_name,
        ])
    }

    fn configure_recovery(&self, name: &str, policy: &RecoveryPolicy) -> InstallerResult<ToolOutput> {
        let reset = policy.reset_after.as_secs().to_string();
        let actions = policy.actions();
        self.sc(&["failure", name, "reset=", &reset, "actions=", &actions])
    }

    fn start(&self, name: &str) -> InstallerResult<ToolOutput> {
        self.sc(&["start", name])
    }

    fn stop(&self, name: &str) -> InstallerResult<ToolOutput> {
        self.sc(&["stop", name])
    }

    fn delete(&self, name: &str) -> InstallerResult<ToolOutput> {
        self.sc(&["delete", name])
    }

    fn process_id(&self, name: &str) -> InstallerResult<Option<u32>> {
        let output = self.sc(&["queryex", name])?;
        let pid = parse_pid(&output);
        debug!(service = %name, pid = ?pid, "Resolved service process id");
        Ok(pid)
    }

    fn kill_process(&self, pid: u32) -> InstallerResult<ToolOutput> {
        let pid = pid.to_string();
        run_command(TASKKILL_PROGRAM, &["/PID", &pid, "/F", "/T"], self.timeout)
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use crate::error::InstallerError;

    #[test]
    fn test_missing_tool_is_an_error_not_an_outcome() {
        // sc.exe does not exist here; spawning must fail rather than
        // produce a classified result.
        let control = ScServiceControl::new(Duration::from_secs(1));
        assert!(matches!(
            control.query("R2k_BasculaServicio_Local"),
            Err(InstallerError::Command { .. })
        ));
    }
}
