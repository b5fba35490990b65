//! Lifecycle manager: install, uninstall, start, stop and restart of one
//! variant.
//!
//! Every operation is a blocking sequence of service-control calls. The
//! caller guarantees that at most one operation per family is in flight;
//! nothing here takes a lock.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{InstallerError, InstallerResult, LifecycleErrorKind};
use crate::validation::validate_service_identity;

use super::classify::{classify_create, classify_delete, classify_start, classify_stop, diagnostic};
use super::control::{RecoveryPolicy, ServiceControl, ServiceSpec};
use super::layout::InstallLayout;
use super::logs::{self, LogTarget};
use super::oracle::StatusOracle;
use super::registry::VariantRegistry;
use super::status::Status;
use super::variant::Variant;
use super::wait::Poller;

/// Wait bounds and the crash-recovery policy applied at install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Graceful stop window during uninstall before escalating.
    pub stop_wait: Duration,
    /// Window after a force kill.
    pub kill_wait: Duration,
    /// Stop window during restart.
    pub restart_wait: Duration,
    pub recovery: RecoveryPolicy,
}

impl From<&Settings> for LifecyclePolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            stop_wait: settings.timeouts.stop_wait(),
            kill_wait: settings.timeouts.kill_wait(),
            restart_wait: settings.timeouts.restart_wait(),
            recovery: RecoveryPolicy::from(&settings.recovery),
        }
    }
}

/// Collaborators shared by every manager.
pub struct LifecycleContext {
    control: Arc<dyn ServiceControl>,
    oracle: StatusOracle,
    poller: Poller,
    layout: InstallLayout,
    policy: LifecyclePolicy,
}

impl LifecycleContext {
    pub fn new(
        control: Arc<dyn ServiceControl>,
        layout: InstallLayout,
        policy: LifecyclePolicy,
        poll_interval: Duration,
    ) -> Self {
        let oracle = StatusOracle::new(Arc::clone(&control));
        let poller = Poller::new(oracle.clone(), poll_interval);
        Self {
            control,
            oracle,
            poller,
            layout,
            policy,
        }
    }

    pub fn oracle(&self) -> &StatusOracle {
        &self.oracle
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }
}

/// Drives one variant through its lifecycle.
#[derive(Clone)]
pub struct LifecycleManager {
    variant: Arc<Variant>,
    sibling: Option<Arc<Variant>>,
    ctx: Arc<LifecycleContext>,
}

impl LifecycleManager {
    pub fn new(variant: Arc<Variant>, ctx: Arc<LifecycleContext>) -> Self {
        Self {
            variant,
            sibling: None,
            ctx,
        }
    }

    /// Attach the other variant of the family so that install can refuse
    /// while it is present.
    pub fn with_sibling(mut self, sibling: Arc<Variant>) -> Self {
        self.sibling = Some(sibling);
        self
    }

    /// One manager per variant in the registry, each knowing its sibling.
    pub fn for_registry(
        registry: &VariantRegistry,
        ctx: &Arc<LifecycleContext>,
    ) -> Vec<LifecycleManager> {
        let mut managers = Vec::with_capacity(registry.count());
        for family in registry.families() {
            for variant in family.variants() {
                let sibling = family.variant(variant.kind.sibling());
                managers.push(
                    LifecycleManager::new(Arc::clone(variant), Arc::clone(ctx))
                        .with_sibling(Arc::clone(sibling)),
                );
            }
        }
        managers
    }

    pub fn variant(&self) -> &Arc<Variant> {
        &self.variant
    }

    pub fn install_dir(&self) -> PathBuf {
        self.ctx.layout.install_dir(&self.variant)
    }

    pub fn executable_path(&self) -> PathBuf {
        self.ctx.layout.executable_path(&self.variant)
    }

    pub fn log_file(&self) -> PathBuf {
        self.ctx.layout.log_file(&self.variant)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.ctx.layout.log_dir(&self.variant)
    }

    pub fn status(&self) -> Status {
        self.ctx.oracle.query_status(&self.variant)
    }

    fn validate(&self) -> InstallerResult<()> {
        let v = &self.variant;
        validate_service_identity(&v.registry_name, &v.display_name, &v.executable_name)
    }

    fn name(&self) -> &str {
        &self.variant.registry_name
    }

    /// First variant of the family, own variant first, that is present in
    /// the service registry.
    fn installed_in_family(&self) -> Option<&Arc<Variant>> {
        std::iter::once(&self.variant)
            .chain(self.sibling.iter())
            .find(|v| self.ctx.oracle.query_status(v).is_installed())
    }

    /// Write the payload, register the service and apply the recovery
    /// policy.
    ///
    /// # Errors
    ///
    /// * `Validation` if the variant's names are unsafe; nothing is touched.
    /// * `AlreadyInstalled` if either variant of the family is registered.
    /// * `PayloadWrite` if the executable cannot be written; no registration
    ///   is attempted.
    /// * `Conflict` or `Registration` if the service manager refuses the
    ///   service. Written files are rolled back unless the service turns out
    ///   to be registered anyway.
    pub fn install(&self) -> InstallerResult<()> {
        self.validate()?;

        if let Some(installed) = self.installed_in_family() {
            return Err(LifecycleErrorKind::AlreadyInstalled {
                variant: installed.id.clone(),
            }
            .into());
        }

        let dir = self.install_dir();
        let exe = self.executable_path();
        let created_dir = !dir.exists();

        fs::create_dir_all(&dir).map_err(|e| LifecycleErrorKind::PayloadWrite {
            path: dir.clone(),
            message: e.to_string(),
        })?;

        if let Err(e) = write_payload(&exe, &self.variant.payload) {
            rollback_files(&dir, &exe, created_dir);
            return Err(LifecycleErrorKind::PayloadWrite {
                path: exe,
                message: e.to_string(),
            }
            .into());
        }
        debug!(
            service = %self.name(),
            path = %exe.display(),
            bytes = self.variant.payload.len(),
            "Payload written"
        );

        let spec = ServiceSpec {
            name: self.name(),
            binary_path: &exe,
            display_name: &self.variant.display_name,
        };
        let registered = match self.ctx.control.create(&spec) {
            Ok(output) => classify_create(self.name(), &output),
            Err(e) => {
                let output = tool_failure(&e);
                // A create that timed out may still have gone through.
                if self.status().is_installed() {
                    warn!(
                        service = %self.name(),
                        error = %e,
                        "Registration outcome unknown but service is present, keeping files"
                    );
                    return Err(LifecycleErrorKind::Registration {
                        output: format!("{} (service is registered; uninstall before retrying)", output),
                    }
                    .into());
                }
                Err(LifecycleErrorKind::Registration { output })
            }
        };
        if let Err(kind) = registered {
            warn!(service = %self.name(), error = %kind, "Registration failed, rolling back files");
            rollback_files(&dir, &exe, created_dir);
            return Err(kind.into());
        }

        self.configure_recovery();

        info!(
            variant = %self.variant.id,
            service = %self.name(),
            path = %exe.display(),
            "Service installed"
        );
        Ok(())
    }

    fn configure_recovery(&self) {
        match self
            .ctx
            .control
            .configure_recovery(self.name(), &self.ctx.policy.recovery)
        {
            Ok(output) if output.success => {
                debug!(service = %self.name(), "Recovery policy configured");
            }
            Ok(output) => {
                warn!(
                    service = %self.name(),
                    output = %diagnostic(&output),
                    "Could not configure recovery policy"
                );
            }
            Err(e) => {
                warn!(service = %self.name(), error = %e, "Could not configure recovery policy");
            }
        }
    }

    /// Stop (forcibly if needed), deregister and remove the install
    /// directory.
    ///
    /// # Errors
    ///
    /// * `NotInstalled` if the service is not registered.
    /// * `PendingDeletion` if the service manager will finish the deletion
    ///   once the process exits. Soft; the caller reports it as deferred.
    /// * `Deregistration` for any other delete failure, including a tool
    ///   that could not run.
    /// * `Cleanup` if the registration is gone but the install directory
    ///   could not be removed.
    pub fn uninstall(&self) -> InstallerResult<()> {
        self.validate()?;

        let stop_attempted = match self.ctx.control.stop(self.name()) {
            Ok(output) => match classify_stop(self.name(), &output) {
                Ok(()) => true,
                Err(LifecycleErrorKind::NotRunning { .. })
                | Err(LifecycleErrorKind::NotInstalled { .. }) => false,
                Err(kind) => {
                    warn!(service = %self.name(), error = %kind, "Stop request failed, waiting anyway");
                    true
                }
            },
            Err(e) => {
                warn!(service = %self.name(), error = %e, "Stop request could not run, waiting anyway");
                true
            }
        };

        if stop_attempted {
            let policy = &self.ctx.policy;
            if !self
                .ctx
                .poller
                .wait_for(&self.variant, Status::Stopped, policy.stop_wait)
            {
                warn!(
                    service = %self.name(),
                    timeout_secs = policy.stop_wait.as_secs(),
                    "Service did not stop, forcing termination"
                );
                self.force_kill();
                if !self
                    .ctx
                    .poller
                    .wait_for(&self.variant, Status::Stopped, policy.kill_wait)
                {
                    warn!(service = %self.name(), "Service still not stopped after force kill");
                }
            }
        }

        let deleted = self
            .ctx
            .control
            .delete(self.name())
            .map_err(|e| LifecycleErrorKind::Deregistration {
                output: tool_failure(&e),
            })
            .and_then(|output| classify_delete(self.name(), &output));
        match deleted {
            Ok(()) => {}
            Err(kind @ LifecycleErrorKind::PendingDeletion { .. }) => {
                if let Err(cleanup) = self.remove_install_dir() {
                    warn!(service = %self.name(), error = %cleanup, "Install directory left in place");
                }
                return Err(kind.into());
            }
            Err(kind) => return Err(kind.into()),
        }

        self.remove_install_dir()?;

        info!(variant = %self.variant.id, service = %self.name(), "Service uninstalled");
        Ok(())
    }

    fn force_kill(&self) {
        match self.ctx.control.process_id(self.name()) {
            Ok(Some(pid)) => match self.ctx.control.kill_process(pid) {
                Ok(output) if output.success => {
                    info!(service = %self.name(), pid, "Service process killed");
                }
                Ok(output) => {
                    warn!(service = %self.name(), pid, output = %diagnostic(&output), "Kill failed");
                }
                Err(e) => {
                    warn!(service = %self.name(), pid, error = %e, "Kill could not run");
                }
            },
            Ok(None) => {
                debug!(service = %self.name(), "No live process to kill");
            }
            Err(e) => {
                warn!(service = %self.name(), error = %e, "Could not resolve service process id");
            }
        }
    }

    fn remove_install_dir(&self) -> Result<(), LifecycleErrorKind> {
        let dir = self.install_dir();
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LifecycleErrorKind::Cleanup {
                path: dir,
                message: e.to_string(),
            }),
        }
    }

    /// Ask the service manager to start the service.
    ///
    /// # Errors
    ///
    /// `AlreadyRunning` and `NotInstalled` for the known refusals, `Start`
    /// for anything else including a tool that could not run.
    pub fn start(&self) -> InstallerResult<()> {
        self.validate()?;
        let output = self.ctx.control.start(self.name()).map_err(|e| {
            LifecycleErrorKind::Start {
                output: tool_failure(&e),
            }
        })?;
        classify_start(self.name(), &output)?;
        info!(service = %self.name(), "Service started");
        Ok(())
    }

    /// Ask the service manager to stop the service. Does not wait.
    ///
    /// # Errors
    ///
    /// `NotRunning` and `NotInstalled` for the known refusals, `Stop` for
    /// anything else including a tool that could not run.
    pub fn stop(&self) -> InstallerResult<()> {
        self.validate()?;
        let output = self.ctx.control.stop(self.name()).map_err(|e| {
            LifecycleErrorKind::Stop {
                output: tool_failure(&e),
            }
        })?;
        classify_stop(self.name(), &output)?;
        info!(service = %self.name(), "Service stopped");
        Ok(())
    }

    /// Stop if running, wait for a confirmed stop, then start.
    ///
    /// Never starts over a stop that has not been confirmed.
    ///
    /// # Errors
    ///
    /// * `Stop` if the stop request fails for any reason but `NotRunning`.
    /// * `RestartTimeout` if the service is not stopped within the restart
    ///   window; start is not attempted.
    /// * Any error of [`LifecycleManager::start`].
    pub fn restart(&self) -> InstallerResult<()> {
        self.validate()?;

        let current = self.status();
        if matches!(current, Status::Running | Status::StartPending) {
            let output = self.ctx.control.stop(self.name()).map_err(|e| {
                LifecycleErrorKind::Stop {
                    output: tool_failure(&e),
                }
            })?;
            match classify_stop(self.name(), &output) {
                Ok(()) | Err(LifecycleErrorKind::NotRunning { .. }) => {}
                Err(kind) => return Err(kind.into()),
            }
        } else {
            debug!(service = %self.name(), status = ?current, "Skipping stop before restart");
        }

        let timeout = self.ctx.policy.restart_wait;
        if !self.ctx.poller.wait_for(&self.variant, Status::Stopped, timeout) {
            return Err(LifecycleErrorKind::RestartTimeout {
                service: self.name().to_string(),
                timeout_secs: timeout.as_secs(),
            }
            .into());
        }

        self.start()
    }

    pub fn open_logs(&self, target: LogTarget) -> InstallerResult<()> {
        let path = match target {
            LogTarget::File => self.log_file(),
            LogTarget::Directory => self.log_dir(),
        };
        logs::open_in_viewer(&path, target)
    }
}

/// Diagnostic for a service-control tool that could not run or timed out.
fn tool_failure(e: &InstallerError) -> String {
    format!("service control tool failed: {}", e)
}

fn write_payload(path: &Path, payload: &[u8]) -> io::Result<()> {
    fs::write(path, payload)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

/// Undo a partial install. A directory that existed beforehand keeps
/// everything except the executable.
fn rollback_files(dir: &Path, exe: &Path, created_dir: bool) {
    let result = if created_dir {
        fs::remove_dir_all(dir)
    } else {
        fs::remove_file(exe)
    };
    match result {
        Ok(()) => debug!(path = %dir.display(), "Rolled back install files"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %dir.display(), error = %e, "Rollback left files behind"),
    }
}
