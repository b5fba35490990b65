//! Shared fixtures for the lifecycle integration tests.
//!
//! `FakeScm` is an in-memory service control manager. Pending transitions
//! resolve after a fixed number of status queries, which keeps the tests
//! deterministic while still exercising the polling paths.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use r2k_installer::config::FamilyConfig;
use r2k_installer::error::InstallerResult;
use r2k_installer::executor::ToolOutput;
use r2k_installer::services::{
    AssetStore, Family, FamilyStatus, InstallLayout, LifecycleContext, LifecycleManager,
    LifecyclePolicy, RecoveryPolicy, ServiceControl, ServiceSpec, Status, Variant, VariantRegistry,
};

pub const POLL: Duration = Duration::from_millis(10);

const STOPPED: u8 = 1;
const START_PENDING: u8 = 2;
const STOP_PENDING: u8 = 3;
const RUNNING: u8 = 4;

/// How a service reacts to a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Stopped at once.
    Immediate,
    /// `StopPending` for this many queries, then stopped.
    Pending(u32),
    /// `StopPending` until its process is killed.
    Stuck,
    /// `StopPending` forever; killing it fails as well.
    Unkillable,
}

#[derive(Debug, Clone)]
struct FakeService {
    state: u8,
    /// Queries left before `state` becomes the target.
    transition: Option<(u32, u8)>,
    pid: u32,
    binary_path: PathBuf,
    display_name: String,
    marked_for_delete: bool,
}

#[derive(Debug)]
struct ScmState {
    services: HashMap<String, FakeService>,
    /// Names the registry holds but queries do not report.
    reserved: HashSet<String>,
    calls: Vec<(String, String)>,
    stop_mode: StopMode,
    start_polls: u32,
    next_pid: u32,
}

/// In-memory stand-in for `sc.exe` and `taskkill`.
pub struct FakeScm {
    state: Mutex<ScmState>,
}

impl Default for FakeScm {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeScm {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScmState {
                services: HashMap::new(),
                reserved: HashSet::new(),
                calls: Vec::new(),
                stop_mode: StopMode::Immediate,
                start_polls: 0,
                next_pid: 4000,
            }),
        }
    }

    pub fn set_stop_mode(&self, mode: StopMode) {
        self.state.lock().unwrap().stop_mode = mode;
    }

    /// Starts go through `StartPending` for `polls` queries.
    pub fn set_start_polls(&self, polls: u32) {
        self.state.lock().unwrap().start_polls = polls;
    }

    /// Register `name` directly, bypassing the installer.
    pub fn seed(&self, name: &str, status: Status) {
        let mut state = self.state.lock().unwrap();
        let code = match status {
            Status::Stopped => STOPPED,
            Status::StartPending => START_PENDING,
            Status::StopPending => STOP_PENDING,
            Status::Running => RUNNING,
            Status::Unknown => 7,
            Status::NotInstalled => return,
        };
        state.next_pid += 4;
        let pid = state.next_pid;
        state.services.insert(
            name.to_string(),
            FakeService {
                state: code,
                transition: None,
                pid,
                binary_path: PathBuf::new(),
                display_name: name.to_string(),
                marked_for_delete: false,
            },
        );
    }

    /// Make `create` report a name collision while queries see nothing.
    pub fn reserve(&self, name: &str) {
        self.state.lock().unwrap().reserved.insert(name.to_string());
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.state.lock().unwrap().services.contains_key(name)
    }

    pub fn binary_path(&self, name: &str) -> Option<PathBuf> {
        self.state
            .lock()
            .unwrap()
            .services
            .get(name)
            .map(|s| s.binary_path.clone())
    }

    pub fn display_name(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .services
            .get(name)
            .map(|s| s.display_name.clone())
    }

    /// Every call as `(verb, target)`, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of `verb` calls, optionally for one target.
    pub fn count(&self, verb: &str, target: Option<&str>) -> usize {
        self.calls()
            .iter()
            .filter(|(v, t)| v == verb && target.map_or(true, |name| t == name))
            .count()
    }

    /// Verbs other than status reads.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(v, _)| v != "query" && v != "queryex")
            .map(|(v, t)| format!("{} {}", v, t))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn record(state: &mut ScmState, verb: &str, target: &str) {
        state.calls.push((verb.to_string(), target.to_string()));
    }
}

fn not_exist(verb: &str) -> ToolOutput {
    ToolOutput::failed(
        1060,
        format!(
            "[SC] {} FAILED 1060:\n\nThe specified service does not exist as an installed service.",
            verb
        ),
    )
}

impl ServiceControl for FakeScm {
    fn query(&self, name: &str) -> InstallerResult<ToolOutput> {
        let mut state = self.state.lock().unwrap();
        FakeScm::record(&mut state, "query", name);

        let Some(svc) = state.services.get_mut(name) else {
            return Ok(not_exist("EnumQueryServicesStatus:OpenService"));
        };
        if let Some((left, target)) = svc.transition {
            if left == 0 {
                svc.state = target;
                svc.transition = None;
            } else {
                svc.transition = Some((left - 1, target));
            }
        }

        Ok(ToolOutput::ok(format!(
            "\nSERVICE_NAME: {}\n        TYPE               : 10  WIN32_OWN_PROCESS\n        STATE              : {}\n",
            name, svc.state
        )))
    }

    fn create(&self, spec: &ServiceSpec<'_>) -> InstallerResult<ToolOutput> {
        let mut state = self.state.lock().unwrap();
        FakeScm::record(&mut state, "create", spec.name);

        if state.services.contains_key(spec.name) || state.reserved.contains(spec.name) {
            return Ok(ToolOutput::failed(
                1073,
                "[SC] CreateService FAILED 1073:\n\nThe specified service already exists.",
            ));
        }
        state.services.insert(
            spec.name.to_string(),
            FakeService {
                state: STOPPED,
                transition: None,
                pid: 0,
                binary_path: spec.binary_path.to_path_buf(),
                display_name: spec.display_name.to_string(),
                marked_for_delete: false,
            },
        );
        Ok(ToolOutput::ok("[SC] CreateService SUCCESS"))
    }

    fn configure_recovery(&self, name: &str, _policy: &RecoveryPolicy) -> InstallerResult<ToolOutput> {
        let mut state = self.state.lock().unwrap();
        FakeScm::record(&mut state, "failure", name);
        Ok(ToolOutput::ok("[SC] ChangeServiceConfig2 SUCCESS"))
    }

    fn start(&self, name: &str) -> InstallerResult<ToolOutput> {
        let mut state = self.state.lock().unwrap();
        FakeScm::record(&mut state, "start", name);

        state.next_pid += 4;
        let pid = state.next_pid;
        let polls = state.start_polls;
        let Some(svc) = state.services.get_mut(name) else {
            return Ok(not_exist("StartService: OpenService"));
        };
        if svc.state != STOPPED {
            return Ok(ToolOutput::failed(
                1056,
                "[SC] StartService FAILED 1056:\n\nAn instance of the service is already running.",
            ));
        }
        svc.pid = pid;
        if polls == 0 {
            svc.state = RUNNING;
        } else {
            svc.state = START_PENDING;
            svc.transition = Some((polls, RUNNING));
        }
        Ok(ToolOutput::ok(format!("SERVICE_NAME: {}\n        STATE              : {}", name, svc.state)))
    }

    fn stop(&self, name: &str) -> InstallerResult<ToolOutput> {
        let mut state = self.state.lock().unwrap();
        FakeScm::record(&mut state, "stop", name);

        let mode = state.stop_mode;
        let Some(svc) = state.services.get_mut(name) else {
            return Ok(not_exist("ControlService: OpenService"));
        };
        if svc.state == STOPPED {
            return Ok(ToolOutput::failed(
                1062,
                "[SC] ControlService FAILED 1062:\n\nThe service has not been started.",
            ));
        }
        match mode {
            StopMode::Immediate => {
                svc.state = STOPPED;
                svc.transition = None;
            }
            StopMode::Pending(polls) => {
                svc.state = STOP_PENDING;
                svc.transition = Some((polls, STOPPED));
            }
            StopMode::Stuck | StopMode::Unkillable => {
                svc.state = STOP_PENDING;
                svc.transition = None;
            }
        }
        Ok(ToolOutput::ok(format!("SERVICE_NAME: {}\n        STATE              : {}", name, svc.state)))
    }

    fn delete(&self, name: &str) -> InstallerResult<ToolOutput> {
        let mut state = self.state.lock().unwrap();
        FakeScm::record(&mut state, "delete", name);

        let Some(svc) = state.services.get_mut(name) else {
            return Ok(not_exist("OpenService"));
        };
        if svc.state == STOPPED {
            state.services.remove(name);
            return Ok(ToolOutput::ok("[SC] DeleteService SUCCESS"));
        }
        svc.marked_for_delete = true;
        Ok(ToolOutput::failed(
            1072,
            "[SC] DeleteService FAILED 1072:\n\nThe specified service has been marked for deletion.",
        ))
    }

    fn process_id(&self, name: &str) -> InstallerResult<Option<u32>> {
        let mut state = self.state.lock().unwrap();
        FakeScm::record(&mut state, "queryex", name);

        Ok(state
            .services
            .get(name)
            .filter(|svc| svc.state != STOPPED && svc.pid > 0)
            .map(|svc| svc.pid))
    }

    fn kill_process(&self, pid: u32) -> InstallerResult<ToolOutput> {
        let mut state = self.state.lock().unwrap();
        FakeScm::record(&mut state, "taskkill", &pid.to_string());

        if state.stop_mode == StopMode::Unkillable {
            return Ok(ToolOutput::failed(
                1,
                format!("ERROR: The process with PID {} could not be terminated.\nReason: Access is denied.", pid),
            ));
        }

        let Some(name) = state
            .services
            .iter()
            .find(|(_, svc)| svc.pid == pid && svc.state != STOPPED)
            .map(|(name, _)| name.clone())
        else {
            return Ok(ToolOutput::failed(128, format!("ERROR: The process \"{}\" not found.", pid)));
        };

        let svc = state
            .services
            .get_mut(&name)
            .expect("service was found by pid under the same lock");
        svc.state = STOPPED;
        svc.transition = None;
        if svc.marked_for_delete {
            state.services.remove(&name);
        }
        Ok(ToolOutput::ok(format!(
            "SUCCESS: The process with PID {} (child process of PID 4) has been terminated.",
            pid
        )))
    }
}

/// Payload bytes derived from the executable name.
pub struct MemoryAssets;

impl AssetStore for MemoryAssets {
    fn load(&self, executable_name: &str) -> InstallerResult<Vec<u8>> {
        Ok(format!("MZ:{}", executable_name).into_bytes())
    }
}

/// Short waits so escalation paths finish quickly.
pub fn fast_policy() -> LifecyclePolicy {
    LifecyclePolicy {
        stop_wait: Duration::from_millis(300),
        kill_wait: Duration::from_millis(300),
        restart_wait: Duration::from_millis(300),
        recovery: RecoveryPolicy {
            reset_after: Duration::from_secs(86400),
            restart_delay: Duration::from_millis(5000),
            restart_attempts: 3,
        },
    }
}

pub fn family_config(key: &str, base: &str, display: Option<&str>) -> FamilyConfig {
    FamilyConfig {
        key: key.to_string(),
        title: format!("{} Service", key),
        base_name: base.to_string(),
        display_name: display.map(str::to_string),
    }
}

/// Registry, managers and fake SCM over a temporary install root.
pub struct Harness {
    pub scm: Arc<FakeScm>,
    pub registry: VariantRegistry,
    pub ctx: Arc<LifecycleContext>,
    pub managers: HashMap<String, LifecycleManager>,
    pub tmp: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_families(&[
            family_config("scale", "R2k_BasculaServicio", None),
            family_config("ticket", "R2k_TicketServicio", None),
        ])
    }

    pub fn with_families(configs: &[FamilyConfig]) -> Self {
        let tmp = TempDir::new().expect("Failed to create temp directory");
        let scm = Arc::new(FakeScm::new());
        let families = configs
            .iter()
            .map(|c| Family::generate(c, &MemoryAssets).expect("Failed to build family"))
            .collect();
        let registry = VariantRegistry::new(families).expect("Failed to build registry");

        let control: Arc<dyn ServiceControl> = scm.clone();
        let ctx = Arc::new(LifecycleContext::new(
            control,
            InstallLayout::new(tmp.path().join("Program Files"), tmp.path().join("ProgramData")),
            fast_policy(),
            POLL,
        ));
        let managers = LifecycleManager::for_registry(&registry, &ctx)
            .into_iter()
            .map(|m| (m.variant().id.clone(), m))
            .collect();

        Self {
            scm,
            registry,
            ctx,
            managers,
            tmp,
        }
    }

    pub fn manager(&self, id: &str) -> &LifecycleManager {
        self.managers
            .get(id)
            .unwrap_or_else(|| panic!("no manager for {}", id))
    }

    /// A manager for an ad-hoc variant sharing this harness's context.
    pub fn manager_for(&self, variant: Variant) -> LifecycleManager {
        LifecycleManager::new(Arc::new(variant), Arc::clone(&self.ctx))
    }

    pub fn family_status(&self, family: &str) -> FamilyStatus {
        let variants = self.registry.variants_of(family).expect("unknown family");
        self.ctx.oracle().query_family_status(variants)
    }

    pub fn install_root(&self) -> PathBuf {
        self.ctx.layout().install_root().to_path_buf()
    }
}
