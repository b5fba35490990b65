//! Dashboard controller.
//!
//! Owns the manager map built once at startup and turns lifecycle results
//! into operator-facing outcomes. Every mutating call is tagged with an
//! operation id and written to the audit trail.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{current_operator, AuditEntry, AuditLogger, AuditSubject};
use crate::error::InstallerResult;
use crate::services::{
    FamilyStatus, LifecycleContext, LifecycleManager, LogTarget, StatusOracle, VariantKind,
    VariantRegistry,
};

/// Result of one dashboard action, ready to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
}

impl OperationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Mediates between the terminal front end and the lifecycle managers.
pub struct Controller {
    registry: VariantRegistry,
    managers: HashMap<String, LifecycleManager>,
    oracle: StatusOracle,
    audit: Option<AuditLogger>,
    operator: String,
}

impl Controller {
    pub fn new(
        registry: VariantRegistry,
        ctx: Arc<LifecycleContext>,
        audit: Option<AuditLogger>,
    ) -> Self {
        let managers = LifecycleManager::for_registry(&registry, &ctx)
            .into_iter()
            .map(|m| (m.variant().id.clone(), m))
            .collect();

        Self {
            registry,
            managers,
            oracle: ctx.oracle().clone(),
            audit,
            operator: current_operator(),
        }
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    pub fn manager(&self, variant_id: &str) -> Option<&LifecycleManager> {
        self.managers.get(variant_id)
    }

    /// Live status of one family.
    pub fn family_status(&self, family: &str) -> Option<FamilyStatus> {
        self.registry
            .variants_of(family)
            .map(|variants| self.oracle.query_family_status(variants))
    }

    /// Live status of every family, in registry order.
    pub fn refresh(&self) -> Vec<(String, FamilyStatus)> {
        self.registry
            .families()
            .iter()
            .map(|f| (f.key.clone(), self.oracle.query_family_status(f.variants())))
            .collect()
    }

    fn manager_for(&self, family: &str, kind: VariantKind) -> Option<&LifecycleManager> {
        let variant = self.registry.family(family)?.variant(kind);
        self.managers.get(&variant.id)
    }

    fn active_manager(&self, family: &str) -> Result<&LifecycleManager, OperationOutcome> {
        let status = self
            .family_status(family)
            .ok_or_else(|| OperationOutcome::failed(format!("Unknown service family '{}'", family)))?;
        let kind = status
            .active_variant_kind()
            .ok_or_else(|| OperationOutcome::failed("No installed variant"))?;
        self.manager_for(family, kind)
            .ok_or_else(|| OperationOutcome::failed(format!("No manager for {} {}", family, kind)))
    }

    /// Install a variant and start it.
    ///
    /// A failed start after a good install is still a success; the
    /// message tells the operator to start it by hand.
    pub fn install(&self, family: &str, kind: VariantKind) -> OperationOutcome {
        let Some(manager) = self.manager_for(family, kind) else {
            return OperationOutcome::failed(format!("Unknown service family '{}'", family));
        };

        self.run("install", manager, |m| {
            m.install()?;
            Ok(match m.start() {
                Ok(()) => None,
                Err(e) => {
                    warn!(variant = %m.variant().id, error = %e, "Auto-start after install failed");
                    Some(format!("manual start required: {}", e))
                }
            })
        })
        .into_outcome("Install", |detail| match detail {
            None => format!("[+] {} installed and started", kind),
            Some(note) => format!("[+] {} installed ({})", kind, note),
        })
    }

    pub fn uninstall(&self, family: &str) -> OperationOutcome {
        match self.active_manager(family) {
            Ok(manager) => {
                let kind = manager.variant().kind;
                self.run("uninstall", manager, |m| m.uninstall().map(|()| None))
                    .into_outcome("Uninstall", |_| format!("[-] {} uninstalled", kind))
            }
            Err(outcome) => outcome,
        }
    }

    pub fn start(&self, family: &str) -> OperationOutcome {
        self.simple(family, "start", "Start service", LifecycleManager::start)
    }

    pub fn stop(&self, family: &str) -> OperationOutcome {
        self.simple(family, "stop", "Stop service", LifecycleManager::stop)
    }

    pub fn restart(&self, family: &str) -> OperationOutcome {
        self.simple(family, "restart", "Restart service", LifecycleManager::restart)
    }

    /// Open the active variant's log file or directory.
    pub fn open_logs(&self, family: &str, target: LogTarget) -> OperationOutcome {
        let manager = match self.active_manager(family) {
            Ok(manager) => manager,
            Err(outcome) => return outcome,
        };
        let what = match target {
            LogTarget::File => "log file",
            LogTarget::Directory => "log folder",
        };
        match manager.open_logs(target) {
            Ok(()) => OperationOutcome::ok(format!("Opening {}...", what)),
            Err(e) => OperationOutcome::failed(format!("Could not open {}: {}", what, e)),
        }
    }

    fn simple(
        &self,
        family: &str,
        operation: &'static str,
        title: &str,
        op: fn(&LifecycleManager) -> InstallerResult<()>,
    ) -> OperationOutcome {
        match self.active_manager(family) {
            Ok(manager) => self
                .run(operation, manager, |m| op(m).map(|()| None))
                .into_outcome(title, |_| format!("[OK] {} completed", title)),
            Err(outcome) => outcome,
        }
    }

    /// Run one lifecycle operation with logging and auditing.
    fn run<F>(&self, operation: &'static str, manager: &LifecycleManager, op: F) -> Completed
    where
        F: FnOnce(&LifecycleManager) -> InstallerResult<Option<String>>,
    {
        let operation_id = Uuid::new_v4();
        let variant = manager.variant();
        info!(
            operation_id = %operation_id,
            operation,
            variant = %variant.id,
            "Operation started"
        );

        let started = Instant::now();
        let result = op(manager);
        let duration_ms = started.elapsed().as_millis() as u64;

        let subject = AuditSubject {
            operation: operation.to_string(),
            variant_id: variant.id.clone(),
            registry_name: variant.registry_name.clone(),
            operator: self.operator.clone(),
        };
        let timestamp = Utc::now().to_rfc3339();

        let (entry, completed) = match result {
            Ok(detail) => {
                info!(operation_id = %operation_id, operation, duration_ms, "Operation succeeded");
                (
                    AuditEntry::success(timestamp, operation_id, subject, detail.clone(), duration_ms),
                    Completed::Done(detail),
                )
            }
            Err(e) if e.is_soft() => {
                info!(operation_id = %operation_id, operation, outcome = %e, "Operation will complete later");
                let message = e.to_string();
                (
                    AuditEntry::success(timestamp, operation_id, subject, Some(message.clone()), duration_ms),
                    Completed::Deferred(message),
                )
            }
            Err(e) => {
                warn!(operation_id = %operation_id, operation, error = %e, code = e.code(), "Operation failed");
                (
                    AuditEntry::failure(
                        timestamp,
                        operation_id,
                        subject,
                        e.code().to_string(),
                        e.to_string(),
                        duration_ms,
                    ),
                    Completed::Failed(e.to_string()),
                )
            }
        };

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log(&entry) {
                warn!(operation_id = %operation_id, error = %e, "Failed to write audit log entry");
            }
        }

        completed
    }
}

/// How an operation ended, before it becomes an outcome.
enum Completed {
    Done(Option<String>),
    /// Accepted by the OS, finishing asynchronously.
    Deferred(String),
    Failed(String),
}

impl Completed {
    fn into_outcome<F>(self, title: &str, on_success: F) -> OperationOutcome
    where
        F: FnOnce(Option<String>) -> String,
    {
        match self {
            Completed::Done(detail) => OperationOutcome::ok(on_success(detail)),
            Completed::Deferred(message) => OperationOutcome::ok(format!("[~] {}", message)),
            Completed::Failed(message) => {
                OperationOutcome::failed(format!("[X] {} failed: {}", title, message))
            }
        }
    }
}
