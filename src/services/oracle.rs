//! Live status queries.

use std::sync::Arc;

use tracing::debug;

use super::classify::classify_query;
use super::control::ServiceControl;
use super::status::{FamilyStatus, Status};
use super::variant::{Variant, VariantKind};

/// Derives variant and family status from the service-control facility.
///
/// Holds no state of its own; every call is a fresh query, so clones can
/// be used from any thread.
#[derive(Clone)]
pub struct StatusOracle {
    control: Arc<dyn ServiceControl>,
}

impl StatusOracle {
    pub fn new(control: Arc<dyn ServiceControl>) -> Self {
        Self { control }
    }

    /// Current status of one variant. Any failure to query counts as
    /// `NotInstalled`.
    pub fn query_status(&self, variant: &Variant) -> Status {
        match self.control.query(&variant.registry_name) {
            Ok(output) => classify_query(&output),
            Err(e) => {
                debug!(
                    service = %variant.registry_name,
                    error = %e,
                    "Status query could not run, reporting not installed"
                );
                Status::NotInstalled
            }
        }
    }

    /// Status of both variants of a family, each placed in its own slot.
    pub fn query_family_status(&self, variants: &[Arc<Variant>; 2]) -> FamilyStatus {
        let mut status = FamilyStatus::default();
        for variant in variants {
            let observed = self.query_status(variant);
            match variant.kind {
                VariantKind::Local => status.local = observed,
                VariantKind::Remote => status.remote = observed,
            }
        }

        if status.is_conflicted() {
            debug!(
                family = %variants[0].family,
                local = ?status.local,
                remote = ?status.remote,
                "Both variants are registered"
            );
        }

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::error::{CommandErrorKind, InstallerError, InstallerResult};
    use crate::executor::ToolOutput;
    use crate::services::control::{RecoveryPolicy, ServiceSpec};

    /// Answers queries by service name; unknown names fail to spawn.
    struct ByName(HashMap<&'static str, ToolOutput>);

    impl ServiceControl for ByName {
        fn query(&self, name: &str) -> InstallerResult<ToolOutput> {
            self.0.get(name).cloned().ok_or_else(|| InstallerError::Command {
                kind: CommandErrorKind::ExecutionFailed {
                    message: "not found".to_string(),
                },
            })
        }
        fn create(&self, _spec: &ServiceSpec<'_>) -> InstallerResult<ToolOutput> {
            unreachable!()
        }
        fn configure_recovery(&self, _name: &str, _policy: &RecoveryPolicy) -> InstallerResult<ToolOutput> {
            unreachable!()
        }
        fn start(&self, _name: &str) -> InstallerResult<ToolOutput> {
            unreachable!()
        }
        fn stop(&self, _name: &str) -> InstallerResult<ToolOutput> {
            unreachable!()
        }
        fn delete(&self, _name: &str) -> InstallerResult<ToolOutput> {
            unreachable!()
        }
        fn process_id(&self, _name: &str) -> InstallerResult<Option<u32>> {
            unreachable!()
        }
        fn kill_process(&self, _pid: u32) -> InstallerResult<ToolOutput> {
            unreachable!()
        }
    }

    fn variant(kind: VariantKind, registry_name: &str) -> Arc<Variant> {
        Arc::new(Variant {
            id: format!("scale-{}", kind.slug()),
            family: "scale".to_string(),
            kind,
            registry_name: registry_name.to_string(),
            display_name: format!("Scale ({})", kind),
            executable_name: format!("{}.exe", registry_name),
            payload: Arc::from(vec![1u8]),
        })
    }

    fn oracle(entries: &[(&'static str, ToolOutput)]) -> StatusOracle {
        StatusOracle::new(Arc::new(ByName(entries.iter().cloned().collect())))
    }

    #[test]
    fn test_spawn_failure_reads_as_not_installed() {
        let oracle = oracle(&[]);
        assert_eq!(
            oracle.query_status(&variant(VariantKind::Local, "Scale_Local")),
            Status::NotInstalled
        );
    }

    #[test]
    fn test_family_status_fills_slots_by_kind() {
        let oracle = oracle(&[
            ("Scale_Local", ToolOutput::failed(1060, "FAILED 1060:")),
            ("Scale_Remote", ToolOutput::ok("STATE : 4 RUNNING")),
        ]);
        // Remote listed first to show placement follows the kind, not the index.
        let variants = [
            variant(VariantKind::Remote, "Scale_Remote"),
            variant(VariantKind::Local, "Scale_Local"),
        ];
        let status = oracle.query_family_status(&variants);
        assert_eq!(status, FamilyStatus::new(Status::NotInstalled, Status::Running));
        assert_eq!(status.active_variant_kind(), Some(VariantKind::Remote));
    }

    #[test]
    fn test_conflicted_family_does_not_panic() {
        let oracle = oracle(&[
            ("Scale_Local", ToolOutput::ok("STATE : 1 STOPPED")),
            ("Scale_Remote", ToolOutput::ok("STATE : 4 RUNNING")),
        ]);
        let variants = [
            variant(VariantKind::Local, "Scale_Local"),
            variant(VariantKind::Remote, "Scale_Remote"),
        ];
        let status = oracle.query_family_status(&variants);
        assert!(status.is_conflicted());
        assert_eq!(status.active_variant_kind(), Some(VariantKind::Local));
    }
}
