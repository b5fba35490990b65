//! Service status types.

use std::fmt;

use serde::Serialize;

use super::variant::VariantKind;

/// Observed state of one service variant.
///
/// Never persisted; always derived from a live query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The query failed: the service is not registered.
    NotInstalled,
    Stopped,
    Running,
    StopPending,
    StartPending,
    /// Registered, in a state this tool does not act on (paused, ...).
    Unknown,
}

impl Status {
    pub fn is_installed(&self) -> bool {
        *self != Status::NotInstalled
    }

    /// Transitional states that resolve without further action.
    pub fn is_pending(&self) -> bool {
        matches!(self, Status::StopPending | Status::StartPending)
    }

    /// Short label with a state marker, for the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Status::StopPending => "[~] STOPPING...",
            Status::StartPending => "[~] STARTING...",
            Status::Running => "[+] RUNNING",
            Status::Stopped => "[.] STOPPED",
            Status::NotInstalled => "[-] NOT INSTALLED",
            Status::Unknown => "[?] UNKNOWN STATE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of both variants of a family.
///
/// At most one slot is expected to differ from `NotInstalled`. If both
/// do, the Local variant is reported as the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FamilyStatus {
    pub local: Status,
    pub remote: Status,
}

impl Default for FamilyStatus {
    fn default() -> Self {
        Self {
            local: Status::NotInstalled,
            remote: Status::NotInstalled,
        }
    }
}

impl FamilyStatus {
    pub fn new(local: Status, remote: Status) -> Self {
        Self { local, remote }
    }

    /// Status of the given slot.
    pub fn get(&self, kind: VariantKind) -> Status {
        match kind {
            VariantKind::Local => self.local,
            VariantKind::Remote => self.remote,
        }
    }

    /// The installed variant, Local winning if both are installed.
    pub fn active_variant_kind(&self) -> Option<VariantKind> {
        if self.local.is_installed() {
            Some(VariantKind::Local)
        } else if self.remote.is_installed() {
            Some(VariantKind::Remote)
        } else {
            None
        }
    }

    /// Status of the active variant, `NotInstalled` when none is.
    pub fn active_status(&self) -> Status {
        self.active_variant_kind()
            .map(|kind| self.get(kind))
            .unwrap_or(Status::NotInstalled)
    }

    /// Both variants registered at once. Not produced by this tool.
    pub fn is_conflicted(&self) -> bool {
        self.local.is_installed() && self.remote.is_installed()
    }
}
