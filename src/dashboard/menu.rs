//! Family menus and status lines.
//!
//! The menu is where mutual exclusivity becomes visible: install entries
//! only appear while neither variant is present.

use std::fmt::Write;

use crate::services::{FamilyStatus, Status, VariantKind};

/// One entry of a family menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyAction {
    Install(VariantKind),
    Start,
    Stop,
    Restart,
    Logs,
    Uninstall,
    Back,
}

impl FamilyAction {
    /// Menu label. `installed` names the variant an uninstall would remove.
    pub fn label(&self, installed: Option<VariantKind>) -> String {
        match self {
            FamilyAction::Install(VariantKind::Local) => {
                "Install LOCAL version (used on this machine)".to_string()
            }
            FamilyAction::Install(VariantKind::Remote) => {
                "Install REMOTE version (reachable over the LAN)".to_string()
            }
            FamilyAction::Start => "Start service".to_string(),
            FamilyAction::Stop => "Stop service".to_string(),
            FamilyAction::Restart => "Restart service".to_string(),
            FamilyAction::Logs => "View logs".to_string(),
            FamilyAction::Uninstall => match installed {
                Some(kind) => format!("Uninstall {}", kind),
                None => "Uninstall".to_string(),
            },
            FamilyAction::Back => "Back".to_string(),
        }
    }
}

/// Actions offered for a family in the given state.
pub fn available_actions(status: &FamilyStatus) -> Vec<FamilyAction> {
    if status.active_variant_kind().is_none() {
        return vec![
            FamilyAction::Install(VariantKind::Local),
            FamilyAction::Install(VariantKind::Remote),
            FamilyAction::Back,
        ];
    }

    let mut actions = Vec::with_capacity(5);
    match status.active_status() {
        Status::Stopped => actions.push(FamilyAction::Start),
        Status::Running => {
            actions.push(FamilyAction::Stop);
            actions.push(FamilyAction::Restart);
        }
        _ => {}
    }
    actions.extend([FamilyAction::Logs, FamilyAction::Uninstall, FamilyAction::Back]);
    actions
}

/// One-line summary, e.g. `Local - [+] RUNNING`.
pub fn format_family_status(status: &FamilyStatus) -> String {
    match status.active_variant_kind() {
        None => "Not installed".to_string(),
        Some(kind) => {
            let mut line = format!("{} - {}", kind, status.get(kind));
            if status.is_conflicted() {
                line.push_str(" (both variants registered)");
            }
            line
        }
    }
}

/// Main screen: one numbered line per family plus quit.
pub fn render_dashboard(rows: &[(String, FamilyStatus)]) -> String {
    let mut out = String::from("\n== R2k Service Installer ==\n\n");
    for (i, (title, status)) in rows.iter().enumerate() {
        let _ = writeln!(out, "  [{}] {:<16} {}", i + 1, title, format_family_status(status));
    }
    out.push_str("  [q] Quit\n");
    out
}

/// Family screen: current state then the numbered actions.
pub fn render_family_menu(title: &str, status: &FamilyStatus, actions: &[FamilyAction]) -> String {
    let installed = status.active_variant_kind();
    let mut out = format!("\n== {} ==\n", title);
    let _ = writeln!(out, "  Local:  {}", status.local);
    let _ = writeln!(out, "  Remote: {}", status.remote);
    if status.active_status().is_pending() {
        out.push_str("  Waiting for the service to settle...\n");
    }
    out.push('\n');
    for (i, action) in actions.iter().enumerate() {
        let _ = writeln!(out, "  [{}] {}", i + 1, action.label(installed));
    }
    out
}
