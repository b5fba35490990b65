//! Dashboard: the operator-facing side of the installer.
//!
//! `controller` holds the manager map and audits every operation,
//! `menu` decides which actions a family offers, `terminal` drives the
//! interactive loop.

mod controller;
mod menu;
mod terminal;

pub use controller::{Controller, OperationOutcome};
pub use menu::{available_actions, format_family_status, render_dashboard, render_family_menu, FamilyAction};
pub use terminal::run;
