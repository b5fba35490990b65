//! Audit logging module.
//!
//! Every lifecycle operation leaves one JSON line: who ran it, against
//! which variant, how it ended and how long it took.

mod entry;
mod logger;

pub use entry::{AuditEntry, AuditResult, AuditSubject};
pub use logger::{current_operator, AuditLogger};
