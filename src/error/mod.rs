//! Error types for the R2k installer.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
