//! Configuration module for the R2k installer.
//!
//! Handles loading and validating installer configuration from TOML files.

mod settings;

pub use settings::*;
