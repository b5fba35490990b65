//! R2k Installer Library
//!
//! Installs and manages paired Local/Remote background services. Each
//! family ships two mutually exclusive variants; at most one of them is
//! registered with the OS at a time.

pub mod audit;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod executor;
pub mod privileges;
pub mod services;
pub mod validation;
