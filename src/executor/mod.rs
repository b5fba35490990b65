//! Command executor module.
//!
//! Handles subprocess spawning for the service-control tools and
//! trimming of their diagnostics.

mod output;
mod subprocess;

pub use output::sanitize_output;
pub use subprocess::{run_command, SubprocessBuilder, ToolOutput};
