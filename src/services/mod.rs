//! Service variants and their lifecycle.
//!
//! ## Layers
//!
//! 1. `registry` builds the immutable Local/Remote variant pairs
//! 2. `control` is the raw service-control interface, `sc` its `sc.exe` backend
//! 3. `classify` turns raw tool output into statuses and lifecycle outcomes
//! 4. `oracle` and `wait` read live status and poll for transitions
//! 5. `manager` sequences install, uninstall, start, stop and restart

mod assets;
mod classify;
mod control;
mod layout;
mod logs;
mod manager;
mod oracle;
mod registry;
mod sc;
mod status;
mod variant;
mod wait;

pub use assets::{AssetStore, DirectoryAssetStore};
pub use classify::{
    classify_create, classify_delete, classify_query, classify_start, classify_stop, diagnostic,
    failure_code, parse_pid, ERROR_SERVICE_ALREADY_RUNNING, ERROR_SERVICE_DOES_NOT_EXIST,
    ERROR_SERVICE_EXISTS, ERROR_SERVICE_MARKED_FOR_DELETE, ERROR_SERVICE_NOT_ACTIVE,
};
pub use control::{quote_binary_path, RecoveryPolicy, ServiceControl, ServiceSpec};
pub use layout::InstallLayout;
pub use logs::{open_in_viewer, LogTarget};
pub use manager::{LifecycleContext, LifecycleManager, LifecyclePolicy};
pub use oracle::StatusOracle;
pub use registry::{Family, VariantRegistry};
pub use sc::ScServiceControl;
pub use status::{FamilyStatus, Status};
pub use variant::{ServiceNaming, Variant, VariantKind};
pub use wait::Poller;
