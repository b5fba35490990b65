//! Elevated-privilege check.
//!
//! Registering services needs administrator rights; the dashboard refuses
//! to start without them.

use tracing::debug;

/// Whether the process runs with administrator/root rights.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    let euid = nix::unistd::geteuid();
    debug!(euid = euid.as_raw(), "Checked effective uid");
    euid.is_root()
}

/// Whether the process runs with administrator/root rights.
///
/// Opening the first physical drive for reading only succeeds from an
/// elevated token.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    match std::fs::File::open(r"\\.\PHYSICALDRIVE0") {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "Raw disk probe failed");
            false
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_matches_effective_uid() {
        assert_eq!(is_elevated(), nix::unistd::geteuid().as_raw() == 0);
    }
}
