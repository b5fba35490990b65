//! Opening service logs with the platform's default viewer.

use std::path::Path;

use tracing::info;

use crate::error::{InstallerError, LogAccessErrorKind};
use crate::executor::SubprocessBuilder;

/// What to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// The service's log file, in a text viewer.
    File,
    /// The directory holding it, in the file browser.
    Directory,
}

#[cfg(windows)]
fn viewer_for(target: LogTarget) -> &'static str {
    match target {
        LogTarget::File => "notepad.exe",
        LogTarget::Directory => "explorer.exe",
    }
}

#[cfg(target_os = "macos")]
fn viewer_for(_target: LogTarget) -> &'static str {
    "open"
}

#[cfg(all(unix, not(target_os = "macos")))]
fn viewer_for(_target: LogTarget) -> &'static str {
    "xdg-open"
}

/// Check that `path` exists as the expected kind of entry.
pub fn ensure_exists(path: &Path, target: LogTarget) -> Result<(), InstallerError> {
    let present = match target {
        LogTarget::File => path.is_file(),
        LogTarget::Directory => path.is_dir(),
    };
    if present {
        return Ok(());
    }

    let kind = match target {
        LogTarget::File => LogAccessErrorKind::FileMissing {
            path: path.to_path_buf(),
        },
        LogTarget::Directory => LogAccessErrorKind::DirectoryMissing {
            path: path.to_path_buf(),
        },
    };
    Err(InstallerError::LogAccess { kind })
}

/// Open `path` without waiting for the viewer to exit.
pub fn open_in_viewer(path: &Path, target: LogTarget) -> Result<(), InstallerError> {
    ensure_exists(path, target)?;

    let path_arg = path.to_string_lossy();
    SubprocessBuilder::new(viewer_for(target))
        .arg(&path_arg)
        .spawn_detached()
        .map_err(|e| InstallerError::LogAccess {
            kind: LogAccessErrorKind::ViewerFailed {
                message: e.to_string(),
            },
        })?;

    info!(path = %path.display(), target = ?target, "Opened logs");
    Ok(())
}
