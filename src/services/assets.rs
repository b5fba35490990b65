//! Install payload sources.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::InstallerError;

/// Supplies the executable bytes for a variant.
pub trait AssetStore: Send + Sync {
    /// Load the payload for `executable_name`.
    fn load(&self, executable_name: &str) -> Result<Vec<u8>, InstallerError>;
}

/// Reads payloads from `<root>/<executable_name>`.
#[derive(Debug, Clone)]
pub struct DirectoryAssetStore {
    root: PathBuf,
}

impl DirectoryAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetStore for DirectoryAssetStore {
    fn load(&self, executable_name: &str) -> Result<Vec<u8>, InstallerError> {
        let path = self.root.join(executable_name);
        let bytes = std::fs::read(&path).map_err(|e| InstallerError::Registry {
            message: format!("Failed to read payload '{}': {}", path.display(), e),
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "Payload loaded");
        Ok(bytes)
    }
}
