//! On-disk locations of installed variants and their logs.

use std::path::{Path, PathBuf};

use crate::config::PathsConfig;

use super::variant::Variant;

/// Deterministic paths derived from a variant's registry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    install_root: PathBuf,
    data_root: PathBuf,
}

impl InstallLayout {
    pub fn new(install_root: impl Into<PathBuf>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            data_root: data_root.into(),
        }
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// `<install_root>/<registry_name>`
    pub fn install_dir(&self, variant: &Variant) -> PathBuf {
        self.install_root.join(&variant.registry_name)
    }

    /// `<install_root>/<registry_name>/<executable_name>`
    pub fn executable_path(&self, variant: &Variant) -> PathBuf {
        self.install_dir(variant).join(&variant.executable_name)
    }

    /// `<data_root>/<registry_name>`
    pub fn log_dir(&self, variant: &Variant) -> PathBuf {
        self.data_root.join(&variant.registry_name)
    }

    /// `<data_root>/<registry_name>/<registry_name>.log`
    pub fn log_file(&self, variant: &Variant) -> PathBuf {
        self.log_dir(variant)
            .join(format!("{}.log", variant.registry_name))
    }
}

impl From<&PathsConfig> for InstallLayout {
    fn from(paths: &PathsConfig) -> Self {
        Self::new(&paths.install_root, &paths.data_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::variant::VariantKind;
    use std::sync::Arc;

    #[test]
    fn test_paths_follow_registry_name() {
        let variant = Variant {
            id: "ticket-remote".to_string(),
            family: "ticket".to_string(),
            kind: VariantKind::Remote,
            registry_name: "R2k_TicketServicio_Remote".to_string(),
            display_name: "R2k_TicketServicio (Remote)".to_string(),
            executable_name: "R2k_TicketServicio_Remote.exe".to_string(),
            payload: Arc::from(vec![1u8]),
        };
        let layout = InstallLayout::new("/pf", "/pd");

        assert_eq!(layout.install_dir(&variant), PathBuf::from("/pf/R2k_TicketServicio_Remote"));
        assert_eq!(
            layout.executable_path(&variant),
            PathBuf::from("/pf/R2k_TicketServicio_Remote/R2k_TicketServicio_Remote.exe")
        );
        assert_eq!(layout.log_dir(&variant), PathBuf::from("/pd/R2k_TicketServicio_Remote"));
        assert_eq!(
            layout.log_file(&variant),
            PathBuf::from("/pd/R2k_TicketServicio_Remote/R2k_TicketServicio_Remote.log")
        );
    }
}
