//! Service variant descriptors.

use std::fmt;
use std::sync::Arc;

/// Which flavour of a family a variant is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantKind {
    /// Used by the POS on this machine.
    Local,
    /// Reachable from other machines on the LAN.
    Remote,
}

impl VariantKind {
    /// Both kinds, in family slot order.
    pub const ALL: [VariantKind; 2] = [VariantKind::Local, VariantKind::Remote];

    /// Capitalised name used in generated service names ("Local").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Remote => "Remote",
        }
    }

    /// Lowercase name used in variant ids ("local").
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }

    /// Index of this kind's slot within a family.
    pub fn slot(&self) -> usize {
        match self {
            Self::Local => 0,
            Self::Remote => 1,
        }
    }

    /// The other kind of the pair.
    pub fn sibling(&self) -> Self {
        match self {
            Self::Local => Self::Remote,
            Self::Remote => Self::Local,
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one installable service variant.
#[derive(Clone, PartialEq, Eq)]
pub struct Variant {
    /// Stable key, e.g. "scale-local".
    pub id: String,
    /// Family key, e.g. "scale".
    pub family: String,
    pub kind: VariantKind,
    /// Name the service is registered under with the OS.
    pub registry_name: String,
    /// Human-readable label shown by the OS service manager.
    pub display_name: String,
    /// File name of the executable inside the install directory.
    pub executable_name: String,
    /// The executable itself.
    pub payload: Arc<[u8]>,
}

// Payloads are megabytes of machine code; keep them out of debug output.
impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("id", &self.id)
            .field("family", &self.family)
            .field("kind", &self.kind)
            .field("registry_name", &self.registry_name)
            .field("display_name", &self.display_name)
            .field("executable_name", &self.executable_name)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// Names generated for one variant of a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNaming {
    pub id: String,
    pub registry_name: String,
    pub display_name: String,
    pub executable_name: String,
}

impl ServiceNaming {
    /// Derive the names of `kind` within `family`.
    ///
    /// `base_name` drives the registry and executable names; `display_base`
    /// (falling back to `base_name`) drives the display name.
    pub fn generate(
        family: &str,
        base_name: &str,
        display_base: Option<&str>,
        kind: VariantKind,
    ) -> Self {
        let registry_name = format!("{}_{}", base_name, kind.as_str());
        Self {
            id: format!("{}-{}", family, kind.slug()),
            display_name: format!("{} ({})", display_base.unwrap_or(base_name), kind.as_str()),
            executable_name: format!("{}{}", registry_name, std::env::consts::EXE_SUFFIX),
            registry_name,
        }
    }
}
