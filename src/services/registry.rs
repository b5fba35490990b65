//! Variant registry.
//!
//! Canonical, ordered table of every family and its Local/Remote pair.
//! Built once at startup; construction fails if any naming field or
//! payload is empty.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::{FamilyConfig, Settings};
use crate::error::{InstallerError, InstallerResult};

use super::assets::AssetStore;
use super::variant::{ServiceNaming, Variant, VariantKind};

/// A family: two mutually exclusive variants of one service.
#[derive(Debug, Clone)]
pub struct Family {
    pub key: String,
    pub title: String,
    variants: [Arc<Variant>; 2],
}

impl Family {
    /// Build a family from its configuration, loading both payloads.
    pub fn generate(config: &FamilyConfig, assets: &dyn AssetStore) -> InstallerResult<Self> {
        let build = |kind: VariantKind| -> InstallerResult<Variant> {
            let naming = ServiceNaming::generate(
                &config.key,
                &config.base_name,
                config.display_name.as_deref(),
                kind,
            );
            let payload = assets.load(&naming.executable_name)?;
            Ok(Variant {
                id: naming.id,
                family: config.key.clone(),
                kind,
                registry_name: naming.registry_name,
                display_name: naming.display_name,
                executable_name: naming.executable_name,
                payload: Arc::from(payload),
            })
        };

        Ok(Self {
            key: config.key.clone(),
            title: config.title.clone(),
            variants: [Arc::new(build(VariantKind::Local)?), Arc::new(build(VariantKind::Remote)?)],
        })
    }

    /// Both variants, Local first.
    pub fn variants(&self) -> &[Arc<Variant>; 2] {
        &self.variants
    }

    pub fn variant(&self, kind: VariantKind) -> &Arc<Variant> {
        &self.variants[kind.slot()]
    }
}

/// Registry of all service families.
#[derive(Debug)]
pub struct VariantRegistry {
    families: Vec<Family>,
    by_id: HashMap<String, Arc<Variant>>,
}

impl VariantRegistry {
    /// Build the registry for every configured family.
    pub fn from_settings(settings: &Settings, assets: &dyn AssetStore) -> InstallerResult<Self> {
        let families = settings
            .families
            .iter()
            .map(|config| Family::generate(config, assets))
            .collect::<InstallerResult<Vec<_>>>()?;
        Self::new(families)
    }

    /// Build a registry from already-constructed families.
    pub fn new(families: Vec<Family>) -> InstallerResult<Self> {
        let mut by_id = HashMap::new();

        for family in &families {
            for (slot, variant) in family.variants.iter().enumerate() {
                check_variant(family, slot, variant)?;
                if by_id.insert(variant.id.clone(), Arc::clone(variant)).is_some() {
                    return Err(InstallerError::Registry {
                        message: format!("Duplicate variant id '{}'", variant.id),
                    });
                }
            }
        }

        info!(
            families = families.len(),
            variants = by_id.len(),
            "Variant registry initialized"
        );

        Ok(Self { families, by_id })
    }

    /// Family keys in menu order.
    pub fn list_families(&self) -> Vec<&str> {
        self.families.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    pub fn family(&self, key: &str) -> Option<&Family> {
        self.families.iter().find(|f| f.key == key)
    }

    /// The Local/Remote pair of `family`.
    pub fn variants_of(&self, family: &str) -> Option<&[Arc<Variant>; 2]> {
        self.family(family).map(Family::variants)
    }

    /// Look a variant up by id ("scale-local").
    pub fn variant(&self, id: &str) -> Option<Arc<Variant>> {
        self.by_id.get(id).cloned()
    }

    /// Number of registered variants.
    pub fn count(&self) -> usize {
        self.by_id.len()
    }
}

fn check_variant(family: &Family, slot: usize, variant: &Variant) -> InstallerResult<()> {
    let missing = [
        ("id", variant.id.is_empty()),
        ("registry_name", variant.registry_name.is_empty()),
        ("display_name", variant.display_name.is_empty()),
        ("executable_name", variant.executable_name.is_empty()),
        ("payload", variant.payload.is_empty()),
    ]
    .into_iter()
    .find(|(_, empty)| *empty);

    if let Some((field, _)) = missing {
        return Err(InstallerError::Registry {
            message: format!("Variant '{}' of family '{}' has an empty {}", variant.id, family.key, field),
        });
    }

    if variant.family != family.key || variant.kind.slot() != slot {
        return Err(InstallerError::Registry {
            message: format!(
                "Variant '{}' is not the {} variant of family '{}'",
                variant.id,
                VariantKind::ALL[slot],
                family.key
            ),
        });
    }

    Ok(())
}
