//! Slot config store
//!
//! Immutable lookup from (project, version) to its `SlotConfig`. Populated
//! once at startup, then shared read-only with the dialog engine.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use faq_dialog_core::{SlotConfig, TenantRef};

use crate::document::{merge_catalogue, parse_catalogue, parse_document};
use crate::ConfigError;

/// Suffix of keyword catalogue files that sit next to a config document.
const CATALOGUE_SUFFIX: &str = ".keywords.json";

/// Per-tenant slot configuration lookup.
///
/// Construction is the only mutation; afterwards the store is shared behind
/// an `Arc` and only read.
#[derive(Default)]
pub struct SlotConfigStore {
    configs: HashMap<TenantRef, Arc<SlotConfig>>,
}

impl SlotConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-built config for a tenant.
    pub fn insert(&mut self, tenant: TenantRef, config: SlotConfig) {
        self.configs.insert(tenant, Arc::new(config));
    }

    /// Parse and register a config document, merging an optional keyword
    /// catalogue into the slot options.
    pub fn register_document(
        &mut self,
        tenant: TenantRef,
        document: &str,
        catalogue: Option<&str>,
    ) -> Result<(), ConfigError> {
        let mut config = parse_document(document)?;
        if let Some(catalogue) = catalogue {
            let catalogue = parse_catalogue(catalogue)?;
            merge_catalogue(&mut config, &catalogue);
        }
        tracing::info!(%tenant, slots = config.required.len(), "registered slot config");
        self.configs.insert(tenant, Arc::new(config));
        Ok(())
    }

    /// Load every `<project>__<version>.json` document in a directory,
    /// picking up `<project>__<version>.keywords.json` catalogues when
    /// present.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, ConfigError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ConfigError::FileNotFound(dir.display().to_string()));
        }

        let mut loaded = 0;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".json") || name.ends_with(CATALOGUE_SUFFIX) {
                continue;
            }
            let Some(tenant) = tenant_from_file_name(name) else {
                tracing::warn!(file = %name, "skipping config file without <project>__<version> name");
                continue;
            };

            let document = fs::read_to_string(&path)?;
            let catalogue_path = path.with_file_name(format!(
                "{}{}",
                name.trim_end_matches(".json"),
                CATALOGUE_SUFFIX
            ));
            let catalogue = if catalogue_path.is_file() {
                Some(fs::read_to_string(&catalogue_path)?)
            } else {
                None
            };

            self.register_document(tenant, &document, catalogue.as_deref())?;
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Look up the config for a tenant.
    pub fn get(&self, tenant: &TenantRef) -> Result<Arc<SlotConfig>, ConfigError> {
        self.configs
            .get(tenant)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(tenant.clone()))
    }

    /// Registered tenants, for diagnostics.
    pub fn tenants(&self) -> Vec<TenantRef> {
        self.configs.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

/// `who-faq__v2.json` -> (`who-faq`, `v2`)
fn tenant_from_file_name(name: &str) -> Option<TenantRef> {
    let stem = name.strip_suffix(".json")?;
    let (project, version) = stem.split_once("__")?;
    if project.is_empty() || version.is_empty() {
        return None;
    }
    Some(TenantRef::new(project, version))
}
