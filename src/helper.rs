//! Owner of every category and the language store; the host calls into this
//! at plugin initialization and at save points.

use anyhow::{bail, Result};
use modhelper_core::{EnumId, RegistryMap};
use modhelper_enums::{BannedIdRegistry, CacheFileGuard, CategorySpec, EnumCache, EnumCategory};
use modhelper_language::LanguageOverrides;
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::{CategoryConfig, HelperConfig};

const OWNER: &str = "ModHelper";

/// The helper's state for one process.
pub struct ModHelper {
    config: HelperConfig,
    banned: BannedIdRegistry,
    guard: CacheFileGuard,
    categories: RegistryMap<String, EnumCategory>,
    language: LanguageOverrides,
}

impl ModHelper {
    /// Build the helper and every configured category.
    ///
    /// Invalid categories are logged and skipped. Nothing is read from the
    /// cache files until [`ModHelper::initialize`] or the first allocation.
    pub fn new(config: HelperConfig) -> Self {
        let banned = BannedIdRegistry::new(config.restricted_ids_path());
        let mut helper = Self {
            categories: RegistryMap::new("Categories"),
            banned,
            guard: CacheFileGuard::new(),
            language: LanguageOverrides::new(),
            config,
        };

        let configured: Vec<CategoryConfig> = helper.config.categories.clone();
        for category in configured {
            let spec = CategorySpec {
                name: category.name,
                starting_index: category.starting_index,
            };
            if let Err(err) = helper.add_category(spec, &category.known_ids) {
                warn!("Skipping configured category: {err:#}");
            }
        }
        helper
    }

    /// Build the helper from a TOML file, falling back to defaults.
    pub fn from_config_file(path: &Path) -> Self {
        Self::new(HelperConfig::load_from_path(path))
    }

    /// Configuration the helper was built from.
    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    /// Add a category. `host_known_ids` are the game's own values; those at
    /// or above the starting index are banned.
    pub fn add_category(&mut self, spec: CategorySpec, host_known_ids: &[EnumId]) -> Result<()> {
        if spec.name.trim().is_empty() {
            bail!("category name cannot be empty");
        }
        if self.categories.contains_key(spec.name.as_str()) {
            bail!("category {} is already configured", spec.name);
        }

        let reserved: Vec<EnumId> = host_known_ids
            .iter()
            .copied()
            .filter(|id| *id >= spec.starting_index)
            .collect();
        info!(
            "Finished known {} exclusion. {} IDs were added in ban list",
            spec.name,
            reserved.len()
        );

        let banned = self.banned.banned_ids_for(&spec.name, &[reserved.as_slice()]);
        let cache = EnumCache::new(&spec.name, self.config.cache_root(), self.guard.clone());
        let name = spec.name.clone();
        self.categories
            .add(name, EnumCategory::new(spec, banned, cache), OWNER)?;
        Ok(())
    }

    /// Category named `name`.
    pub fn category(&self, name: &str) -> Option<&EnumCategory> {
        self.categories.get(name)
    }

    /// Mutable category named `name`.
    pub fn category_mut(&mut self, name: &str) -> Option<&mut EnumCategory> {
        self.categories.get_mut(name)
    }

    /// Categories in the order they were added.
    pub fn categories(&self) -> impl Iterator<Item = &EnumCategory> {
        self.categories.values()
    }

    /// Register `name` in `category` for `owner`. `None` if the category is
    /// unknown.
    pub fn register(&mut self, category: &str, name: &str, owner: &str) -> Option<EnumId> {
        let Some(target) = self.categories.get_mut(category) else {
            warn!("{owner} tried to add '{name}' to unknown category {category}");
            return None;
        };
        Some(target.register(name, owner))
    }

    /// Language store.
    pub fn language(&self) -> &LanguageOverrides {
        &self.language
    }

    /// Mutable language store, for registering custom lines.
    pub fn language_mut(&mut self) -> &mut LanguageOverrides {
        &mut self.language
    }

    /// Load every cache and apply the language files.
    pub fn initialize(&mut self) {
        for category in self.categories.values_mut() {
            category.ensure_loaded();
        }
        let language_dir = self.config.language_path();
        if let Err(err) = self.language.apply_files(&language_dir) {
            error!("Language files were not applied: {err}");
        }
        info!(
            "Mod helper initialized with {} categories",
            self.categories.len()
        );
    }

    /// Save every category's cache. Failures are logged and counted.
    pub fn save_all(&mut self) -> usize {
        let mut failures = 0;
        for category in self.categories.values_mut() {
            if let Err(err) = category.save() {
                error!("Failed to save {} cache: {err}", category.name());
                failures += 1;
            }
        }
        failures
    }
}
