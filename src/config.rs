use anyhow::{Context, Result};
use modhelper_core::EnumId;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

/// Default location of the helper configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "modhelper/config.toml";

/// One enum category the helper allocates ids for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategoryConfig {
    /// Category name, e.g. `TechType`.
    pub name: String,
    /// Largest id owned by the game; modded ids start above it.
    pub starting_index: EnumId,
    /// Game values at or above the starting index that must not be reused.
    #[serde(default)]
    pub known_ids: Vec<EnumId>,
}

impl CategoryConfig {
    fn new(name: &str, starting_index: u32) -> Self {
        Self {
            name: name.to_string(),
            starting_index: EnumId(starting_index),
            known_ids: Vec::new(),
        }
    }
}

/// Paths, log level and categories, loaded from TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Root for caches and, when relative, the other folders.
    pub data_dir: PathBuf,
    /// Folder of restricted id files.
    pub restricted_ids_dir: PathBuf,
    /// Folder of language originals/overrides.
    pub language_dir: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Categories to allocate ids for.
    pub categories: Vec<CategoryConfig>,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("modhelper"),
            restricted_ids_dir: PathBuf::from("RestrictedIDs"),
            language_dir: PathBuf::from("Language"),
            log_level: "warn".to_string(),
            categories: vec![
                CategoryConfig::new("TechType", 11010),
                CategoryConfig::new("CraftTreeType", 11),
                CategoryConfig::new("EquipmentType", 1000),
            ],
        }
    }
}

impl HelperConfig {
    /// Defaults rooted at `data_dir`.
    pub fn rooted_at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<HelperConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    HelperConfig::default()
                }
            },
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!(
                        "Helper config not found at {}. Using defaults",
                        path.display()
                    );
                }
                HelperConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self).context("Failed to serialize helper config")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, toml).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Root folder for per-category cache files.
    pub fn cache_root(&self) -> &Path {
        &self.data_dir
    }

    /// Resolved restricted ids folder.
    pub fn restricted_ids_path(&self) -> PathBuf {
        self.data_dir.join(&self.restricted_ids_dir)
    }

    /// Resolved language folder.
    pub fn language_path(&self) -> PathBuf {
        self.data_dir.join(&self.language_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_list_base_categories() {
        let cfg = HelperConfig::default();
        let names: Vec<&str> = cfg.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["TechType", "CraftTreeType", "EquipmentType"]);
        assert_eq!(cfg.categories[0].starting_index, EnumId(11010));
        assert_eq!(cfg.restricted_ids_path(), Path::new("modhelper/RestrictedIDs"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
log_level = "debug"

[[categories]]
name = "PingType"
starting_index = 1000
known_ids = [1001, 1002]
"#,
        )
        .unwrap();

        let cfg = HelperConfig::load_from_path(&path);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.data_dir, PathBuf::from("modhelper"));
        assert_eq!(cfg.categories.len(), 1);
        assert_eq!(cfg.categories[0].known_ids, [EnumId(1001), EnumId(1002)]);
    }

    #[test]
    fn invalid_or_missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "categories = 12").unwrap();
        assert_eq!(HelperConfig::load_from_path(&path).categories.len(), 3);

        let missing = dir.path().join("missing.toml");
        assert_eq!(HelperConfig::load_from_path(&missing).log_level, "warn");
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = HelperConfig::rooted_at(dir.path());
        cfg.categories.push(CategoryConfig {
            name: "BackgroundType".into(),
            starting_index: EnumId(27),
            known_ids: vec![EnumId(28)],
        });
        cfg.save_to_path(&path).unwrap();

        let loaded = HelperConfig::load_from_path(&path);
        assert_eq!(loaded.data_dir, dir.path());
        assert_eq!(loaded.categories, cfg.categories);
    }
}
