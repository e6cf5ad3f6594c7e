#![warn(missing_docs)]
//! Custom language lines registered by mods, with operator overrides.
//!
//! Every line a mod registers is mirrored to `Originals/<mod>.txt` so players
//! can copy it to `Overrides/<mod>.txt`, edit the text and have the edited
//! version win on the next launch. The effective table is what the host
//! splices into its own language dictionary.

mod format;

pub use format::{parse_entries, render_entries};

use modhelper_core::{RegistryError, RegistryMap};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Folder holding the mirrored original lines.
pub const ORIGINALS_DIR: &str = "Originals";

/// Folder holding operator-written overrides.
pub const OVERRIDES_DIR: &str = "Overrides";

const FILE_EXTENSION: &str = "txt";

/// Errors touching language files.
#[derive(Debug, Error)]
pub enum LanguageError {
    /// A language folder could not be created.
    #[error("failed to create language dir {}: {source}", path.display())]
    CreateDir {
        /// Folder path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A folder could not be listed.
    #[error("failed to list {}: {source}", path.display())]
    List {
        /// Folder path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// An originals file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

/// Custom lines per mod plus the effective (possibly overridden) table.
#[derive(Debug)]
pub struct LanguageOverrides {
    originals: BTreeMap<String, RegistryMap<String, String>>,
    custom: RegistryMap<String, String>,
}

impl Default for LanguageOverrides {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageOverrides {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            originals: BTreeMap::new(),
            custom: RegistryMap::new("CustomLanguageLines"),
        }
    }

    /// Register `text` for `line_id` on behalf of `mod_name`.
    ///
    /// A line id can only be registered once across all mods.
    pub fn add_custom_line(
        &mut self,
        mod_name: &str,
        line_id: &str,
        text: &str,
    ) -> Result<(), RegistryError> {
        self.custom
            .add(line_id.to_string(), text.to_string(), mod_name)?;
        self.originals
            .entry(mod_name.to_string())
            .or_insert_with(|| RegistryMap::new(format!("OriginalLines[{mod_name}]")))
            .add(line_id.to_string(), text.to_string(), mod_name)
    }

    /// Effective text for `line_id`.
    pub fn custom_line(&self, line_id: &str) -> Option<&str> {
        self.custom.get(line_id).map(String::as_str)
    }

    /// Effective `(line id, text)` pairs in registration order.
    pub fn custom_lines(&self) -> impl Iterator<Item = (&str, &str)> {
        self.custom
            .iter()
            .map(|entry| (entry.key.as_str(), entry.value.as_str()))
    }

    /// Lines `mod_name` registered, unaffected by overrides.
    pub fn original_lines(&self, mod_name: &str) -> Option<&RegistryMap<String, String>> {
        self.originals.get(mod_name)
    }

    /// Mods with at least one registered line, sorted by name.
    pub fn mods(&self) -> impl Iterator<Item = &str> {
        self.originals.keys().map(String::as_str)
    }

    /// Apply the overrides in `text` to `mod_name`'s lines.
    ///
    /// Keys the mod never registered are reported and skipped. Returns how
    /// many overrides were applied.
    pub fn extract_overrides(&mut self, mod_name: &str, text: &str) -> usize {
        let Some(originals) = self.originals.get(mod_name) else {
            debug!("Ignoring language overrides for unknown mod {mod_name}");
            return 0;
        };

        let mut applied = 0;
        for (key, value) in parse_entries(text) {
            if !originals.contains_key(key.as_str()) {
                warn!("Key '{key}' in language override file for '{mod_name}' did not match an original key");
                continue;
            }
            if let Some(line) = self.custom.get_mut(key.as_str()) {
                *line = value;
                applied += 1;
            }
        }
        applied
    }

    /// Mirror each mod's original lines to `<language_dir>/Originals`.
    ///
    /// Files whose contents already match are left alone. Returns how many
    /// files were written.
    pub fn write_originals(&self, language_dir: &Path) -> Result<usize, LanguageError> {
        let dir = language_dir.join(ORIGINALS_DIR);
        create_dir(&dir)?;

        let mut written = 0;
        for (mod_name, lines) in &self.originals {
            let path = dir.join(format!("{mod_name}.{FILE_EXTENSION}"));
            let rendered =
                render_entries(lines.iter().map(|e| (e.key.as_str(), e.value.as_str())));
            if fs::read_to_string(&path).is_ok_and(|existing| existing == rendered) {
                continue;
            }
            fs::write(&path, rendered).map_err(|source| LanguageError::Write {
                path: path.clone(),
                source,
            })?;
            written += 1;
        }

        if written > 0 {
            info!(
                "Updated {written} of {} original language files",
                self.originals.len()
            );
        }
        Ok(written)
    }

    /// Apply every `<language_dir>/Overrides/<mod>.txt` belonging to a known
    /// mod. Returns the total number of overrides applied.
    pub fn read_overrides(&mut self, language_dir: &Path) -> Result<usize, LanguageError> {
        let dir = language_dir.join(OVERRIDES_DIR);
        create_dir(&dir)?;

        let entries = fs::read_dir(&dir).map_err(|source| LanguageError::List {
            path: dir.clone(),
            source,
        })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == FILE_EXTENSION)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Ok(0);
        }
        debug!("{} language override files found", files.len());

        let mut total = 0;
        for path in files {
            let Some(mod_name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !self.originals.contains_key(mod_name) {
                continue;
            }
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    error!("Failed to read language override file {}: {err}", path.display());
                    continue;
                }
            };
            let applied = self.extract_overrides(mod_name, &text);
            info!("Applied {applied} language overrides to mod {mod_name}");
            total += applied;
        }
        Ok(total)
    }

    /// Write originals then read overrides under `language_dir`.
    pub fn apply_files(&mut self, language_dir: &Path) -> Result<(), LanguageError> {
        create_dir(language_dir)?;
        self.write_originals(language_dir)?;
        self.read_overrides(language_dir)?;
        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<(), LanguageError> {
    fs::create_dir_all(path).map_err(|source| LanguageError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
