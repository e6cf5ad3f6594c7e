//! Per-category `name:id` cache file.
//!
//! Save data stores enum values as integers, so an id handed out once must be
//! handed out again for the same name on every later launch. The cache keeps
//! every assignment ever made for a category; entries are never removed.

use crate::guard::CacheFileGuard;
use modhelper_core::{EnumId, ParseIdError};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// One persisted `name:id` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Symbolic name requested by a mod.
    pub name: String,
    /// Id assigned to the name.
    pub id: EnumId,
}

/// Errors reading or writing a cache file.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache file exists but could not be read.
    #[error("failed to read cache file {}: {source}", path.display())]
    Read {
        /// Cache file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The cache file or its directory could not be written.
    #[error("failed to write cache file {}: {source}", path.display())]
    Write {
        /// Cache file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Saving was refused because the existing file could not be read.
    #[error("cache file {} could not be read this session and will not be overwritten", path.display())]
    WriteProtected {
        /// Cache file path.
        path: PathBuf,
    },
}

/// Why a cache line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLineError {
    /// The line does not have exactly one `:` separator.
    FieldCount(usize),
    /// The name field is empty.
    MissingName,
    /// The id field is invalid.
    BadId(ParseIdError),
}

impl fmt::Display for CacheLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheLineError::FieldCount(n) => write!(f, "expected 2 fields, found {n}"),
            CacheLineError::MissingName => f.write_str("name is empty"),
            CacheLineError::BadId(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CacheLineError {}

/// Parse one `<name>:<id>` line.
pub fn parse_cache_line(line: &str) -> Result<CacheEntry, CacheLineError> {
    let fields: Vec<&str> = line.split(':').collect();
    let &[name, id] = fields.as_slice() else {
        return Err(CacheLineError::FieldCount(fields.len()));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(CacheLineError::MissingName);
    }
    let id = id.parse::<EnumId>().map_err(CacheLineError::BadId)?;
    Ok(CacheEntry {
        name: name.to_string(),
        id,
    })
}

/// Where the cache for `category` lives under `cache_root`.
pub fn cache_file_path(cache_root: &Path, category: &str) -> PathBuf {
    cache_root
        .join(format!("{category}Cache"))
        .join(format!("{category}Cache.txt"))
}

/// Whether `name` can round-trip through the line format.
pub(crate) fn is_storable_name(name: &str) -> bool {
    !name.trim().is_empty() && name.trim() == name && !name.contains([':', '\n', '\r'])
}

/// In-memory view of one category's cache file.
#[derive(Debug)]
pub struct EnumCache {
    category: String,
    path: PathBuf,
    entries: Vec<CacheEntry>,
    loaded: bool,
    write_protected: bool,
    guard: CacheFileGuard,
}

impl EnumCache {
    /// Cache for `category` stored under `cache_root`.
    pub fn new(category: impl Into<String>, cache_root: &Path, guard: CacheFileGuard) -> Self {
        let category = category.into();
        let path = cache_file_path(cache_root, &category);
        Self::at_path(category, path, guard)
    }

    /// Cache for `category` stored at an explicit file path.
    pub fn at_path(category: impl Into<String>, path: impl Into<PathBuf>, guard: CacheFileGuard) -> Self {
        Self {
            category: category.into(),
            path: path.into(),
            entries: Vec::new(),
            loaded: false,
            write_protected: false,
            guard,
        }
    }

    /// Category this cache belongs to.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`EnumCache::load`] has run.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether saves are refused for this session.
    pub fn is_write_protected(&self) -> bool {
        self.write_protected
    }

    /// All known entries, file entries first, in insertion order.
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    /// Number of known entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are known.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the cache file. Does nothing once loaded.
    ///
    /// A missing file is created empty. A file that exists but cannot be read
    /// leaves the cache loaded-but-empty and write-protected, so the session
    /// keeps working in memory without clobbering the unread file.
    pub fn load(&mut self) -> Result<(), CacheError> {
        if self.loaded {
            return Ok(());
        }

        if !self.path.exists() {
            self.loaded = true;
            debug!(
                "No {} cache at {}. Creating an empty one",
                self.category,
                self.path.display()
            );
            return self.save();
        }

        let contents = {
            let _guard = self.guard.acquire(&self.category);
            fs::read_to_string(&self.path)
        };
        self.loaded = true;
        let contents = match contents {
            Ok(contents) => contents,
            Err(source) => {
                self.write_protected = true;
                return Err(CacheError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut parsed = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_cache_line(line) {
                Ok(entry) => parsed.push(entry),
                Err(err) => warn!(
                    "Skipping malformed {} cache entry ({err}). File: '{}' Line {}: '{line}'",
                    self.category,
                    self.path.display(),
                    index + 1
                ),
            }
        }
        parsed.append(&mut self.entries);
        self.entries = parsed;

        info!("Loaded {} cache with {} entries", self.category, self.entries.len());
        Ok(())
    }

    /// Overwrite the cache file with every known entry.
    pub fn save(&self) -> Result<(), CacheError> {
        if self.write_protected {
            warn!(
                "Not saving {} cache: {} could not be read this session",
                self.category,
                self.path.display()
            );
            return Err(CacheError::WriteProtected {
                path: self.path.clone(),
            });
        }

        let mut text = String::new();
        for entry in &self.entries {
            if !is_storable_name(&entry.name) {
                warn!(
                    "{} name '{}' cannot be stored in the cache file and will not keep its id {} across launches",
                    self.category,
                    entry.name.escape_debug(),
                    entry.id
                );
                continue;
            }
            text.push_str(&entry.name);
            text.push(':');
            text.push_str(&entry.id.to_string());
            text.push('\n');
        }

        let write_err = |source| CacheError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        {
            let _guard = self.guard.acquire(&self.category);
            fs::write(&self.path, text).map_err(write_err)?;
        }

        debug!(
            "Saved {} {} cache entries to {}",
            self.entries.len(),
            self.category,
            self.path.display()
        );
        Ok(())
    }

    /// First entry named `name`.
    pub fn lookup_by_name(&self, name: &str) -> Option<&CacheEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// First entry with id `id`.
    pub fn lookup_by_id(&self, id: EnumId) -> Option<&CacheEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Largest id in the cache.
    pub fn largest_id(&self) -> Option<EnumId> {
        self.entries.iter().map(|entry| entry.id).max()
    }

    /// How many entries carry `id`.
    pub fn count_id(&self, id: EnumId) -> usize {
        self.entries.iter().filter(|entry| entry.id == id).count()
    }

    pub(crate) fn push(&mut self, entry: CacheEntry) {
        self.entries.push(entry);
    }
}
