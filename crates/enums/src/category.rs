//! Id allocation for one enum category.

use crate::banned::BannedIdSet;
use crate::cache::{is_storable_name, CacheEntry, CacheError, EnumCache};
use modhelper_core::{EnumId, RegistryEntry, RegistryMap};
use tracing::{debug, error, info, warn};

/// Static description of a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpec {
    /// Category name, e.g. `TechType`. Also names the cache file.
    pub name: String,
    /// Ids at or below this value belong to the game; new ids start above it.
    pub starting_index: EnumId,
}

impl CategorySpec {
    /// Build a spec.
    pub fn new(name: impl Into<String>, starting_index: u32) -> Self {
        Self {
            name: name.into(),
            starting_index: EnumId(starting_index),
        }
    }
}

/// Allocator context for one category: its banned ids, its cache and the
/// names mods registered during this session.
#[derive(Debug)]
pub struct EnumCategory {
    spec: CategorySpec,
    banned: BannedIdSet,
    cache: EnumCache,
    modded: RegistryMap<String, EnumId>,
}

impl EnumCategory {
    /// Create the context. The cache is loaded lazily on first use.
    pub fn new(spec: CategorySpec, banned: BannedIdSet, cache: EnumCache) -> Self {
        let modded = RegistryMap::new(format!("Modded{}", spec.name));
        Self {
            spec,
            banned,
            cache,
            modded,
        }
    }

    /// Category name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Category spec.
    pub fn spec(&self) -> &CategorySpec {
        &self.spec
    }

    /// Starting index; allocated ids are strictly above it.
    pub fn starting_index(&self) -> EnumId {
        self.spec.starting_index
    }

    /// Ids this category never allocates.
    pub fn banned(&self) -> &BannedIdSet {
        &self.banned
    }

    /// Underlying cache.
    pub fn cache(&self) -> &EnumCache {
        &self.cache
    }

    /// Load the cache if that has not happened yet.
    ///
    /// Load failures are logged; the category keeps allocating in memory.
    pub fn ensure_loaded(&mut self) {
        if self.cache.is_loaded() {
            return;
        }
        if let Err(err) = self.cache.load() {
            error!("{} ids will not persist this session: {err}", self.spec.name);
        }
        for entry in self.cache.entries() {
            if self.banned.contains(entry.id) {
                warn!(
                    "Cached {} '{}' uses restricted id {}. Keeping it so existing saves stay valid",
                    self.spec.name, entry.name, entry.id
                );
            }
        }
    }

    /// Id for `name`, allocating a new one if the name has never been seen.
    ///
    /// New ids go one above the larger of the starting index and the largest
    /// cached id. If that lands on a banned id the candidate jumps past the
    /// largest banned id, which is above every banned id by construction.
    pub fn allocate(&mut self, name: &str) -> EnumId {
        self.ensure_loaded();
        if let Some(entry) = self.cache.lookup_by_name(name) {
            return entry.id;
        }

        let id = self.next_free_index();
        if !is_storable_name(name) {
            warn!(
                "{} name '{}' contains characters the cache file cannot hold. Its id {id} will not persist",
                self.spec.name,
                name.escape_debug()
            );
        }
        self.cache.push(CacheEntry {
            name: name.to_string(),
            id,
        });
        id
    }

    /// Allocate `name` and record it as a modded key owned by `owner`.
    ///
    /// Registering the same name twice returns the same id; the second
    /// registration is reported and the first owner is kept.
    pub fn register(&mut self, name: &str, owner: &str) -> EnumId {
        let id = self.allocate(name);
        if self.modded.add(name.to_string(), id, owner).is_ok() {
            debug!("Successfully added {}: '{name}' to index {id}", self.spec.name);
        }
        id
    }

    /// First cached entry named `name`.
    pub fn lookup_by_name(&mut self, name: &str) -> Option<&CacheEntry> {
        self.ensure_loaded();
        self.cache.lookup_by_name(name)
    }

    /// First cached entry with id `id`.
    pub fn lookup_by_id(&mut self, id: EnumId) -> Option<&CacheEntry> {
        self.ensure_loaded();
        self.cache.lookup_by_id(id)
    }

    /// Largest of the starting index and every cached id.
    pub fn largest_index(&mut self) -> EnumId {
        self.ensure_loaded();
        self.cache
            .largest_id()
            .map_or(self.spec.starting_index, |id| id.max(self.spec.starting_index))
    }

    /// Id the next new name would receive.
    pub fn next_free_index(&mut self) -> EnumId {
        let candidate = EnumId(self.largest_index().0.saturating_add(1));
        match self.banned.largest() {
            Some(largest) if self.banned.contains(candidate) => {
                EnumId(largest.0.saturating_add(1))
            }
            _ => candidate,
        }
    }

    /// Cache consistency check: true only when `id` is cached at least twice
    /// and is not banned. A true result means the cache file was edited or
    /// merged and two names now share one id.
    pub fn is_index_valid(&mut self, id: EnumId) -> bool {
        self.ensure_loaded();
        self.cache.count_id(id) >= 2 && !self.banned.contains(id)
    }

    /// Names registered through [`EnumCategory::register`] this session.
    pub fn modded_count(&self) -> usize {
        self.modded.len()
    }

    /// Modded registrations in registration order.
    pub fn modded_entries(&self) -> impl Iterator<Item = &RegistryEntry<String, EnumId>> {
        self.modded.iter()
    }

    /// Persist the cache.
    pub fn save(&mut self) -> Result<(), CacheError> {
        self.ensure_loaded();
        self.cache.save()?;
        info!(
            "Saved {} {} ids ({} registered this session)",
            self.cache.len(),
            self.spec.name,
            self.modded.len()
        );
        Ok(())
    }
}
