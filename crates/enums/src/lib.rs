#![warn(missing_docs)]
//! Stable id allocation for enum entries added by mods.
//!
//! A category (TechType, EquipmentType, ...) hands out ids above its starting
//! index, never inside the restricted ranges operators list on disk, and
//! remembers every `name:id` pair in a cache file so the same name resolves to
//! the same id on the next launch.

mod banned;
mod cache;
mod category;
mod guard;

pub use banned::{parse_restricted_line, BannedIdRegistry, BannedIdSet, RestrictedLineError};
pub use cache::{cache_file_path, parse_cache_line, CacheEntry, CacheError, CacheLineError, EnumCache};
pub use category::{CategorySpec, EnumCategory};
pub use guard::{CacheFileGuard, MAX_WAIT_CYCLES, WAIT_INTERVAL};

pub use modhelper_core::EnumId;
