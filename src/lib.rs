#![warn(missing_docs)]
//! Stable integer ids for enum entries added by mods.
//!
//! [`ModHelper`] owns one [`EnumCategory`] per enum type. Each category hands
//! out ids above the game's own range, skips ids other tools have reserved in
//! the restricted id folder, and remembers every assignment in a cache file so
//! save games keep pointing at the right entry across launches.

mod config;
mod helper;

pub use config::{CategoryConfig, HelperConfig, DEFAULT_CONFIG_PATH};
pub use helper::ModHelper;

pub use modhelper_core::{
    CaseInsensitive, EnumId, ExactKeys, KeyPolicy, ParseIdError, RegistryEntry, RegistryError,
    RegistryMap, Stringified,
};
pub use modhelper_enums::{
    BannedIdRegistry, BannedIdSet, CacheEntry, CacheError, CacheFileGuard, CategorySpec,
    EnumCache, EnumCategory,
};
pub use modhelper_language::{LanguageError, LanguageOverrides};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_level`. Calling this twice is harmless.
pub fn init_tracing(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init();
}
