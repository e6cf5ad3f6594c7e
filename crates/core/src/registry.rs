//! Register-once tables.
//!
//! Every override table in the helper (modded enum keys, custom language
//! lines, categories) accepts a key exactly once. The first registrant wins; a
//! later registration of the same key is rejected and reported with both
//! owners so the operator can tell which mods collide.
//!
//! Key equality is decided by a [`KeyPolicy`], so the same table shape serves
//! exact keys, case-insensitive names and enum-like keys that compare by a
//! custom string form.

use indexmap::IndexMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;
use tracing::warn;

/// Errors returned by [`RegistryMap`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The key is already registered; the existing entry was kept.
    #[error(
        "{table}: key {key} from '{owner}' is already registered by '{existing_owner}'"
    )]
    DuplicateKey {
        /// Name of the table that rejected the key.
        table: String,
        /// Human-readable key description.
        key: String,
        /// Registrant whose add was rejected.
        owner: String,
        /// Registrant that holds the key.
        existing_owner: String,
    },
}

/// Decides which keys a [`RegistryMap`] treats as equal.
pub trait KeyPolicy<K> {
    /// Hashed and compared form of a key.
    type Canonical: Hash + Eq;

    /// Canonical form of `key`.
    fn canonical(&self, key: &K) -> Self::Canonical;

    /// Description of `key` used in diagnostics.
    fn describe(&self, key: &K) -> String;
}

/// Keys compare by their own `Eq`/`Hash`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactKeys;

impl<K> KeyPolicy<K> for ExactKeys
where
    K: Clone + Hash + Eq + fmt::Debug,
{
    type Canonical = K;

    fn canonical(&self, key: &K) -> K {
        key.clone()
    }

    fn describe(&self, key: &K) -> String {
        format!("{key:?}")
    }
}

/// String keys compare ignoring case.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitive;

impl<K: AsRef<str>> KeyPolicy<K> for CaseInsensitive {
    type Canonical = String;

    fn canonical(&self, key: &K) -> String {
        key.as_ref().to_lowercase()
    }

    fn describe(&self, key: &K) -> String {
        format!("'{}'", key.as_ref())
    }
}

/// Keys compare by a caller-supplied string form.
///
/// Used for enum-like keys whose numeric value is not meaningful to a reader
/// (e.g. a modded TechType shown by its symbolic name).
#[derive(Clone, Copy)]
pub struct Stringified<F>(pub F);

impl<K, F> KeyPolicy<K> for Stringified<F>
where
    F: Fn(&K) -> String,
{
    type Canonical = String;

    fn canonical(&self, key: &K) -> String {
        (self.0)(key)
    }

    fn describe(&self, key: &K) -> String {
        format!("'{}'", (self.0)(key))
    }
}

/// A registered value and the registrant that added it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry<K, V> {
    /// Key as supplied by the registrant.
    pub key: K,
    /// Registered value.
    pub value: V,
    /// Registrant name (usually the owning mod).
    pub owner: String,
}

/// Insertion-ordered map that rejects duplicate keys instead of replacing them.
pub struct RegistryMap<K, V, P: KeyPolicy<K> = ExactKeys> {
    table: String,
    policy: P,
    entries: IndexMap<P::Canonical, RegistryEntry<K, V>>,
    rejected: usize,
}

impl<K, V> RegistryMap<K, V, ExactKeys>
where
    ExactKeys: KeyPolicy<K>,
{
    /// Create an empty table comparing keys exactly.
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_policy(table, ExactKeys)
    }
}

impl<K, V, P: KeyPolicy<K>> RegistryMap<K, V, P> {
    /// Create an empty table with a custom key policy.
    pub fn with_policy(table: impl Into<String>, policy: P) -> Self {
        Self {
            table: table.into(),
            policy,
            entries: IndexMap::new(),
            rejected: 0,
        }
    }

    /// Table name used in diagnostics.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Register `value` under `key` on behalf of `owner`.
    ///
    /// Fails with [`RegistryError::DuplicateKey`] if an equal key is already
    /// present; the existing entry is left untouched.
    pub fn add(&mut self, key: K, value: V, owner: impl Into<String>) -> Result<(), RegistryError> {
        let owner = owner.into();
        let canonical = self.policy.canonical(&key);
        if let Some(existing) = self.entries.get(&canonical) {
            self.rejected += 1;
            let err = RegistryError::DuplicateKey {
                table: self.table.clone(),
                key: self.policy.describe(&key),
                owner,
                existing_owner: existing.owner.clone(),
            };
            warn!("{err}. The original value has been kept");
            return Err(err);
        }
        self.entries
            .insert(canonical, RegistryEntry { key, value, owner });
        Ok(())
    }

    /// Look up the value registered under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + ToOwned<Owned = K>,
    {
        self.get_entry(key).map(|entry| &entry.value)
    }

    /// Look up the full entry (value and owner) registered under `key`.
    pub fn get_entry<Q>(&self, key: &Q) -> Option<&RegistryEntry<K, V>>
    where
        Q: ?Sized + ToOwned<Owned = K>,
    {
        let canonical = self.policy.canonical(&<Q as ToOwned>::to_owned(key));
        self.entries.get(&canonical)
    }

    /// Mutable access to the value registered under `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: ?Sized + ToOwned<Owned = K>,
    {
        let canonical = self.policy.canonical(&<Q as ToOwned>::to_owned(key));
        self.entries.get_mut(&canonical).map(|entry| &mut entry.value)
    }

    /// Whether `key` is registered.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + ToOwned<Owned = K>,
    {
        self.get_entry(key).is_some()
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many adds were rejected as duplicates.
    pub fn duplicates_rejected(&self) -> usize {
        self.rejected
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry<K, V>> {
        self.entries.values()
    }

    /// Mutable values in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut().map(|entry| &mut entry.value)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.values().map(|entry| &entry.key)
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(|entry| &entry.value)
    }
}

impl<'a, K, V, P: KeyPolicy<K>> IntoIterator for &'a RegistryMap<K, V, P> {
    type Item = &'a RegistryEntry<K, V>;
    type IntoIter = indexmap::map::Values<'a, P::Canonical, RegistryEntry<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl<K, V, P: KeyPolicy<K>> fmt::Debug for RegistryMap<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryMap")
            .field("table", &self.table)
            .field("len", &self.entries.len())
            .field("rejected", &self.rejected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_add_is_rejected_and_first_value_kept() {
        let mut map = RegistryMap::new("CustomTechData");
        map.add("Widget".to_string(), "dataA", "PluginA").unwrap();

        let err = map
            .add("Widget".to_string(), "dataB", "PluginB")
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateKey {
                table: "CustomTechData".into(),
                key: "\"Widget\"".into(),
                owner: "PluginB".into(),
                existing_owner: "PluginA".into(),
            }
        );

        assert_eq!(map.get("Widget"), Some(&"dataA"));
        assert_eq!(map.get_entry("Widget").unwrap().owner, "PluginA");
        assert_eq!(map.len(), 1);
        assert_eq!(map.duplicates_rejected(), 1);
    }

    #[test]
    fn error_message_names_both_owners() {
        let mut map = RegistryMap::new("MiddleClickActions");
        map.add(7u32, (), "First").unwrap();
        let msg = map.add(7u32, (), "Second").unwrap_err().to_string();
        assert!(msg.contains("MiddleClickActions"));
        assert!(msg.contains("'Second'"));
        assert!(msg.contains("'First'"));
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut map = RegistryMap::new("Lines");
        for key in ["zeta", "alpha", "mid"] {
            map.add(key.to_string(), key.len(), "Test").unwrap();
        }
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn case_insensitive_policy_rejects_differently_cased_keys() {
        let mut map = RegistryMap::with_policy("WorldEntityInfo", CaseInsensitive);
        map.add("Titanium".to_string(), 1, "A").unwrap();
        assert!(map.add("TITANIUM".to_string(), 2, "B").is_err());
        assert_eq!(map.get("titanium"), Some(&1));
    }

    #[test]
    fn stringified_policy_uses_custom_form() {
        #[derive(Debug, Clone, Copy)]
        struct TechType(u32);

        let name_of = |t: &TechType| match t.0 {
            11011 => "ModdedWidget".to_string(),
            other => other.to_string(),
        };
        let mut map = RegistryMap::with_policy("CustomBioreactorCharges", Stringified(name_of));
        map.add(TechType(11011), 420.0f32, "A").unwrap();
        let err = map.add(TechType(11011), 1.0, "B").unwrap_err();
        assert!(err.to_string().contains("'ModdedWidget'"));
        assert_eq!(map.get(&TechType(11011)), Some(&420.0));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut map = RegistryMap::new("Charges");
        map.add(1u32, 10, "A").unwrap();
        *map.get_mut(&1u32).unwrap() += 5;
        assert_eq!(map.get(&1u32), Some(&15));
        assert!(map.get(&2u32).is_none());
    }
}
