//! Restricted id lists supplied by operators.
//!
//! Every file in the restricted-ids directory lists ids that were patched in
//! from outside the helper (usually one file per foreign mod). Lines look like
//! `11110:TechType`; whitespace around either field is ignored.

use modhelper_core::{EnumId, ParseIdError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Ordered, read-only set of ids a category must never hand out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannedIdSet {
    ids: BTreeSet<EnumId>,
}

impl BannedIdSet {
    /// Empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether `id` is banned.
    pub fn contains(&self, id: EnumId) -> bool {
        self.ids.contains(&id)
    }

    /// Largest banned id, if any.
    pub fn largest(&self) -> Option<EnumId> {
        self.ids.last().copied()
    }

    /// Number of banned ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is banned.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Banned ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = EnumId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<EnumId> for BannedIdSet {
    fn from_iter<I: IntoIterator<Item = EnumId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Why a restricted-id line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestrictedLineError {
    /// The line does not have exactly one `:` separator.
    FieldCount(usize),
    /// The id field is invalid.
    BadId(ParseIdError),
    /// The category field is empty.
    MissingCategory,
}

impl fmt::Display for RestrictedLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestrictedLineError::FieldCount(n) => write!(f, "expected 2 fields, found {n}"),
            RestrictedLineError::BadId(err) => write!(f, "{err}"),
            RestrictedLineError::MissingCategory => f.write_str("category name is empty"),
        }
    }
}

impl std::error::Error for RestrictedLineError {}

/// Parse one `<id>:<category>` line.
pub fn parse_restricted_line(line: &str) -> Result<(EnumId, &str), RestrictedLineError> {
    let fields: Vec<&str> = line.split(':').collect();
    let &[id, category] = fields.as_slice() else {
        return Err(RestrictedLineError::FieldCount(fields.len()));
    };
    let id = id.parse::<EnumId>().map_err(RestrictedLineError::BadId)?;
    let category = category.trim();
    if category.is_empty() {
        return Err(RestrictedLineError::MissingCategory);
    }
    Ok((id, category))
}

/// Loads restricted id files once and answers per-category queries.
#[derive(Debug)]
pub struct BannedIdRegistry {
    dir: PathBuf,
    loaded: Option<BTreeMap<String, Vec<EnumId>>>,
}

impl BannedIdRegistry {
    /// Registry reading from `dir`. Nothing is read until the first query.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            loaded: None,
        }
    }

    /// Directory scanned for restricted id files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the directory has been scanned.
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Banned ids for `category`: the ids listed in files plus every id in
    /// `additional_known_ids`.
    ///
    /// The directory is scanned on the first call only.
    pub fn banned_ids_for(&mut self, category: &str, additional_known_ids: &[&[EnumId]]) -> BannedIdSet {
        let dir = &self.dir;
        let loaded = self.loaded.get_or_insert_with(|| load_restricted_dir(dir));
        let from_files = loaded.get(category).map(Vec::as_slice).unwrap_or(&[]);
        from_files
            .iter()
            .copied()
            .chain(additional_known_ids.iter().flat_map(|ids| ids.iter().copied()))
            .collect()
    }
}

fn load_restricted_dir(dir: &Path) -> BTreeMap<String, Vec<EnumId>> {
    let mut by_category: BTreeMap<String, Vec<EnumId>> = BTreeMap::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            create_restricted_dir(dir);
            return by_category;
        }
        Err(err) => {
            error!("Failed to scan restricted ids dir {}: {err}", dir.display());
            return by_category;
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for path in files {
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                error!("Failed to read restricted ids file {}: {err}", path.display());
                continue;
            }
        };

        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_restricted_line(line) {
                Ok((id, category)) => by_category.entry(category.to_string()).or_default().push(id),
                Err(err) => warn!(
                    "Badly formatted restricted id entry ({err}). File: '{}' Line: '{line}'. This entry has been skipped",
                    path.display()
                ),
            }
        }
    }

    for (category, ids) in &by_category {
        info!("{} restricted IDs were registered for {category}", ids.len());
    }

    by_category
}

fn create_restricted_dir(dir: &Path) {
    match fs::create_dir_all(dir) {
        Ok(()) => debug!("Restricted ids dir {} was not found. Folder created", dir.display()),
        Err(err) => error!(
            "Restricted ids dir {} was not found and could not be created: {err}",
            dir.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ids(raw: &[u32]) -> Vec<EnumId> {
        raw.iter().copied().map(EnumId).collect()
    }

    #[test]
    fn parses_whitespace_tolerant_lines() {
        assert_eq!(
            parse_restricted_line("  11110 :  TechType "),
            Ok((EnumId(11110), "TechType"))
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            parse_restricted_line("abc:TechType"),
            Err(RestrictedLineError::BadId(ParseIdError::NotNumeric))
        );
        assert_eq!(
            parse_restricted_line("-4:TechType"),
            Err(RestrictedLineError::BadId(ParseIdError::Negative))
        );
        assert_eq!(
            parse_restricted_line("12:"),
            Err(RestrictedLineError::MissingCategory)
        );
        assert_eq!(
            parse_restricted_line("12:TechType:extra"),
            Err(RestrictedLineError::FieldCount(3))
        );
        assert_eq!(
            parse_restricted_line("12"),
            Err(RestrictedLineError::FieldCount(1))
        );
    }

    #[test]
    fn merges_files_and_known_ids() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("ModA.txt"),
            "11110:TechType\nabc:TechType\n\n  12000 : TechType\n5:EquipmentType\n",
        )
        .unwrap();
        fs::write(dir.path().join("ModB.txt"), "11111:TechType\n").unwrap();

        let mut registry = BannedIdRegistry::new(dir.path());
        let known = ids(&[11110, 11500]);
        let banned = registry.banned_ids_for("TechType", &[known.as_slice()]);

        assert_eq!(
            banned.iter().collect::<Vec<_>>(),
            ids(&[11110, 11111, 11500, 12000])
        );
        assert_eq!(banned.largest(), Some(EnumId(12000)));

        let equipment = registry.banned_ids_for("EquipmentType", &[]);
        assert_eq!(equipment.iter().collect::<Vec<_>>(), ids(&[5]));
    }

    #[test]
    fn repeated_queries_are_deterministic() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ModA.txt"), "20:PingType\n").unwrap();
        let mut registry = BannedIdRegistry::new(dir.path());
        let known = ids(&[21]);

        let first = registry.banned_ids_for("PingType", &[known.as_slice()]);
        let second = registry.banned_ids_for("PingType", &[known.as_slice()]);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn files_are_read_only_once() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ModA.txt"), "20:PingType\n").unwrap();
        let mut registry = BannedIdRegistry::new(dir.path());
        assert!(registry.banned_ids_for("PingType", &[]).contains(EnumId(20)));

        fs::write(dir.path().join("ModB.txt"), "30:PingType\n").unwrap();
        assert!(!registry.banned_ids_for("PingType", &[]).contains(EnumId(30)));
    }

    #[test]
    fn missing_dir_is_created_and_empty() {
        let root = tempdir().unwrap();
        let dir = root.path().join("config").join("RestrictedIDs");
        let mut registry = BannedIdRegistry::new(&dir);

        assert!(registry.banned_ids_for("TechType", &[]).is_empty());
        assert!(dir.is_dir());
        assert!(registry.is_loaded());
    }
}
