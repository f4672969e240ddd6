//! Persisted alias table.
//!
//! Aliases map an alternate keyword to a canonical one. The table is
//! read-mostly: every resolution may consult it, while mutation happens
//! only through privileged commands. Readers take a persistent-map
//! snapshot, so a concurrent writer can never expose a half-written table.
//! Mutations are persisted to a JSON file with a write-temp-then-rename,
//! leaving the previous file intact if anything fails mid-write.

use im::HashMap as ImHashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Alias table persistence errors.
#[derive(Debug, Error)]
pub enum AliasError {
    #[error("failed to read or write alias file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse alias file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Shared alias store. Cheap to read, atomic to swap.
pub struct AliasStore {
    path: Option<PathBuf>,
    table: RwLock<ImHashMap<String, String>>,
}

impl AliasStore {
    /// An empty, non-persisted store (tests, ephemeral shells).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            table: RwLock::new(ImHashMap::new()),
        }
    }

    /// Load the store from `path`. A missing file is an empty table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AliasError> {
        let path = path.as_ref().to_path_buf();
        let table = match fs::read_to_string(&path) {
            Ok(text) => {
                let map: BTreeMap<String, String> = serde_json::from_str(&text)?;
                map.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ImHashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            table: RwLock::new(table),
        })
    }

    /// Resolve one alias. A single lookup; the one-hop rule is enforced by
    /// the resolver, not here.
    pub fn resolve(&self, keyword: &str) -> Option<String> {
        self.table.read().get(keyword).cloned()
    }

    /// Snapshot of the whole table, for listing.
    pub fn snapshot(&self) -> ImHashMap<String, String> {
        self.table.read().clone()
    }

    /// Define (or redefine) an alias. Returns the previous canonical name
    /// when the alias already existed. Persists before the new table
    /// becomes visible to readers.
    pub fn define(
        &self,
        alias: impl Into<String>,
        canonical: impl Into<String>,
    ) -> Result<Option<String>, AliasError> {
        let alias = alias.into();
        let canonical = canonical.into();
        let mut guard = self.table.write();
        let next = guard.update(alias.clone(), canonical);
        self.persist(&next)?;
        let prior = guard.get(&alias).cloned();
        *guard = next;
        Ok(prior)
    }

    /// Remove an alias. Returns the canonical name it pointed at, if any.
    pub fn undefine(&self, alias: &str) -> Result<Option<String>, AliasError> {
        let mut guard = self.table.write();
        let prior = guard.get(alias).cloned();
        if prior.is_some() {
            let next = guard.without(alias);
            self.persist(&next)?;
            *guard = next;
        }
        Ok(prior)
    }

    fn persist(&self, table: &ImHashMap<String, String>) -> Result<(), AliasError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        // Sorted on disk so diffs of the file stay readable.
        let sorted: BTreeMap<&String, &String> = table.iter().collect();
        let text = serde_json::to_string_pretty(&sorted)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_resolve_undefine() {
        let store = AliasStore::in_memory();
        assert_eq!(store.resolve("fr"), None);
        assert_eq!(store.define("fr", "freehug").unwrap(), None);
        assert_eq!(store.resolve("fr"), Some("freehug".into()));
        assert_eq!(
            store.define("fr", "hug").unwrap(),
            Some("freehug".to_string())
        );
        assert_eq!(store.undefine("fr").unwrap(), Some("hug".to_string()));
        assert_eq!(store.resolve("fr"), None);
        assert_eq!(store.undefine("fr").unwrap(), None);
    }

    #[test]
    fn missing_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = AliasStore::load(dir.path().join("aliases.json")).unwrap();
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        {
            let store = AliasStore::load(&path).unwrap();
            store.define("fr", "freehug").unwrap();
            store.define("h", "help").unwrap();
        }
        let reloaded = AliasStore::load(&path).unwrap();
        assert_eq!(reloaded.resolve("fr"), Some("freehug".into()));
        assert_eq!(reloaded.resolve("h"), Some("help".into()));
        // No stray temp file left behind.
        assert!(!path.with_extension("json.tmp").exists());
    }
}
