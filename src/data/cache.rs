use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Deserialize;

use super::loader::load_file;
use super::model::SalesTable;
use crate::config::ColumnNames;
use crate::errors::{DataError, Result};

/// How long a loaded table stays memoised.
///
/// `Forever` never invalidates: a file edited on disk is not picked up until
/// the store is dropped or [`DatasetStore::clear`] is called.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CachePolicy {
    /// Always re-read the file.
    Disabled,
    /// Keep the first successful parse for the lifetime of the store.
    #[default]
    Forever,
    /// Re-read once an entry is older than `seconds`.
    Ttl { seconds: u64 },
}

impl CachePolicy {
    fn is_fresh(&self, loaded_at: Instant) -> bool {
        match self {
            CachePolicy::Disabled => false,
            CachePolicy::Forever => true,
            CachePolicy::Ttl { seconds } => loaded_at.elapsed() < Duration::from_secs(*seconds),
        }
    }
}

struct CachedTable {
    table: Arc<SalesTable>,
    loaded_at: Instant,
}

/// Path-keyed memo of parsed tables, shared read-only with callers.
///
/// Keys are the paths exactly as given; two spellings of the same file are
/// cached separately. Failed loads are never cached.
pub struct DatasetStore {
    columns: ColumnNames,
    policy: CachePolicy,
    entries: RwLock<HashMap<PathBuf, CachedTable>>,
}

impl DatasetStore {
    pub fn new(columns: ColumnNames, policy: CachePolicy) -> Self {
        Self {
            columns,
            policy,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Load `path`, serving it from the memo when the policy allows.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<SalesTable>> {
        let path = path.as_ref();

        if let Some(table) = self.lookup(path) {
            log::info!("Cache hit for {}", path.display());
            return Ok(table);
        }

        log::info!("Cache miss for {}, parsing", path.display());
        let parsed = load_file(path, &self.columns).map_err(|e| DataError::unavailable(path, &e))?;
        let table = Arc::new(parsed);

        if self.policy == CachePolicy::Disabled {
            return Ok(table);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .entry(path.to_path_buf())
            .and_modify(|cached| {
                if !self.policy.is_fresh(cached.loaded_at) {
                    cached.table = Arc::clone(&table);
                    cached.loaded_at = Instant::now();
                }
            })
            .or_insert_with(|| CachedTable {
                table: Arc::clone(&table),
                loaded_at: Instant::now(),
            });
        Ok(Arc::clone(&entry.table))
    }

    fn lookup(&self, path: &Path) -> Option<Arc<SalesTable>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(path)
            .filter(|cached| self.policy.is_fresh(cached.loaded_at))
            .map(|cached| Arc::clone(&cached.table))
    }

    /// Number of memoised tables.
    pub fn cached_len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every memoised table.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn forever_returns_the_same_table_without_rereading() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("df.csv");
        write(&path, "genre_desc,price\nRomance,10\n");

        let store = DatasetStore::new(ColumnNames::default(), CachePolicy::Forever);
        let first = store.load(&path).unwrap();

        write(&path, "genre_desc,price\nRomance,10\nMystery,12\n");
        let second = store.load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
        assert_eq!(store.cached_len(), 1);

        store.clear();
        assert_eq!(store.load(&path).unwrap().len(), 2);
    }

    #[test]
    fn disabled_always_rereads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("df.csv");
        write(&path, "genre_desc,price\nRomance,10\n");

        let store = DatasetStore::new(ColumnNames::default(), CachePolicy::Disabled);
        assert_eq!(store.load(&path).unwrap().len(), 1);
        write(&path, "genre_desc,price\nRomance,10\nMystery,12\n");
        assert_eq!(store.load(&path).unwrap().len(), 2);
        assert_eq!(store.cached_len(), 0);
    }

    #[test]
    fn expired_ttl_rereads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("df.csv");
        write(&path, "genre_desc,price\nRomance,10\n");

        let store = DatasetStore::new(ColumnNames::default(), CachePolicy::Ttl { seconds: 0 });
        let first = store.load(&path).unwrap();
        write(&path, "genre_desc,price\nRomance,10\nMystery,12\n");
        let second = store.load(&path).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 2);
        assert_eq!(store.cached_len(), 1);
    }

    #[test]
    fn missing_file_is_unavailable_and_not_cached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does_not_exist.csv");
        let store = DatasetStore::new(ColumnNames::default(), CachePolicy::Forever);

        let err = store.load(&path).unwrap_err();
        assert!(matches!(
            err,
            DataError::DataUnavailable { ref path, .. } if path.ends_with("does_not_exist.csv")
        ));
        assert_eq!(store.cached_len(), 0);

        write(&path, "genre_desc,price\nRomance,10\n");
        assert_eq!(store.load(&path).unwrap().len(), 1);
    }

    #[test]
    fn store_is_shareable_across_threads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("df.csv");
        write(&path, "genre_desc,price\nRomance,10\nMystery,12\n");

        let store = Arc::new(DatasetStore::new(ColumnNames::default(), CachePolicy::Forever));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let path = path.clone();
                std::thread::spawn(move || store.load(&path).unwrap().len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
        assert_eq!(store.cached_len(), 1);
    }
}
