use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use super::backend::{check_quota, KeyValueBackend};
use crate::errors::StorageError;

/// JSON file-backed text store.
///
/// Keeps the whole map in memory and rewrites the file on every mutation.
/// Intended for small amounts of client state where a database is overkill.
#[derive(Debug)]
pub struct JsonFileBackend {
    inner: RwLock<BTreeMap<String, String>>,
    file_path: PathBuf,
    quota: Option<usize>,
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::unavailable("file store lock poisoned")
}

impl JsonFileBackend {
    /// Open the store at `path`, creating the file (and parent directory) with
    /// an empty map if missing. A malformed file is renamed to `<path>.corrupt`
    /// and the store opens empty.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        Self::open_with_quota(path, None)
    }

    pub fn open_with_quota<P: Into<PathBuf>>(path: P, quota: Option<usize>) -> Result<Self, StorageError> {
        let file_path = path.into();
        common::env::ensure_parent_dir(&file_path).map_err(StorageError::unavailable)?;

        let map = match std::fs::read(&file_path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    let moved_to = quarantine(&file_path)?;
                    warn!(
                        path = %file_path.display(),
                        moved_to = %moved_to.display(),
                        error = %e,
                        "store file is not a JSON string map; kept it aside and starting empty"
                    );
                    let empty = BTreeMap::new();
                    write_map(&file_path, &empty)?;
                    empty
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let empty = BTreeMap::new();
                write_map(&file_path, &empty)?;
                debug!(path = %file_path.display(), "created empty store file");
                empty
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { inner: RwLock::new(map), file_path, quota })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Apply a mutation to a copy of the map, persist it, then publish it.
    /// On any error the in-memory state and the file stay unchanged.
    fn update_map<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> Result<(), StorageError>,
    {
        let mut map = self.inner.write().map_err(poisoned)?;
        let mut next = map.clone();
        f(&mut next)?;
        write_map(&self.file_path, &next)?;
        *map = next;
        Ok(())
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Move an unreadable store file to `<path>.corrupt`, replacing any earlier one.
fn quarantine(path: &Path) -> Result<PathBuf, StorageError> {
    let target = sibling(path, ".corrupt");
    std::fs::rename(path, &target)?;
    Ok(target)
}

/// Write through a sibling temp file and rename, so readers never see a
/// half-written store.
fn write_map(path: &Path, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let data = serde_json::to_vec(map)?;
    let tmp = sibling(path, ".tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl KeyValueBackend for JsonFileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let quota = self.quota;
        self.update_map(|m| {
            check_quota(m, key, value, quota)?;
            m.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        {
            let map = self.inner.read().map_err(poisoned)?;
            if !map.contains_key(key) {
                return Ok(());
            }
        }
        self.update_map(|m| {
            m.remove(key);
            Ok(())
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.update_map(|m| {
            m.clear();
            Ok(())
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("json_file_backend_{tag}_{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn json_file_backend_crud_persists() -> Result<(), anyhow::Error> {
        let tmp = temp_store_path("crud");
        let store = JsonFileBackend::open(&tmp)?;
        assert!(tmp.exists());

        // initially empty
        assert!(store.keys()?.is_empty());

        store.set_item("a", "1")?;
        store.set_item("b", "2")?;
        store.set_item("a", "10")?;
        assert_eq!(store.get_item("a")?.as_deref(), Some("10"));

        store.remove_item("b")?;
        let reloaded = JsonFileBackend::open(&tmp)?;
        assert_eq!(reloaded.keys()?, vec!["a".to_string()]);
        assert_eq!(reloaded.get_item("a")?.as_deref(), Some("10"));

        reloaded.clear()?;
        let reloaded = JsonFileBackend::open(&tmp)?;
        assert!(reloaded.keys()?.is_empty());

        let _ = std::fs::remove_file(&tmp);
        Ok(())
    }

    #[test]
    fn malformed_file_is_set_aside_and_opens_empty() -> Result<(), anyhow::Error> {
        let tmp = temp_store_path("malformed");
        std::fs::write(&tmp, b"{ not json")?;
        let store = JsonFileBackend::open(&tmp)?;
        assert!(store.keys()?.is_empty());

        let corrupt = sibling(&tmp, ".corrupt");
        assert_eq!(std::fs::read(&corrupt)?, b"{ not json");
        assert_eq!(std::fs::read(&tmp)?, b"{}");

        store.set_item("k", "v")?;
        let reloaded = JsonFileBackend::open(&tmp)?;
        assert_eq!(reloaded.get_item("k")?.as_deref(), Some("v"));
        // the set-aside copy survives later writes
        assert_eq!(std::fs::read(&corrupt)?, b"{ not json");

        let _ = std::fs::remove_file(&tmp);
        let _ = std::fs::remove_file(&corrupt);
        Ok(())
    }

    #[test]
    fn creates_missing_parent_directory() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("json_file_backend_dir_{}", uuid::Uuid::new_v4()));
        let tmp = dir.join("nested").join("store.json");
        let store = JsonFileBackend::open(&tmp)?;
        assert_eq!(store.path(), tmp.as_path());
        assert!(tmp.exists());
        let _ = std::fs::remove_dir_all(&dir);
        Ok(())
    }

    #[test]
    fn quota_failure_leaves_file_untouched() -> Result<(), anyhow::Error> {
        let tmp = temp_store_path("quota");
        let store = JsonFileBackend::open_with_quota(&tmp, Some(16))?;
        store.set_item("k", "small")?;
        assert!(matches!(
            store.set_item("big", "0123456789abcdef"),
            Err(StorageError::QuotaExceeded { .. })
        ));

        let reloaded = JsonFileBackend::open(&tmp)?;
        assert_eq!(reloaded.keys()?, vec!["k".to_string()]);
        let _ = std::fs::remove_file(&tmp);
        Ok(())
    }

    #[test]
    fn unwritable_location_is_an_error() {
        let dir = std::env::temp_dir().join(format!("json_file_backend_blocker_{}", uuid::Uuid::new_v4()));
        std::fs::write(&dir, b"a file, not a directory").expect("create blocker file");
        let result = JsonFileBackend::open(dir.join("store.json"));
        assert!(result.is_err());
        let _ = std::fs::remove_file(&dir);
    }
}
