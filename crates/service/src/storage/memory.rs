use std::collections::BTreeMap;
use std::sync::RwLock;

use super::backend::{check_quota, KeyValueBackend};
use crate::errors::StorageError;

/// In-process backend. Contents live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit total stored bytes (keys plus values).
    pub fn with_quota(quota: usize) -> Self {
        Self { inner: RwLock::default(), quota: Some(quota) }
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::unavailable("memory store lock poisoned")
}

impl KeyValueBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        check_quota(&map, key, value, self.quota)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        map.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        map.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.keys().cloned().collect())
    }
}
