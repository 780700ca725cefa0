use std::collections::BTreeMap;

use crate::errors::StorageError;

/// Synchronous string-keyed text store.
/// Implementations can be in-memory, file-backed, or a host-provided store.
pub trait KeyValueBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
    /// All keys currently stored, sorted.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Bytes a map occupies, counted as key plus value lengths.
pub(crate) fn usage(map: &BTreeMap<String, String>) -> usize {
    map.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// Reject a write of `value` under `key` that would push `map` past `quota`.
pub(crate) fn check_quota(
    map: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    quota: Option<usize>,
) -> Result<(), StorageError> {
    let Some(quota) = quota else { return Ok(()) };
    let replaced = map.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
    let needed = usage(map) - replaced + key.len() + value.len();
    if needed > quota {
        return Err(StorageError::QuotaExceeded { needed, quota });
    }
    Ok(())
}
