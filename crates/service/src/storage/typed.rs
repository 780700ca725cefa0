//! Typed, fail-soft access to a [`KeyValueBackend`].
//!
//! Values are stored as JSON text. The plain operations (`get`, `set`,
//! `remove`, `clear`) never fail: reads fall back to the caller's default and
//! write failures are logged and dropped. Callers that need to tell the cases
//! apart use [`Storage::lookup`] and the `try_*` methods.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{trace, warn};

use super::backend::KeyValueBackend;
use super::memory::MemoryBackend;
use crate::errors::StorageError;

/// Outcome of reading one key.
#[derive(Debug)]
pub enum Lookup<T> {
    /// No entry, or an empty one.
    Absent,
    /// Entry exists but does not deserialize into `T`.
    Corrupt(serde_json::Error),
    /// The backend failed to answer.
    Unavailable(StorageError),
    Present(T),
}

impl<T> Lookup<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Lookup::Present(_))
    }

    /// The stored value, or `default` for every other outcome.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Lookup::Present(value) => value,
            _ => default,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Present(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueBackend>,
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    pub fn lookup<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return Lookup::Absent,
            Err(e) => return Lookup::Unavailable(e),
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Lookup::Present(value),
            Err(e) => Lookup::Corrupt(e),
        }
    }

    /// Read `key`, returning `default` when it is absent, corrupt, or the
    /// backend is unavailable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.lookup(key) {
            Lookup::Present(value) => value,
            Lookup::Absent => {
                trace!(key, "storage miss; using default");
                default
            }
            Lookup::Corrupt(e) => {
                warn!(key, error = %e, event = "corrupt_entry", "stored value does not match expected shape; using default");
                default
            }
            Lookup::Unavailable(e) => {
                warn!(key, error = %e, event = "read_failed", "storage read failed; using default");
                default
            }
        }
    }

    pub fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        self.backend.set_item(key, &text)
    }

    /// Serialize and store `value`; failures are logged and swallowed.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_set(key, value) {
            warn!(key, error = %e, event = "write_failed", "storage write dropped");
        }
    }

    pub fn try_remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove_item(key)
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.try_remove(key) {
            warn!(key, error = %e, event = "remove_failed", "storage remove dropped");
        }
    }

    pub fn try_clear(&self) -> Result<(), StorageError> {
        self.backend.clear()
    }

    pub fn clear(&self) {
        if let Err(e) = self.try_clear() {
            warn!(error = %e, event = "clear_failed", "storage clear dropped");
        }
    }

    /// Stored keys; empty when the backend cannot list them.
    pub fn keys(&self) -> Vec<String> {
        self.backend.keys().unwrap_or_else(|e| {
            warn!(error = %e, event = "keys_failed", "storage key listing failed");
            Vec::new()
        })
    }
}
