//! Application context
//!
//! Builds the process-wide collaborators once at startup (service registry,
//! store, id generator) and hands them out by reference instead of through
//! globals.

use std::sync::Arc;

use common::{IdGenerator, UuidV4Generator};
use configs::{AppConfig, StorageBackend};
use tracing::info;

use crate::errors::ServiceError;
use crate::registry::ServiceRegistry;
use crate::storage::{JsonFileBackend, KeyValueBackend, MemoryBackend, Storage};

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub registry: Arc<ServiceRegistry>,
    pub storage: Storage,
    pub ids: Arc<dyn IdGenerator>,
}

impl AppContext {
    pub fn from_config(config: AppConfig) -> Result<Self, ServiceError> {
        let backend = open_backend(&config)?;
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(ServiceRegistry::new()),
            storage: Storage::new(backend),
            ids: Arc::new(UuidV4Generator),
        })
    }

    /// Context over an in-memory store with default settings.
    pub fn in_memory() -> Self {
        Self {
            config: Arc::new(AppConfig::default()),
            registry: Arc::new(ServiceRegistry::new()),
            storage: Storage::in_memory(),
            ids: Arc::new(UuidV4Generator),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn generate_id(&self) -> String {
        self.ids.generate()
    }

    /// Drop all registered services. The store is left as is.
    pub fn shutdown(&self) {
        let services = self.registry.len();
        self.registry.clear();
        info!(event = "shutdown", services, "application context released services");
    }
}

fn open_backend(config: &AppConfig) -> Result<Arc<dyn KeyValueBackend>, ServiceError> {
    let storage = &config.storage;
    storage.validate().map_err(|e| ServiceError::Config(e.to_string()))?;
    let backend: Arc<dyn KeyValueBackend> = match storage.backend {
        StorageBackend::Memory => match storage.quota_bytes {
            Some(quota) => Arc::new(MemoryBackend::with_quota(quota)),
            None => Arc::new(MemoryBackend::new()),
        },
        StorageBackend::File => Arc::new(JsonFileBackend::open_with_quota(&storage.path, storage.quota_bytes)?),
    };
    info!(
        event = "storage_ready",
        backend = ?storage.backend,
        path = %storage.path.display(),
        quota = ?storage.quota_bytes,
        "storage backend opened"
    );
    Ok(backend)
}
