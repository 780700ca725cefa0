//! Service layer: the singleton service registry and the typed key-value store.
//! - `registry` keeps one shared instance per (service type, name).
//! - `storage` wraps a synchronous text store with JSON (de)serialization and
//!   fail-soft defaults.
//! - `runtime` wires both together from configuration into an `AppContext`.

pub mod errors;
pub mod registry;
pub mod runtime;
pub mod storage;

pub use errors::{ServiceError, StorageError};
pub use registry::{Service, ServiceName, ServiceRegistry};
pub use runtime::AppContext;
pub use storage::{KeyValueBackend, Lookup, Storage};
