//! Storage abstractions for the service layer
//!
//! `KeyValueBackend` is the boundary to a synchronous string-keyed text store.
//! `Storage` layers JSON (de)serialization and fail-soft defaults on top.

pub mod backend;
pub mod json_file;
pub mod memory;
pub mod typed;

pub use backend::KeyValueBackend;
pub use json_file::JsonFileBackend;
pub use memory::MemoryBackend;
pub use typed::{Lookup, Storage};
