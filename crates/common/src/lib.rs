//! Shared helpers used across the workspace.
//! - Logging bootstrap for binaries.
//! - Data directory checks at startup.
//! - Small value utilities (object emptiness, id generation).

pub mod env;
pub mod utils;

pub use utils::id::{generate_id, IdGenerator, SequentialIdGenerator, UuidV4Generator};
pub use utils::object::{has_properties, is_empty};
