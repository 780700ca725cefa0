//! Environment/runtime helpers
//!
//! Sanity checks to ensure the storage directory exists at startup.

use std::path::Path;

use tracing::{debug, warn};

/// Ensure the parent directory of a file-backed store exists.
/// Returns an error only when the directory is missing and cannot be created.
pub fn ensure_parent_dir(file_path: &Path) -> anyhow::Result<()> {
    let Some(parent) = file_path.parent() else { return Ok(()) };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    warn!(dir = %parent.display(), "storage directory not found; creating it");
    std::fs::create_dir_all(parent)
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    debug!(dir = %parent.display(), "storage directory created");
    Ok(())
}
