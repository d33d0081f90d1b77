//! Offline maintenance of a store file.

use rusqlite::Connection;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::Store;

/// Compacts the store file.
///
/// The preceding checkpoint and the trailing `PRAGMA optimize` are advisory
/// (failures logged and ignored); `VACUUM` itself is required and
/// propagates, since a failed vacuum means the compaction did not happen.
///
/// Precondition: no open handle on this path elsewhere in the process.
pub fn vacuum(path: impl AsRef<Path>) -> StoreResult<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }

    let conn = Connection::open(path)?;
    if let Err(e) = conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(())) {
        warn!("pre-vacuum checkpoint failed (ignored): {e}");
    }
    conn.execute("VACUUM", [])?;
    if let Err(e) = conn.execute_batch("PRAGMA optimize") {
        warn!("PRAGMA optimize failed (ignored): {e}");
    }
    info!(path = %path.display(), "store vacuumed");
    Ok(())
}

/// Removes the store file and re-creates an empty schema in its place.
pub fn hard_reset(path: impl AsRef<Path>) -> StoreResult<()> {
    let path = path.as_ref();
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    // Side files from WAL mode would poison the fresh store if left behind.
    for suffix in ["-wal", "-shm"] {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        let side = std::path::PathBuf::from(side);
        if side.exists() {
            let _ = std::fs::remove_file(side);
        }
    }
    Store::open(path)?.close()?;
    info!(path = %path.display(), "store reset to an empty schema");
    Ok(())
}
