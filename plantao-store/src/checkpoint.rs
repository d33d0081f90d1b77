//! WAL checkpointing ahead of raw-byte transmission.

use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Folds any write-ahead log into the main store file and truncates it, so
/// a subsequent raw read of the file reflects every committed write.
///
/// Precondition: the caller holds no open [`Store`](crate::Store) handle on
/// this path. The function uses its own short-lived connection and releases
/// it before returning, so no process-wide handle survives the call.
///
/// `wal_checkpoint(TRUNCATE)` is the required step: an error, or a busy
/// result because a concurrent reader pinned the WAL, means the file is not
/// safe to transmit and propagates as [`StoreError::Checkpoint`].
/// `PRAGMA optimize` afterwards is advisory; its failure is logged and
/// ignored.
///
/// Idempotent: a second call finds an empty WAL and is a no-op.
pub fn checkpoint(path: impl AsRef<Path>) -> StoreResult<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }

    let conn = Connection::open(path)?;

    // Returns (busy, wal pages, pages moved back). busy != 0 means the
    // truncation could not complete.
    let (busy, wal_pages, moved): (i64, i64, i64) = conn.query_row(
        "PRAGMA wal_checkpoint(TRUNCATE)",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    if busy != 0 {
        return Err(StoreError::Checkpoint(
            "wal_checkpoint(TRUNCATE) was blocked by a concurrent reader".to_string(),
        ));
    }
    debug!(wal_pages, moved, path = %path.display(), "WAL folded into main file");

    if let Err(e) = conn.execute_batch("PRAGMA optimize") {
        warn!("PRAGMA optimize failed (ignored): {e}");
    }

    Ok(())
}
