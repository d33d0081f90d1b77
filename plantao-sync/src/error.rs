//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Expected protocol outcomes (conflict, host-side rejection, remote not
/// found) are not errors; they are carried in [`Publish`](crate::Publish)
/// and [`SyncReport`](crate::SyncReport) values. An `Err` here means the
/// operation itself could not run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or protocol failure talking to the blob host. Retryable by
    /// the caller, never automatically.
    #[error("transport error: {0}")]
    Transport(String),

    /// Local store failure (checkpoint, reconcile, open).
    #[error("store error: {0}")]
    Store(#[from] plantao_store::StoreError),

    /// Local file system failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
