//! Error types for the store layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store file does not exist where an operation requires it to.
    #[error("store file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The WAL could not be folded into the main file; the file is not safe
    /// to transmit.
    #[error("checkpoint failed: {0}")]
    Checkpoint(String),

    /// Reconciliation failed; the partially built output was discarded.
    #[error("merge failed in {table}: {detail}")]
    MergeFailed { table: String, detail: String },

    /// A record failed domain validation before reaching SQL.
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] plantao_types::Error),
}
