//! Core type definitions for Plantão.
//!
//! This crate defines the I/O-free domain types shared by the store, the
//! census ingestion pipeline and the sync layer:
//! - One typed record per table (attendance, catalogs, surgeries) plus its
//!   natural-key tuple
//! - The table registry ([`TableKind`]) with each table's reconciliation
//!   policy, so policy dispatch is exhaustive at compile time
//! - Date helpers tolerant of the two spellings that coexist in stored data
//!   (`dd/MM/yyyy` and ISO `YYYY-MM-DD`)
//!
//! Anything that touches SQLite, the network or the filesystem belongs in
//! the other crates, not here.

mod atendimento;
mod catalogo;
mod cirurgia;
pub mod datas;
mod tabela;

pub use atendimento::{AtendimentoKey, AtendimentoRow};
pub use catalogo::{CatalogoItem, CatalogoKind};
pub use cirurgia::{Cirurgia, CirurgiaKey};
pub use tabela::{MergePolicy, TableKind};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type-level operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A record is missing the minimum fields that make up its natural key.
    #[error("incomplete natural key: {0}")]
    IncompleteKey(String),

    /// A date string matched neither accepted spelling.
    #[error("unparseable date: {0:?}")]
    InvalidDate(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
