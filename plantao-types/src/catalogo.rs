//! Catalog tables (procedure types, surgery situations).
//!
//! Both catalogs share one shape: a unique name, an active flag and a
//! display order. [`CatalogoKind`] selects which table an operation targets
//! so the store exposes a single set of catalog methods.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which catalog table an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogoKind {
    /// `procedimento_tipos`
    ProcedimentoTipos,
    /// `cirurgia_situacoes`
    CirurgiaSituacoes,
}

impl CatalogoKind {
    /// The SQL table name for this catalog.
    #[must_use]
    pub const fn table_name(&self) -> &'static str {
        match self {
            Self::ProcedimentoTipos => "procedimento_tipos",
            Self::CirurgiaSituacoes => "cirurgia_situacoes",
        }
    }
}

impl fmt::Display for CatalogoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogoItem {
    pub id: i64,
    /// Natural key: UNIQUE(nome).
    pub nome: String,
    pub ativo: bool,
    pub ordem: i64,
}
