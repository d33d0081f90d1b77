//! Table registry and reconciliation policies.
//!
//! [`TableKind`] enumerates every table that takes part in replica
//! reconciliation. The reconciliation engine matches on it exhaustively, so
//! adding a table without choosing a [`MergePolicy`] fails to compile.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-table rule for resolving two rows that share a natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// On key collision the listed fields take the incoming row's values;
    /// every other field keeps the existing row's values.
    FieldOverwrite {
        /// Columns replaced from the incoming side.
        fields: &'static [&'static str],
    },
    /// On key collision the row with the newer `updated` timestamp fully
    /// replaces the older one. The `created` field keeps whichever side is
    /// non-empty, preferring the existing row. Empty/NULL timestamps compare
    /// as oldest; an exact tie keeps the existing row.
    LastWriteWins {
        /// Timestamp column ordering the two rows.
        updated: &'static str,
        /// Creation column resolved by first-non-empty.
        created: &'static str,
    },
}

/// Every reconciled table, in no particular order (see [`TableKind::MERGE_ORDER`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Atendimentos,
    ProcedimentoTipos,
    CirurgiaSituacoes,
    Cirurgias,
}

impl TableKind {
    /// The fixed order reconciliation applies tables in: the attendance base
    /// first, then catalogs (surgery rows reference catalog ids), then the
    /// surgery table.
    pub const MERGE_ORDER: [TableKind; 4] = [
        TableKind::Atendimentos,
        TableKind::ProcedimentoTipos,
        TableKind::CirurgiaSituacoes,
        TableKind::Cirurgias,
    ];

    /// The SQL table name.
    #[must_use]
    pub const fn table_name(&self) -> &'static str {
        match self {
            Self::Atendimentos => "pacientes_unicos_por_dia_prestador",
            Self::ProcedimentoTipos => "procedimento_tipos",
            Self::CirurgiaSituacoes => "cirurgia_situacoes",
            Self::Cirurgias => "cirurgias",
        }
    }

    /// Columns forming the natural key (the table's unique constraint).
    #[must_use]
    pub const fn key_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Atendimentos => &["Hospital", "Atendimento", "Paciente", "Prestador", "Data"],
            Self::ProcedimentoTipos | Self::CirurgiaSituacoes => &["nome"],
            Self::Cirurgias => &[
                "Hospital",
                "Atendimento",
                "Paciente",
                "Prestador",
                "Data_Cirurgia",
            ],
        }
    }

    /// Columns carried across replicas. Excludes storage-assigned `id`
    /// columns, which are replica-local.
    #[must_use]
    pub const fn payload_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Atendimentos => &[
                "Hospital",
                "Ano",
                "Mes",
                "Dia",
                "Data",
                "Atendimento",
                "Paciente",
                "Aviso",
                "Convenio",
                "Prestador",
                "Quarto",
            ],
            Self::ProcedimentoTipos | Self::CirurgiaSituacoes => &["nome", "ativo", "ordem"],
            Self::Cirurgias => &[
                "Hospital",
                "Atendimento",
                "Paciente",
                "Prestador",
                "Data_Cirurgia",
                "Convenio",
                "Procedimento_Tipo_ID",
                "Situacao_ID",
                "Guia_AMHPTISS",
                "Guia_AMHPTISS_Complemento",
                "Fatura",
                "Observacoes",
                "created_at",
                "updated_at",
            ],
        }
    }

    /// The reconciliation policy of this table.
    #[must_use]
    pub const fn policy(&self) -> MergePolicy {
        match self {
            Self::Atendimentos => MergePolicy::FieldOverwrite {
                fields: &["Aviso", "Convenio", "Quarto"],
            },
            Self::ProcedimentoTipos | Self::CirurgiaSituacoes => MergePolicy::FieldOverwrite {
                fields: &["ativo", "ordem"],
            },
            Self::Cirurgias => MergePolicy::LastWriteWins {
                updated: "updated_at",
                created: "created_at",
            },
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}
