//! Per-day attendance records ("pacientes únicos por dia e prestador").
//!
//! One row per patient, per day, per attending prestador. This is the table
//! the census ingestion feeds and the starting point for surgery records.

use serde::{Deserialize, Serialize};

use crate::datas;

/// A normalized attendance row.
///
/// `ano`/`mes`/`dia` are denormalized from `data` so month-level queries
/// never have to parse date strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtendimentoRow {
    pub hospital: String,
    pub ano: i32,
    pub mes: i32,
    pub dia: i32,
    /// Attendance date as persisted (`dd/MM/yyyy` or `YYYY-MM-DD`).
    pub data: String,
    /// Admission number (7–10 digits where the source system provides one).
    pub atendimento: String,
    pub paciente: String,
    /// Surgery notice number, digits only.
    pub aviso: String,
    pub convenio: String,
    pub prestador: String,
    pub quarto: String,
}

impl AtendimentoRow {
    /// True when the row identifies a patient at all: at least one of
    /// `atendimento` / `paciente` must be present. Rows failing this are
    /// skipped (not errored) on upsert, mirroring how partial census lines
    /// are tolerated.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.atendimento.trim().is_empty() || !self.paciente.trim().is_empty()
    }

    /// Fills `ano`/`mes`/`dia` from `data` when it parses; leaves zeros
    /// otherwise.
    pub fn derive_date_parts(&mut self) {
        if let Some((ano, mes, dia)) = datas::split_date_parts(&self.data) {
            self.ano = ano;
            self.mes = mes;
            self.dia = dia;
        }
    }

    /// The natural-key tuple of this row.
    #[must_use]
    pub fn key(&self) -> AtendimentoKey {
        AtendimentoKey {
            hospital: self.hospital.clone(),
            atendimento: self.atendimento.clone(),
            paciente: self.paciente.clone(),
            prestador: self.prestador.clone(),
            data: self.data.clone(),
        }
    }
}

/// Natural key of the attendance table:
/// UNIQUE(Hospital, Atendimento, Paciente, Prestador, Data).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtendimentoKey {
    pub hospital: String,
    pub atendimento: String,
    pub paciente: String,
    pub prestador: String,
    pub data: String,
}
