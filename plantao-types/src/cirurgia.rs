//! Surgery records.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A surgery record.
///
/// `id` is the storage-assigned rowid and is replica-local: it never takes
/// part in reconciliation, which works on the natural key only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cirurgia {
    pub id: Option<i64>,
    pub hospital: String,
    pub atendimento: String,
    pub paciente: String,
    pub prestador: String,
    pub data_cirurgia: String,
    pub convenio: String,
    pub procedimento_tipo_id: Option<i64>,
    pub situacao_id: Option<i64>,
    pub guia_amhptiss: String,
    pub guia_amhptiss_complemento: String,
    pub fatura: String,
    pub observacoes: String,
    /// Set once on first insert, preserved across updates and merges.
    pub created_at: String,
    /// Last-write-wins ordering key (ISO-8601, second precision).
    pub updated_at: String,
}

impl Cirurgia {
    /// Validates the minimum key: hospital, prestador and date are required,
    /// plus at least one of atendimento / paciente.
    pub fn validate_key(&self) -> Result<()> {
        let atendimento = self.atendimento.trim();
        let paciente = self.paciente.trim();
        if self.hospital.trim().is_empty()
            || self.prestador.trim().is_empty()
            || self.data_cirurgia.trim().is_empty()
            || (atendimento.is_empty() && paciente.is_empty())
        {
            return Err(Error::IncompleteKey(
                "cirurgia requires hospital, prestador, data and atendimento or paciente"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// The natural-key tuple of this record.
    #[must_use]
    pub fn key(&self) -> CirurgiaKey {
        CirurgiaKey {
            hospital: self.hospital.clone(),
            atendimento: self.atendimento.clone(),
            paciente: self.paciente.clone(),
            prestador: self.prestador.clone(),
            data_cirurgia: self.data_cirurgia.clone(),
        }
    }
}

/// Natural key of the surgery table:
/// UNIQUE(Hospital, Atendimento, Paciente, Prestador, Data_Cirurgia).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CirurgiaKey {
    pub hospital: String,
    pub atendimento: String,
    pub paciente: String,
    pub prestador: String,
    pub data_cirurgia: String,
}
