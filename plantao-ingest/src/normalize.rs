//! Final normalization: prestador filtering, Aviso resolution and
//! deduplication into attendance rows.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use plantao_types::AtendimentoRow;

use crate::aviso::{AvisoTieBreak, normalize_aviso};
use crate::heranca::inherit_block_context;
use crate::parser::RawCaso;

/// Replaces Portuguese accented characters with their base letter. Enough
/// for prestador-name matching; not a general Unicode fold.
#[must_use]
pub fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

fn match_key(s: &str) -> String {
    fold_accents(s).trim().to_uppercase()
}

fn opt_str(value: &Option<String>) -> String {
    value.as_deref().unwrap_or("").trim().to_string()
}

/// Runs the full normalization pipeline over parsed report rows:
///
/// 1. inherit block context (see [`inherit_block_context`])
/// 2. keep only rows whose prestador is in `prestadores` (case- and
///    accent-insensitive); an empty list keeps every prestador
/// 3. drop rows carrying none of Atendimento / Paciente / Aviso
/// 4. resolve Avisos per (Data, Atendimento) group through `tie_break`
/// 5. stamp `hospital`, derive Ano/Mes/Dia, stable-sort by date then report
///    order, and deduplicate by (Data, Prestador, Atendimento), first in
///    wins
pub fn normalize_census(
    mut rows: Vec<RawCaso>,
    hospital: &str,
    prestadores: &[String],
    tie_break: &dyn AvisoTieBreak,
) -> Vec<AtendimentoRow> {
    inherit_block_context(&mut rows);

    let targets: HashSet<String> = prestadores
        .iter()
        .map(|p| match_key(p))
        .filter(|p| !p.is_empty())
        .collect();
    if !targets.is_empty() {
        rows.retain(|r| targets.contains(&match_key(r.prestador.as_deref().unwrap_or(""))));
    }

    rows.retain(|r| r.atendimento.is_some() || r.paciente.is_some() || r.aviso.is_some());

    // Normalize Avisos to digit runs, then give every (Data, Atendimento)
    // group a single winner.
    for row in &mut rows {
        row.aviso = row.aviso.as_deref().and_then(normalize_aviso);
    }
    let mut group_candidates: HashMap<(Option<String>, Option<String>), Vec<String>> =
        HashMap::new();
    for row in &rows {
        if let Some(aviso) = &row.aviso {
            group_candidates
                .entry((row.data.clone(), row.atendimento.clone()))
                .or_default()
                .push(aviso.clone());
        }
    }
    let winners: HashMap<_, Option<String>> = group_candidates
        .into_iter()
        .map(|(key, candidates)| (key, tie_break.pick(&candidates)))
        .collect();
    for row in &mut rows {
        if let Some(winner) = winners.get(&(row.data.clone(), row.atendimento.clone())) {
            row.aviso = winner.clone();
        }
    }

    let mut saida: Vec<(usize, AtendimentoRow)> = rows
        .iter()
        .map(|r| {
            let mut out = AtendimentoRow {
                hospital: hospital.to_string(),
                data: opt_str(&r.data),
                atendimento: opt_str(&r.atendimento),
                paciente: opt_str(&r.paciente),
                aviso: opt_str(&r.aviso),
                convenio: opt_str(&r.convenio),
                prestador: opt_str(&r.prestador),
                quarto: opt_str(&r.quarto),
                ..Default::default()
            };
            out.derive_date_parts();
            (r.row_idx, out)
        })
        .collect();

    saida.sort_by_key(|(row_idx, r)| (r.ano, r.mes, r.dia, *row_idx));

    let mut vistos: HashSet<(String, String, String)> = HashSet::new();
    let mut dedup: Vec<AtendimentoRow> = Vec::new();
    for (_, row) in saida {
        let chave = (row.data.clone(), row.prestador.clone(), row.atendimento.clone());
        if vistos.insert(chave) {
            dedup.push(row);
        }
    }

    debug!(rows = dedup.len(), "census normalized");
    dedup
}
