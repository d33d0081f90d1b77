//! Block-context inheritance for continuation rows.
//!
//! A surgical block opens with a principal line carrying the admission data
//! (Atendimento/Paciente/Aviso) and may be followed by continuation lines
//! naming other prestadores of the same case. Those lines carry no admission
//! data of their own and inherit the block's.

use std::collections::{HashMap, HashSet};

use crate::parser::RawCaso;

fn has_native_data(row: &RawCaso) -> bool {
    row.atendimento.is_some() || row.paciente.is_some() || row.aviso.is_some()
}

fn prestador_norm(row: &RawCaso) -> String {
    row.prestador
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_uppercase()
}

/// Copies Atendimento/Paciente/Aviso into continuation rows, per date, in
/// the original report order.
///
/// Rules:
/// - Dates are forward- then backward-filled first, so a block split around
///   a date banner stays together.
/// - A row with any native admission data starts (or continues) a block; a
///   change of Atendimento or Aviso starts a new block.
/// - Within a block each prestador inherits at most once, so a surgeon
///   listed twice does not produce two inherited rows.
pub fn inherit_block_context(rows: &mut [RawCaso]) {
    // Forward fill, then backward fill, of the date column.
    let mut last: Option<String> = None;
    for row in rows.iter_mut() {
        match &row.data {
            Some(d) => last = Some(d.clone()),
            None => row.data = last.clone(),
        }
    }
    let mut next: Option<String> = None;
    for row in rows.iter_mut().rev() {
        match &row.data {
            Some(d) => next = Some(d.clone()),
            None => row.data = next.clone(),
        }
    }

    // Group indices by date, keeping first-appearance order of dates and
    // report order within each date.
    let mut date_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(data) = row.data.clone() else {
            continue;
        };
        if let Some(group) = groups.get_mut(&data) {
            group.push(idx);
        } else {
            date_order.push(data.clone());
            groups.insert(data, vec![idx]);
        }
    }

    for data in date_order {
        let Some(indices) = groups.get(&data) else {
            continue;
        };
        let mut last_atendimento: Option<String> = None;
        let mut last_paciente: Option<String> = None;
        let mut last_aviso: Option<String> = None;
        let mut prestadores_no_bloco: HashSet<String> = HashSet::new();

        for &i in indices {
            let prestador = prestador_norm(&rows[i]);

            if has_native_data(&rows[i]) {
                if rows[i].atendimento != last_atendimento || rows[i].aviso != last_aviso {
                    prestadores_no_bloco.clear();
                }
                last_atendimento = rows[i].atendimento.clone();
                last_paciente = rows[i].paciente.clone();
                last_aviso = rows[i].aviso.clone();
                if !prestador.is_empty() {
                    prestadores_no_bloco.insert(prestador);
                }
            } else if !prestador.is_empty() && !prestadores_no_bloco.contains(&prestador) {
                rows[i].atendimento = last_atendimento.clone();
                rows[i].paciente = last_paciente.clone();
                rows[i].aviso = last_aviso.clone();
                prestadores_no_bloco.insert(prestador);
            }
        }
    }
}
