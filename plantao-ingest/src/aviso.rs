//! Aviso (surgery notice number) normalization and conflict resolution.
//!
//! The same admission can appear on several report lines with diverging
//! Aviso values (typos, stale reprints). All lines of one
//! (Data, Atendimento) group receive a single winning value chosen by an
//! [`AvisoTieBreak`] policy.

/// Keeps only the first digit run of an Aviso value: `"AV 1234-B"` → `"1234"`.
/// Returns `None` when no digits are present.
#[must_use]
pub fn normalize_aviso(raw: &str) -> Option<String> {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    (!digits.is_empty()).then_some(digits)
}

/// Policy choosing the winning Aviso among a group's candidates.
///
/// The default, [`MostFrequentLongestFirst`], reproduces the historical
/// behavior. No business rationale was ever recorded for that ordering, so
/// it is injectable rather than baked in; callers with a confirmed rule can
/// supply their own.
pub trait AvisoTieBreak {
    /// Picks a winner from the group's normalized candidates, given in
    /// original report order (duplicates included). `candidates` may be
    /// empty.
    fn pick(&self, candidates: &[String]) -> Option<String>;
}

/// Most frequent value wins; ties go to the longest value, then to the one
/// seen first in the report.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostFrequentLongestFirst;

impl AvisoTieBreak for MostFrequentLongestFirst {
    fn pick(&self, candidates: &[String]) -> Option<String> {
        // (value, count, first-seen index), one entry per distinct value.
        let mut tally: Vec<(&String, usize, usize)> = Vec::new();
        for (idx, value) in candidates.iter().enumerate() {
            match tally.iter_mut().find(|(v, _, _)| *v == value) {
                Some((_, count, _)) => *count += 1,
                None => tally.push((value, 1, idx)),
            }
        }
        tally
            .into_iter()
            .max_by(|a, b| {
                a.1.cmp(&b.1)
                    .then(a.0.len().cmp(&b.0.len()))
                    .then(b.2.cmp(&a.2))
            })
            .map(|(value, _, _)| value.clone())
    }
}
