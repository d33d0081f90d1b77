//! Line-oriented parser for raw census report text.

use regex_lite::Regex;
use tracing::debug;

/// Section banners that open a block of cases.
const SECTION_KEYWORDS: [&str; 3] = ["CENTRO CIRURGICO", "HEMODINAMICA", "CENTRO OBSTETRICO"];

/// Words that mark a repeated column-header line.
const HEADER_PHRASES: [&str; 5] = ["Hora", "Atendimento", "Paciente", "Convênio", "Prestador"];

/// Surgical vocabulary used to tell procedure text apart from patient names.
const PROCEDURE_HINTS: [&str; 52] = [
    "HERNIA",
    "HERNIORRAFIA",
    "COLECISTECTOMIA",
    "APENDICECTOMIA",
    "ENDOMETRIOSE",
    "SINOVECTOMIA",
    "OSTEOCONDROPLASTIA",
    "ARTROPLASTIA",
    "ADENOIDECTOMIA",
    "AMIGDALECTOMIA",
    "ETMOIDECTOMIA",
    "SEPTOPLASTIA",
    "TURBINECTOMIA",
    "MIOMECTOMIA",
    "HISTEROSCOPIA",
    "HISTERECTOMIA",
    "ENXERTO",
    "TENOLISE",
    "MICRONEUROLISE",
    "URETERO",
    "NEFRECTOMIA",
    "LAPAROTOMIA",
    "LAPAROSCOPICA",
    "ROBOTICA",
    "BIOPSIA",
    "CRANIOTOMIA",
    "RETIRADA",
    "DRENAGEM",
    "FISTULECTOMIA",
    "HEMOSTA",
    "ARTRODESE",
    "OSTEOTOMIA",
    "SEPTOPLASTA",
    "CIRURGIA",
    "EXERESE",
    "RESSECCAO",
    "URETEROLITOTRIPSIA",
    "URETEROSCOPIA",
    "ENDOSCOPICA",
    "ENDOSCOPIA",
    "CATETER",
    "CERVICOTOMIA",
    "TIREOIDECTOMIA",
    "LINFADENECTOMIA",
    "RECONSTRUÇÃO",
    "RETOSSIGMOIDECTOMIA",
    "PLEUROSCOPIA",
    "CISTECTOMIA",
    "PROSTATECTOMIA",
    "VARIZES",
    "SAFENECTOMIA",
    "TORACOTOMIA",
];

/// One case line extracted from the report, before inheritance and
/// normalization. Fields are `None` when the line did not carry them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCaso {
    pub centro: Option<String>,
    pub data: Option<String>,
    pub atendimento: Option<String>,
    pub paciente: Option<String>,
    pub aviso: Option<String>,
    pub hora_inicio: Option<String>,
    pub hora_fim: Option<String>,
    pub cirurgia: Option<String>,
    pub convenio: Option<String>,
    pub prestador: Option<String>,
    pub anestesista: Option<String>,
    pub tipo_anestesia: Option<String>,
    pub quarto: Option<String>,
    /// Position in the report, used to keep the original order stable
    /// through later passes.
    pub row_idx: usize,
}

struct LineRegexes {
    time: Regex,
    date: Regex,
    has_letter: Regex,
    aviso: Regex,
    atendimento: Regex,
}

impl LineRegexes {
    fn new() -> Self {
        Self {
            time: Regex::new(r"^\d{1,2}:\d{2}$").expect("static regex"),
            date: Regex::new(r"(\d{2}/\d{2}/\d{4})").expect("static regex"),
            has_letter: Regex::new(r"[A-Za-zÁÉÍÓÚÃÕÇáéíóúãõç]").expect("static regex"),
            aviso: Regex::new(r"^\d{3,}$").expect("static regex"),
            atendimento: Regex::new(r"^\d{7,10}$").expect("static regex"),
        }
    }
}

/// True when a token reads like procedure text rather than a person's name.
fn is_probably_procedure_token(token: &str) -> bool {
    let t = token.trim().to_uppercase();
    if PROCEDURE_HINTS.iter().any(|h| t.contains(h)) {
        return true;
    }
    if [",", "/", "(", ")", "%", "  ", "-"].iter().any(|c| t.contains(c)) {
        return true;
    }
    t.chars().count() > 50
}

/// Splits one report line into trimmed tokens, honoring CSV quoting.
fn tokenize(line: &str) -> Option<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let record = reader.records().next()?.ok()?;
    Some(record.iter().map(|t| t.trim().to_string()).collect())
}

fn non_empty(token: Option<&String>) -> Option<String> {
    token.filter(|t| !t.is_empty()).cloned()
}

/// Parses raw census text into case rows, in report order.
///
/// A line carrying an `HH:MM` time is a principal case line; section lines
/// without a time but with enough fields are continuation rows for the
/// surgical block in progress (second surgeon, anesthesia changes, ...) and
/// inherit the block's start time. Repeated column headers are skipped.
pub fn parse_report(text: &str) -> Vec<RawCaso> {
    let re = LineRegexes::new();
    let mut rows: Vec<RawCaso> = Vec::new();
    let mut current_section: Option<String> = None;
    let mut current_date: Option<String> = None;
    let mut block_hora_inicio: Option<String> = None;

    for line in text.lines() {
        // The report states its date on "Data de Realização" lines only;
        // birth dates elsewhere must not clobber it.
        if line.contains("Data de Realiza") {
            if let Some(captured) = re.date.captures(line).and_then(|c| c.get(1)) {
                current_date = Some(captured.as_str().to_string());
            }
        }

        let Some(tokens) = tokenize(line) else {
            continue;
        };
        if tokens.iter().all(|t| t.is_empty()) {
            continue;
        }

        if line.contains("Centro Cirurgico") || line.contains("Centro Cirúrgico") {
            let upper = line.to_uppercase();
            current_section = SECTION_KEYWORDS
                .iter()
                .find(|kw| upper.contains(*kw))
                .map(|kw| (*kw).to_string());
            block_hora_inicio = None;
            continue;
        }

        if HEADER_PHRASES.iter().any(|h| line.contains(h)) {
            continue;
        }

        let time_idxs: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| re.time.is_match(t))
            .map(|(i, _)| i)
            .collect();

        if let Some(&h0) = time_idxs.first() {
            let h1 = (h0 + 1 < tokens.len() && re.time.is_match(&tokens[h0 + 1])).then(|| h0 + 1);
            let hora_inicio = Some(tokens[h0].clone());
            let hora_fim = h1.map(|i| tokens[i].clone());

            // Aviso: the numeric code immediately before the first time.
            let aviso = (h0 >= 1 && re.aviso.is_match(&tokens[h0 - 1]))
                .then(|| tokens[h0 - 1].clone());

            // Atendimento: the first 7-10 digit token. Paciente: the first
            // letter-bearing, non-procedure token after it, but before the
            // aviso/time block so procedure text is never mistaken for a
            // name.
            let mut atendimento = None;
            let mut paciente = None;
            if let Some(i) = tokens.iter().position(|t| re.atendimento.is_match(t)) {
                atendimento = Some(tokens[i].clone());
                let upper_bound = if h0 > 0 { h0.saturating_sub(2) } else { tokens.len() - 1 };
                for j in (i + 1)..=upper_bound.min(tokens.len() - 1) {
                    let t = &tokens[j];
                    if re.has_letter.is_match(t)
                        && !re.time.is_match(t)
                        && !is_probably_procedure_token(t)
                    {
                        paciente = Some(t.clone());
                        break;
                    }
                }
            }

            let base_idx = h1.unwrap_or(h0);
            let cirurgia = non_empty(tokens.get(base_idx + 1));
            let convenio = non_empty(tokens.get(base_idx + 2));

            // A birth date sometimes sits between convênio and prestador.
            let p_cand = tokens.get(base_idx + 3);
            let has_interleaved_date = p_cand.is_some_and(|t| re.date.is_match(t));
            let (prestador, tail_offset) = if has_interleaved_date {
                (
                    non_empty(tokens.get(base_idx + 4)).or_else(|| non_empty(p_cand)),
                    5,
                )
            } else {
                (non_empty(p_cand), 4)
            };
            let anestesista = non_empty(tokens.get(base_idx + tail_offset));
            let tipo_anestesia = non_empty(tokens.get(base_idx + tail_offset + 1));
            let quarto = non_empty(tokens.get(base_idx + tail_offset + 2));

            block_hora_inicio = hora_inicio.clone();
            rows.push(RawCaso {
                centro: current_section.clone(),
                data: current_date.clone(),
                atendimento,
                paciente,
                aviso,
                hora_inicio,
                hora_fim,
                cirurgia,
                convenio,
                prestador,
                anestesista,
                tipo_anestesia,
                quarto,
                row_idx: rows.len(),
            });
            continue;
        }

        // Continuation lines inside a section: no time of their own, but
        // enough fields to name another participant of the same block.
        if current_section.is_some() {
            let nonempty: Vec<&String> = tokens.iter().filter(|t| !t.is_empty()).collect();
            if nonempty.len() >= 4 {
                let n = nonempty.len();
                rows.push(RawCaso {
                    centro: current_section.clone(),
                    data: current_date.clone(),
                    hora_inicio: block_hora_inicio.clone(),
                    cirurgia: Some(nonempty[0].clone()),
                    convenio: (n >= 5).then(|| nonempty[n - 5].clone()),
                    prestador: Some(nonempty[n - 4].clone()),
                    anestesista: Some(nonempty[n - 3].clone()),
                    tipo_anestesia: Some(nonempty[n - 2].clone()),
                    quarto: Some(nonempty[n - 1].clone()),
                    row_idx: rows.len(),
                    ..Default::default()
                });
            }
        }
    }

    debug!(rows = rows.len(), "census report parsed");
    rows
}
