//! Date handling tolerant of the two spellings found in stored data.
//!
//! Census reports carry Brazilian `dd/MM/yyyy` dates; rows written through
//! other paths may carry ISO `YYYY-MM-DD`. Queries and key derivation accept
//! both.

use chrono::{Datelike, Local, NaiveDate};

/// Parses `dd/MM/yyyy`, falling back to `YYYY-MM-DD`.
#[must_use]
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

/// Splits a date string into `(ano, mes, dia)` when it parses.
#[must_use]
pub fn split_date_parts(s: &str) -> Option<(i32, i32, i32)> {
    let d = parse_flexible_date(s)?;
    Some((d.year(), d.month() as i32, d.day() as i32))
}

/// Current local time formatted the way surgery timestamps are stored:
/// ISO-8601 at second precision, no offset.
#[must_use]
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// The two `LIKE` patterns matching one month of dates, covering both
/// stored spellings: `YYYY-MM-%` and `%/MM/YYYY`.
#[must_use]
pub fn month_like_patterns(ano: i32, mes: u32) -> (String, String) {
    (format!("{ano}-{mes:02}-%"), format!("%/{mes:02}/{ano}"))
}

/// The two `LIKE` patterns matching one year of dates.
#[must_use]
pub fn year_like_patterns(ano: i32) -> (String, String) {
    (format!("{ano}-%"), format!("%/{ano}"))
}
