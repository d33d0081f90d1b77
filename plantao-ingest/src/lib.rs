//! Census report ingestion for Plantão.
//!
//! Surgical-center census reports arrive as loosely structured text (often a
//! CSV export with repeated headers, section banners and continuation
//! lines). This crate turns one of those into normalized
//! [`AtendimentoRow`](plantao_types::AtendimentoRow)s ready for upsert:
//!
//! 1. [`parse_report`]: line-oriented extraction into [`RawCaso`]s
//! 2. [`inherit_block_context`]: continuation rows inherit the admission
//!    data of their surgical block
//! 3. [`normalize_census`]: prestador filtering, Aviso resolution (with a
//!    pluggable [`AvisoTieBreak`] policy) and final deduplication
//!
//! Everything here is pure logic: no I/O, no SQL.

mod aviso;
mod heranca;
mod normalize;
mod parser;

pub use aviso::{AvisoTieBreak, MostFrequentLongestFirst, normalize_aviso};
pub use heranca::inherit_block_context;
pub use normalize::{fold_accents, normalize_census};
pub use parser::{RawCaso, parse_report};
