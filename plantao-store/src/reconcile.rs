//! Row-level reconciliation of two divergent store files.
//!
//! `reconcile(source, base, output)` copies `base` byte-for-byte to
//! `output`, attaches `source`, and replays every source row on top inside
//! one transaction. Each row is applied with a single
//! `INSERT ... ON CONFLICT DO UPDATE`, so there is no read-then-write window
//! between detecting a key collision and resolving it.
//!
//! Tables are processed in [`TableKind::MERGE_ORDER`]; the policy for each
//! table comes from [`TableKind::policy`], and the match on it is
//! exhaustive: a table added to the registry without a policy does not
//! compile.

use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

use plantao_types::{MergePolicy, TableKind};

use crate::error::{StoreError, StoreResult};

/// Merges `source` into `base`, writing the result to `output`.
///
/// `base` is authoritative for everything `source` does not assert: rows
/// only in `base` are untouched, and on key collisions the table's policy
/// decides. On any failure the partially built `output` is removed and the
/// inputs are left unmodified; `output` exists only after a full success.
pub fn reconcile(
    source: impl AsRef<Path>,
    base: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> StoreResult<()> {
    let source = source.as_ref();
    let base = base.as_ref();
    let output = output.as_ref();

    if !source.exists() {
        return Err(StoreError::NotFound(source.to_path_buf()));
    }
    if !base.exists() {
        return Err(StoreError::NotFound(base.to_path_buf()));
    }

    std::fs::copy(base, output)?;

    match apply_source(source, output) {
        Ok(()) => {
            info!(
                source = %source.display(),
                base = %base.display(),
                "stores reconciled"
            );
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(output);
            Err(e)
        }
    }
}

fn apply_source(source: &Path, output: &Path) -> StoreResult<()> {
    let conn = Connection::open(output)?;

    // ATTACH takes no bound parameters; the path goes in as a quoted literal.
    let source_literal = source.to_string_lossy().replace('\'', "''");
    conn.execute_batch(&format!("ATTACH DATABASE '{source_literal}' AS src"))?;

    let applied = (|| -> StoreResult<()> {
        let tx = conn.unchecked_transaction()?;
        for kind in TableKind::MERGE_ORDER {
            apply_table(&tx, kind).map_err(|e| StoreError::MergeFailed {
                table: kind.table_name().to_string(),
                detail: e.to_string(),
            })?;
            debug!(table = kind.table_name(), "table merged");
        }
        tx.commit()?;
        Ok(())
    })();

    // Best effort: the connection is dropped right after either way.
    let _ = conn.execute_batch("DETACH DATABASE src");
    applied
}

fn apply_table(conn: &Connection, kind: TableKind) -> rusqlite::Result<()> {
    let sql = match kind.policy() {
        MergePolicy::FieldOverwrite { fields } => field_overwrite_sql(kind, fields),
        MergePolicy::LastWriteWins { updated, created } => last_write_wins_sql(kind, updated, created),
    };
    conn.execute_batch(&sql)
}

/// UPSERT replaying every source row; collisions replace only the policy's
/// fields, everything else keeps the base row's values.
///
/// The `WHERE true` on the SELECT is required syntax: without it SQLite
/// cannot disambiguate the upsert's `ON` from a join clause.
fn field_overwrite_sql(kind: TableKind, fields: &[&str]) -> String {
    let table = kind.table_name();
    let cols = kind.payload_columns().join(", ");
    let keys = kind.key_columns().join(", ");
    let sets = fields
        .iter()
        .map(|f| format!("{f} = excluded.{f}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {table} ({cols})
         SELECT {cols} FROM src.{table} WHERE true
         ON CONFLICT({keys}) DO UPDATE SET {sets};"
    )
}

/// UPSERT replaying every source row under last-write-wins.
///
/// The incoming row's `created` column is pre-resolved in the SELECT
/// (source value, else the base row's via LEFT JOIN) so the insert branch is
/// correct for keys the base does not have. The DO UPDATE branch fires only
/// when the incoming update timestamp is strictly newer (empty and NULL
/// compare as oldest; a tie keeps the base row) and preserves the base
/// row's non-empty `created`.
fn last_write_wins_sql(kind: TableKind, updated: &str, created: &str) -> String {
    let table = kind.table_name();
    let cols = kind.payload_columns().join(", ");
    let keys = kind.key_columns();
    let key_list = keys.join(", ");

    let select_cols = kind
        .payload_columns()
        .iter()
        .map(|&c| {
            if c == created {
                format!("COALESCE(NULLIF(l.{created}, ''), r.{created})")
            } else {
                format!("l.{c}")
            }
        })
        .collect::<Vec<_>>()
        .join(",\n                ");
    let join_on = keys
        .iter()
        .map(|k| format!("r.{k} = l.{k}"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let sets = kind
        .payload_columns()
        .iter()
        .filter(|c| !keys.contains(*c))
        .map(|&c| {
            if c == created {
                format!("{created} = COALESCE(NULLIF({table}.{created}, ''), excluded.{created})")
            } else {
                format!("{c} = excluded.{c}")
            }
        })
        .collect::<Vec<_>>()
        .join(",\n             ");

    format!(
        "INSERT INTO {table} ({cols})
         SELECT {select_cols}
         FROM src.{table} l
         LEFT JOIN {table} r ON {join_on}
         WHERE true
         ON CONFLICT({key_list}) DO UPDATE SET
             {sets}
         WHERE COALESCE(excluded.{updated}, '') > COALESCE({table}.{updated}, '');"
    )
}
