//! The local store: an explicitly scoped handle over one SQLite file.
//!
//! `Store` owns its connection. There is no process-global handle: callers
//! open a store, use it, and drop (or [`Store::close`]) it, so operations
//! that need exclusive access to the raw file (checkpoint, reconcile,
//! vacuum) can rely on no handle surviving elsewhere in the process.

use rusqlite::{Connection, params, params_from_iter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use plantao_types::{
    AtendimentoKey, AtendimentoRow, CatalogoItem, CatalogoKind, Cirurgia, CirurgiaKey, datas,
};

use crate::error::{StoreError, StoreResult};

/// Schema bootstrap. Unique constraints live both in the table definitions
/// and as named indexes so `ON CONFLICT` targets resolve on files created by
/// any prior version.
const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS pacientes_unicos_por_dia_prestador (
        Hospital    TEXT,
        Ano         INTEGER,
        Mes         INTEGER,
        Dia         INTEGER,
        Data        TEXT,
        Atendimento TEXT,
        Paciente    TEXT,
        Aviso       TEXT,
        Convenio    TEXT,
        Prestador   TEXT,
        Quarto      TEXT,
        UNIQUE(Hospital, Atendimento, Paciente, Prestador, Data)
    );

    CREATE TABLE IF NOT EXISTS cirurgias (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        Hospital    TEXT,
        Atendimento TEXT,
        Paciente    TEXT,
        Prestador   TEXT,
        Data_Cirurgia TEXT,
        Convenio    TEXT,
        Procedimento_Tipo_ID INTEGER,
        Situacao_ID INTEGER,
        Guia_AMHPTISS TEXT,
        Guia_AMHPTISS_Complemento TEXT,
        Fatura TEXT,
        Observacoes TEXT,
        created_at TEXT,
        updated_at TEXT,
        UNIQUE(Hospital, Atendimento, Paciente, Prestador, Data_Cirurgia)
    );

    CREATE TABLE IF NOT EXISTS procedimento_tipos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nome  TEXT UNIQUE,
        ativo INTEGER,
        ordem INTEGER
    );

    CREATE TABLE IF NOT EXISTS cirurgia_situacoes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nome  TEXT UNIQUE,
        ativo INTEGER,
        ordem INTEGER
    );

    CREATE UNIQUE INDEX IF NOT EXISTS ux_pacientes_unicos
    ON pacientes_unicos_por_dia_prestador (Hospital, Atendimento, Paciente, Prestador, Data);

    CREATE UNIQUE INDEX IF NOT EXISTS ux_cirurgias
    ON cirurgias (Hospital, Atendimento, Paciente, Prestador, Data_Cirurgia);
";

/// Optional filters for [`Store::list_cirurgias`].
#[derive(Debug, Clone, Default)]
pub struct CirurgiaFilter {
    /// Exact hospital match.
    pub hospital: Option<String>,
    /// `YYYY-MM`; matches both stored date spellings.
    pub ano_mes: Option<String>,
    /// Exact prestador match.
    pub prestador: Option<String>,
}

/// A scoped handle over one store file (or an in-memory store in tests).
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Opens (or creates) a store at the given path, applying PRAGMAs and
    /// bootstrapping the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init()?;
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.init()?;
        Ok(store)
    }

    /// The file backing this store, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Explicitly releases the handle. Dropping the store does the same;
    /// this form surfaces close errors.
    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, e)| StoreError::Database(e))
    }

    fn init(&self) -> StoreResult<()> {
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        // journal_mode returns the resulting mode as a row.
        self.conn
            .query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.execute_batch(SCHEMA_SQL)?;
        self.ensure_schema_columns()?;
        Ok(())
    }

    /// Adds columns introduced after the first release to store files that
    /// predate them. Harmless on current files.
    fn ensure_schema_columns(&self) -> StoreResult<()> {
        match self.conn.execute(
            "ALTER TABLE cirurgias ADD COLUMN Guia_AMHPTISS_Complemento TEXT",
            [],
        ) {
            Ok(_) => {
                info!("added cirurgias.Guia_AMHPTISS_Complemento to an older store file");
                Ok(())
            }
            Err(e) if e.to_string().contains("duplicate column name") => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // ── Atendimentos (per-day attendance base) ───────────────────

    /// Upserts one attendance row. Returns `false` when the row was skipped
    /// for lacking both Atendimento and Paciente. `Ano`/`Mes`/`Dia` are
    /// derived from `Data` when it parses.
    pub fn upsert_atendimento(&self, row: &AtendimentoRow) -> StoreResult<bool> {
        if !row.has_identity() {
            return Ok(false);
        }
        let mut row = row.clone();
        row.derive_date_parts();
        self.conn.execute(
            "INSERT INTO pacientes_unicos_por_dia_prestador
             (Hospital, Ano, Mes, Dia, Data, Atendimento, Paciente, Aviso, Convenio, Prestador, Quarto)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(Hospital, Atendimento, Paciente, Prestador, Data)
             DO UPDATE SET
                 Aviso    = excluded.Aviso,
                 Convenio = excluded.Convenio,
                 Quarto   = excluded.Quarto",
            params![
                row.hospital.trim(),
                row.ano,
                row.mes,
                row.dia,
                row.data.trim(),
                row.atendimento.trim(),
                row.paciente.trim(),
                row.aviso.trim(),
                row.convenio.trim(),
                row.prestador.trim(),
                row.quarto.trim(),
            ],
        )?;
        Ok(true)
    }

    /// Upserts a batch of attendance rows in one transaction.
    /// Returns `(saved, skipped)`.
    pub fn upsert_atendimentos(&self, rows: &[AtendimentoRow]) -> StoreResult<(usize, usize)> {
        let tx = self.conn.unchecked_transaction()?;
        let mut saved = 0;
        let mut skipped = 0;
        for row in rows {
            if self.upsert_atendimento(row)? {
                saved += 1;
            } else {
                skipped += 1;
            }
        }
        tx.commit()?;
        debug!(saved, skipped, "attendance batch upserted");
        Ok((saved, skipped))
    }

    /// Deletes one attendance row by its natural key. Returns rows affected.
    pub fn delete_atendimento(&self, key: &AtendimentoKey) -> StoreResult<usize> {
        let n = self.conn.execute(
            "DELETE FROM pacientes_unicos_por_dia_prestador
             WHERE Hospital=?1 AND Atendimento=?2 AND Paciente=?3 AND Prestador=?4 AND Data=?5",
            params![
                key.hospital.trim(),
                key.atendimento.trim(),
                key.paciente.trim(),
                key.prestador.trim(),
                key.data.trim(),
            ],
        )?;
        Ok(n)
    }

    /// All attendance rows, ordered for display.
    pub fn list_atendimentos(&self) -> StoreResult<Vec<AtendimentoRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT Hospital, Ano, Mes, Dia, Data, Atendimento, Paciente, Aviso, Convenio, Prestador, Quarto
             FROM pacientes_unicos_por_dia_prestador
             ORDER BY Hospital, Ano, Mes, Dia, Paciente, Prestador",
        )?;
        let rows = stmt
            .query_map([], map_atendimento_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of attendance rows.
    pub fn count_atendimentos(&self) -> StoreResult<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pacientes_unicos_por_dia_prestador",
            [],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }

    /// Attendance rows for pre-filling surgery records: required hospital,
    /// optional year/month (tolerant of both date spellings) and an optional
    /// prestador allow-list.
    pub fn find_base_rows(
        &self,
        hospital: &str,
        ano: Option<i32>,
        mes: Option<u32>,
        prestadores: &[String],
    ) -> StoreResult<Vec<AtendimentoRow>> {
        if hospital.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut clauses = vec!["Hospital = ?".to_string()];
        let mut values: Vec<String> = vec![hospital.trim().to_string()];

        match (ano, mes) {
            (Some(ano), Some(mes)) => {
                let (iso, br) = datas::month_like_patterns(ano, mes);
                clauses.push("(Data LIKE ? OR Data LIKE ?)".to_string());
                values.push(iso);
                values.push(br);
            }
            (Some(ano), None) => {
                let (iso, br) = datas::year_like_patterns(ano);
                clauses.push("(Data LIKE ? OR Data LIKE ?)".to_string());
                values.push(iso);
                values.push(br);
            }
            _ => {}
        }

        let prestadores: Vec<String> = prestadores
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if !prestadores.is_empty() {
            let placeholders = vec!["?"; prestadores.len()].join(", ");
            clauses.push(format!("Prestador IN ({placeholders})"));
            values.extend(prestadores);
        }

        let sql = format!(
            "SELECT Hospital, Ano, Mes, Dia, Data, Atendimento, Paciente, Aviso, Convenio, Prestador, Quarto
             FROM pacientes_unicos_por_dia_prestador
             WHERE {}
             ORDER BY Data, Prestador, Atendimento, Paciente",
            clauses.join(" AND ")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), map_atendimento_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Catalogs ─────────────────────────────────────────────────

    /// Lists one catalog, optionally restricted to active entries, ordered
    /// by `ordem` then name.
    pub fn list_catalogo(
        &self,
        kind: CatalogoKind,
        only_active: bool,
    ) -> StoreResult<Vec<CatalogoItem>> {
        let mut sql = format!("SELECT id, nome, ativo, ordem FROM {}", kind.table_name());
        if only_active {
            sql.push_str(" WHERE ativo=1");
        }
        sql.push_str(" ORDER BY ordem, nome");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CatalogoItem {
                    id: row.get(0)?,
                    nome: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    ativo: row.get::<_, Option<i64>>(2)?.unwrap_or(0) != 0,
                    ordem: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Upserts a catalog entry by name and returns its id.
    pub fn upsert_catalogo(
        &self,
        kind: CatalogoKind,
        nome: &str,
        ativo: bool,
        ordem: i64,
    ) -> StoreResult<i64> {
        let nome = nome.trim();
        self.conn.execute(
            &format!(
                "INSERT INTO {} (nome, ativo, ordem) VALUES (?1, ?2, ?3)
                 ON CONFLICT(nome) DO UPDATE SET ativo=excluded.ativo, ordem=excluded.ordem",
                kind.table_name()
            ),
            params![nome, ativo as i64, ordem],
        )?;
        let id: i64 = self.conn.query_row(
            &format!("SELECT id FROM {} WHERE nome=?1", kind.table_name()),
            params![nome],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    /// Activates or deactivates a catalog entry.
    pub fn set_catalogo_ativo(&self, kind: CatalogoKind, id: i64, ativo: bool) -> StoreResult<()> {
        self.conn.execute(
            &format!("UPDATE {} SET ativo=?1 WHERE id=?2", kind.table_name()),
            params![ativo as i64, id],
        )?;
        Ok(())
    }

    // ── Cirurgias ────────────────────────────────────────────────

    /// Upserts a surgery record by its natural key, stamping
    /// `created_at`/`updated_at` with the current local time. `created_at`
    /// is preserved when the key already exists. Returns the record id.
    pub fn upsert_cirurgia(&self, cirurgia: &Cirurgia) -> StoreResult<i64> {
        self.upsert_cirurgia_at(cirurgia, &datas::now_timestamp())
    }

    /// [`Store::upsert_cirurgia`] with an explicit timestamp.
    pub fn upsert_cirurgia_at(&self, cirurgia: &Cirurgia, agora: &str) -> StoreResult<i64> {
        cirurgia.validate_key()?;
        self.conn.execute(
            "INSERT INTO cirurgias (
                 Hospital, Atendimento, Paciente, Prestador, Data_Cirurgia,
                 Convenio, Procedimento_Tipo_ID, Situacao_ID,
                 Guia_AMHPTISS, Guia_AMHPTISS_Complemento,
                 Fatura, Observacoes, created_at, updated_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
             ON CONFLICT(Hospital, Atendimento, Paciente, Prestador, Data_Cirurgia)
             DO UPDATE SET
                 Convenio=excluded.Convenio,
                 Procedimento_Tipo_ID=excluded.Procedimento_Tipo_ID,
                 Situacao_ID=excluded.Situacao_ID,
                 Guia_AMHPTISS=excluded.Guia_AMHPTISS,
                 Guia_AMHPTISS_Complemento=excluded.Guia_AMHPTISS_Complemento,
                 Fatura=excluded.Fatura,
                 Observacoes=excluded.Observacoes,
                 updated_at=excluded.updated_at",
            params![
                cirurgia.hospital.trim(),
                cirurgia.atendimento.trim(),
                cirurgia.paciente.trim(),
                cirurgia.prestador.trim(),
                cirurgia.data_cirurgia.trim(),
                cirurgia.convenio.trim(),
                cirurgia.procedimento_tipo_id,
                cirurgia.situacao_id,
                cirurgia.guia_amhptiss.trim(),
                cirurgia.guia_amhptiss_complemento.trim(),
                cirurgia.fatura.trim(),
                cirurgia.observacoes.trim(),
                agora,
            ],
        )?;
        let id: i64 = self.conn.query_row(
            "SELECT id FROM cirurgias
             WHERE Hospital=?1 AND Atendimento=?2 AND Paciente=?3 AND Prestador=?4 AND Data_Cirurgia=?5",
            params![
                cirurgia.hospital.trim(),
                cirurgia.atendimento.trim(),
                cirurgia.paciente.trim(),
                cirurgia.prestador.trim(),
                cirurgia.data_cirurgia.trim(),
            ],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    /// Lists surgeries matching the filter, ordered by date then prestador.
    pub fn list_cirurgias(&self, filter: &CirurgiaFilter) -> StoreResult<Vec<Cirurgia>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(hospital) = filter.hospital.as_deref().filter(|h| !h.trim().is_empty()) {
            clauses.push("Hospital=?".to_string());
            values.push(hospital.trim().to_string());
        }
        if let Some(prestador) = filter.prestador.as_deref().filter(|p| !p.trim().is_empty()) {
            clauses.push("Prestador=?".to_string());
            values.push(prestador.trim().to_string());
        }
        if let Some(ano_mes) = filter.ano_mes.as_deref().filter(|m| !m.trim().is_empty()) {
            match parse_ano_mes(ano_mes) {
                Some((ano, mes)) => {
                    let (iso, br) = datas::month_like_patterns(ano, mes);
                    clauses.push("(Data_Cirurgia LIKE ? OR Data_Cirurgia LIKE ?)".to_string());
                    values.push(iso);
                    values.push(br);
                }
                // Unexpected spelling: match it as a raw prefix.
                None => {
                    clauses.push("Data_Cirurgia LIKE ?".to_string());
                    values.push(format!("{}%", ano_mes.trim()));
                }
            }
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT id, Hospital, Atendimento, Paciente, Prestador, Data_Cirurgia,
                    Convenio, Procedimento_Tipo_ID, Situacao_ID,
                    Guia_AMHPTISS, Guia_AMHPTISS_Complemento, Fatura,
                    Observacoes, created_at, updated_at
             FROM cirurgias{where_sql}
             ORDER BY Data_Cirurgia, Prestador, Atendimento, Paciente"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), map_cirurgia_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Deletes one surgery by id. Returns rows affected.
    pub fn delete_cirurgia(&self, id: i64) -> StoreResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM cirurgias WHERE id=?1", params![id])?)
    }

    /// Deletes one surgery by its natural key. Returns rows affected.
    pub fn delete_cirurgia_by_key(&self, key: &CirurgiaKey) -> StoreResult<usize> {
        let n = self.conn.execute(
            "DELETE FROM cirurgias
             WHERE Hospital=?1 AND Atendimento=?2 AND Paciente=?3 AND Prestador=?4 AND Data_Cirurgia=?5",
            params![
                key.hospital.trim(),
                key.atendimento.trim(),
                key.paciente.trim(),
                key.prestador.trim(),
                key.data_cirurgia.trim(),
            ],
        )?;
        Ok(n)
    }

    /// Batch delete by filters: hospital required, the other filters are
    /// `IN`-lists applied only when non-empty. Dates must match the stored
    /// spelling. Returns rows affected.
    pub fn delete_cirurgias_by_filter(
        &self,
        hospital: &str,
        atendimentos: &[String],
        prestadores: &[String],
        datas_cirurgia: &[String],
    ) -> StoreResult<usize> {
        let mut clauses = vec!["Hospital=?".to_string()];
        let mut values: Vec<String> = vec![hospital.trim().to_string()];

        for (column, list) in [
            ("Atendimento", atendimentos),
            ("Prestador", prestadores),
            ("Data_Cirurgia", datas_cirurgia),
        ] {
            let cleaned: Vec<String> = list
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if !cleaned.is_empty() {
                let placeholders = vec!["?"; cleaned.len()].join(", ");
                clauses.push(format!("{column} IN ({placeholders})"));
                values.extend(cleaned);
            }
        }

        let sql = format!("DELETE FROM cirurgias WHERE {}", clauses.join(" AND "));
        let n = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(n)
    }

    // ── Bulk clears ──────────────────────────────────────────────

    /// Removes every attendance row; returns how many were removed.
    pub fn delete_all_atendimentos(&self) -> StoreResult<usize> {
        let n = self.count_atendimentos()?;
        self.conn
            .execute("DELETE FROM pacientes_unicos_por_dia_prestador", [])?;
        Ok(n)
    }

    /// Removes every entry of both catalogs; returns the combined count.
    pub fn delete_all_catalogos(&self) -> StoreResult<usize> {
        let mut total = 0usize;
        for kind in [CatalogoKind::ProcedimentoTipos, CatalogoKind::CirurgiaSituacoes] {
            let n: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", kind.table_name()),
                [],
                |r| r.get(0),
            )?;
            self.conn
                .execute(&format!("DELETE FROM {}", kind.table_name()), [])?;
            total += n as usize;
        }
        Ok(total)
    }

    /// Removes every surgery; returns how many were removed.
    pub fn delete_all_cirurgias(&self) -> StoreResult<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cirurgias", [], |r| r.get(0))?;
        self.conn.execute("DELETE FROM cirurgias", [])?;
        Ok(n as usize)
    }
}

fn parse_ano_mes(ano_mes: &str) -> Option<(i32, u32)> {
    let (ano, mes) = ano_mes.trim().split_once('-')?;
    let ano: i32 = ano.parse().ok()?;
    let mes: u32 = mes.parse().ok()?;
    (1..=12).contains(&mes).then_some((ano, mes))
}

fn map_atendimento_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AtendimentoRow> {
    Ok(AtendimentoRow {
        hospital: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        ano: row.get::<_, Option<i64>>(1)?.unwrap_or(0) as i32,
        mes: row.get::<_, Option<i64>>(2)?.unwrap_or(0) as i32,
        dia: row.get::<_, Option<i64>>(3)?.unwrap_or(0) as i32,
        data: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        atendimento: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        paciente: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        aviso: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        convenio: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        prestador: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        quarto: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
    })
}

fn map_cirurgia_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Cirurgia> {
    Ok(Cirurgia {
        id: row.get(0)?,
        hospital: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        atendimento: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        paciente: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        prestador: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        data_cirurgia: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        convenio: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        procedimento_tipo_id: row.get(7)?,
        situacao_id: row.get(8)?,
        guia_amhptiss: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        guia_amhptiss_complemento: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
        fatura: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
        observacoes: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
        created_at: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
        updated_at: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
    })
}
