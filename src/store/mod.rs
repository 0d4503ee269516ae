//! The embedded relational store (a single SQLite file).
//!
//! Table and column names always arrive as [`Identifier`]s and are double-quoted in SQL text;
//! cell values are always bound as parameters.
//!
//! Writes that must land together go through [`Store::transaction`]; the single-table helpers on
//! [`Store`] each run in their own transaction.

mod codec;

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Transaction, params, params_from_iter};

use crate::error::{IngestError, IngestResult};
use crate::fingerprint::ROW_HASH_COLUMN;
use crate::naming::Identifier;
use crate::types::{TableData, Value};

/// Names SQLite accepts for the implicit row id. A user column with one of these names shadows it.
pub(crate) const ROWID_ALIASES: [&str; 3] = ["rowid", "_rowid_", "oid"];

/// Data columns, rows and per-row fingerprints ready to be written.
///
/// `columns` never contains `row_hash`; the store appends it as the last column.
#[derive(Debug, Clone, PartialEq)]
pub struct HashedRows {
    pub columns: Vec<Identifier>,
    pub rows: Vec<Vec<Value>>,
    pub hashes: Vec<String>,
}

impl HashedRows {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// An open connection to the store. Dropping it closes the connection.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open_path(path: impl AsRef<Path>) -> IngestResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> IngestResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    /// All table names in the catalog, sorted.
    pub fn table_names(&self) -> IngestResult<Vec<String>> {
        table_names(&self.conn)
    }

    /// Whether the catalog holds `table`. SQLite resolves table names case-insensitively, so a
    /// table created as `Orders` counts as `orders`.
    pub fn table_exists(&self, table: &Identifier) -> IngestResult<bool> {
        table_exists(&self.conn, table)
    }

    /// The name `table` is stored under in the catalog, which may differ from `table` in case.
    pub fn catalog_name(&self, table: &Identifier) -> IngestResult<Option<String>> {
        catalog_name(&self.conn, table)
    }

    /// Column names of `table` in declaration order (including `row_hash`).
    pub fn column_names(&self, table: &Identifier) -> IngestResult<Vec<String>> {
        column_names(&self.conn, table)
    }

    pub fn row_count(&self, table: &Identifier) -> IngestResult<usize> {
        ensure_exists(&self.conn, table)?;
        let sql = format!("SELECT COUNT(*) FROM {}", table.quoted());
        let count: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Read rows of `table` in insertion order, at most `limit` of them when given.
    pub fn read_table(&self, table: &Identifier, limit: Option<usize>) -> IngestResult<TableData> {
        let columns = column_names(&self.conn, table)?;
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let order = ROWID_ALIASES
            .iter()
            .find(|alias| !columns.iter().any(|c| c.eq_ignore_ascii_case(alias)))
            .ok_or_else(|| {
                IngestError::invalid_input(format!(
                    "table '{table}' shadows every row id alias; insertion order is unavailable"
                ))
            })?;
        let sql = format!(
            "SELECT * FROM {} ORDER BY {order} LIMIT ?1",
            table.quoted()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let width = columns.len();
        let rows = stmt.query_map(params![limit], |r| {
            let mut out = Vec::with_capacity(width);
            for idx in 0..width {
                out.push(codec::from_sql(r.get_ref(idx)?));
            }
            Ok(out)
        })?;

        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }

        Ok(TableData {
            name: table.to_string(),
            columns,
            rows: data,
        })
    }

    /// Every distinct fingerprint currently stored in `table`.
    pub fn row_hashes(&self, table: &Identifier) -> IngestResult<HashSet<String>> {
        row_hashes(&self.conn, table)
    }

    /// Drop and recreate `table` with `rows` as its only content.
    pub fn replace_table(&mut self, table: &Identifier, rows: &HashedRows) -> IngestResult<()> {
        let tx = self.transaction()?;
        tx.replace_table(table, rows)?;
        tx.commit()
    }

    /// Create `table`; fails with `NameCollision` if it already exists.
    pub fn create_table(&mut self, table: &Identifier, rows: &HashedRows) -> IngestResult<()> {
        let tx = self.transaction()?;
        tx.create_table(table, rows)?;
        tx.commit()
    }

    /// Insert `rows` at the end of an existing `table`. Returns the number of rows inserted.
    pub fn append_rows(&mut self, table: &Identifier, rows: &HashedRows) -> IngestResult<usize> {
        let tx = self.transaction()?;
        let inserted = tx.append_rows(table, rows)?;
        tx.commit()?;
        Ok(inserted)
    }

    pub(crate) fn drop_table(&mut self, table: &Identifier) -> IngestResult<()> {
        ensure_exists(&self.conn, table)?;
        self.conn
            .execute(&format!("DROP TABLE {}", table.quoted()), [])?;
        Ok(())
    }

    /// Begin a transaction. Nothing written through it is visible until [`StoreTransaction::commit`];
    /// dropping it without committing rolls everything back.
    pub fn transaction(&mut self) -> IngestResult<StoreTransaction<'_>> {
        Ok(StoreTransaction {
            tx: self.conn.transaction()?,
        })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// A write transaction over the store.
pub struct StoreTransaction<'a> {
    tx: Transaction<'a>,
}

impl StoreTransaction<'_> {
    pub fn table_exists(&self, table: &Identifier) -> IngestResult<bool> {
        table_exists(&self.tx, table)
    }

    pub fn replace_table(&self, table: &Identifier, rows: &HashedRows) -> IngestResult<()> {
        self.tx
            .execute(&format!("DROP TABLE IF EXISTS {}", table.quoted()), [])?;
        create_and_fill(&self.tx, table, rows)
    }

    pub fn create_table(&self, table: &Identifier, rows: &HashedRows) -> IngestResult<()> {
        if table_exists(&self.tx, table)? {
            return Err(IngestError::NameCollision {
                name: table.to_string(),
            });
        }
        create_and_fill(&self.tx, table, rows)
    }

    pub fn append_rows(&self, table: &Identifier, rows: &HashedRows) -> IngestResult<usize> {
        ensure_exists(&self.tx, table)?;
        insert_rows(&self.tx, table, rows)
    }

    /// Drop a table by its catalog name, which need not be a normalized identifier.
    pub(crate) fn drop_table(&self, name: &str) -> IngestResult<()> {
        self.tx.execute(
            &format!("DROP TABLE IF EXISTS \"{}\"", name.replace('"', "\"\"")),
            [],
        )?;
        Ok(())
    }

    pub fn commit(self) -> IngestResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn table_names(conn: &Connection) -> IngestResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut names = Vec::new();
    for name in rows {
        names.push(name?);
    }
    Ok(names)
}

fn catalog_name(conn: &Connection, table: &Identifier) -> IngestResult<Option<String>> {
    let name = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            params![table.as_str()],
            |r| r.get::<_, String>(0),
        )
        .optional()?;
    Ok(name)
}

fn table_exists(conn: &Connection, table: &Identifier) -> IngestResult<bool> {
    Ok(catalog_name(conn, table)?.is_some())
}

fn ensure_exists(conn: &Connection, table: &Identifier) -> IngestResult<()> {
    if table_exists(conn, table)? {
        Ok(())
    } else {
        Err(IngestError::TableNotFound {
            table: table.to_string(),
        })
    }
}

fn column_names(conn: &Connection, table: &Identifier) -> IngestResult<Vec<String>> {
    ensure_exists(conn, table)?;
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table.quoted()))?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(1))?;
    let mut names = Vec::new();
    for name in rows {
        names.push(name?);
    }
    Ok(names)
}

fn row_hashes(conn: &Connection, table: &Identifier) -> IngestResult<HashSet<String>> {
    ensure_exists(conn, table)?;
    let sql = format!(
        "SELECT DISTINCT \"{ROW_HASH_COLUMN}\" FROM {} WHERE \"{ROW_HASH_COLUMN}\" IS NOT NULL",
        table.quoted()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut hashes = HashSet::new();
    for hash in rows {
        hashes.insert(hash?);
    }
    Ok(hashes)
}

fn create_and_fill(conn: &Connection, table: &Identifier, rows: &HashedRows) -> IngestResult<()> {
    let mut defs: Vec<String> = rows
        .columns
        .iter()
        .enumerate()
        .map(|(idx, col)| format!("{} {}", col.quoted(), codec::column_affinity(&rows.rows, idx)))
        .collect();
    defs.push(format!("\"{ROW_HASH_COLUMN}\" TEXT"));

    let sql = format!("CREATE TABLE {} ({})", table.quoted(), defs.join(", "));
    conn.execute(&sql, [])?;
    insert_rows(conn, table, rows)?;
    Ok(())
}

fn insert_rows(conn: &Connection, table: &Identifier, rows: &HashedRows) -> IngestResult<usize> {
    let mut names: Vec<String> = rows.columns.iter().map(|c| c.quoted()).collect();
    names.push(format!("\"{ROW_HASH_COLUMN}\""));
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.quoted(),
        names.join(", "),
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let width = rows.columns.len();
    for (row, hash) in rows.rows.iter().zip(rows.hashes.iter()) {
        let mut values: Vec<rusqlite::types::Value> = (0..width)
            .map(|idx| codec::to_sql(row.get(idx).unwrap_or(&Value::Null)))
            .collect();
        values.push(rusqlite::types::Value::Text(hash.clone()));
        stmt.execute(params_from_iter(values))?;
    }
    Ok(rows.rows.len())
}
