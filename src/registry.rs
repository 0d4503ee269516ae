//! Raw file storage alongside the derived tables.
//!
//! Source files can be kept verbatim in the auxiliary `embedded_files` table so a database carries
//! the workbooks it was built from.

use std::fs;
use std::path::Path;

use rusqlite::{OptionalExtension, params};

use crate::error::{IngestError, IngestResult};
use crate::naming::Identifier;
use crate::store::Store;

/// Name of the auxiliary table holding embedded files.
pub const EMBEDDED_FILES_TABLE: &str = "embedded_files";

/// Listing entry for one embedded file (without its content).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFile {
    pub id: i64,
    pub file_name: String,
    pub size: usize,
}

/// One embedded file with its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedBlob {
    pub id: i64,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

fn registry_exists(store: &Store) -> IngestResult<bool> {
    store.table_exists(&Identifier::normalize(EMBEDDED_FILES_TABLE))
}

fn ensure_registry(store: &Store) -> IngestResult<()> {
    store.connection().execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS \"{EMBEDDED_FILES_TABLE}\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_name TEXT NOT NULL,
                file_blob BLOB NOT NULL
            )"
        ),
        [],
    )?;
    Ok(())
}

/// Store `bytes` under `file_name`; returns the new entry's id.
///
/// Names are not unique: embedding the same file twice keeps both copies.
pub fn embed_bytes(store: &Store, file_name: &str, bytes: &[u8]) -> IngestResult<i64> {
    if file_name.trim().is_empty() {
        return Err(IngestError::invalid_input("embedded file name must not be blank"));
    }
    ensure_registry(store)?;
    let conn = store.connection();
    conn.execute(
        &format!("INSERT INTO \"{EMBEDDED_FILES_TABLE}\" (file_name, file_blob) VALUES (?1, ?2)"),
        params![file_name, bytes],
    )?;
    let id = conn.last_insert_rowid();
    log::debug!("embedded '{file_name}' ({} byte(s)) as id {id}", bytes.len());
    Ok(id)
}

/// Read the file at `path` and store it under its file name.
pub fn embed_file(store: &Store, path: impl AsRef<Path>) -> IngestResult<i64> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            IngestError::invalid_input(format!("path has no file name ({})", path.display()))
        })?;
    let bytes = fs::read(path)?;
    embed_bytes(store, file_name, &bytes)
}

/// All embedded files, oldest first. Reading never creates the registry.
pub fn list_embedded(store: &Store) -> IngestResult<Vec<EmbeddedFile>> {
    if !registry_exists(store)? {
        return Ok(Vec::new());
    }
    let mut stmt = store.connection().prepare(&format!(
        "SELECT id, file_name, length(file_blob) FROM \"{EMBEDDED_FILES_TABLE}\" ORDER BY id"
    ))?;
    let rows = stmt.query_map([], |r| {
        Ok(EmbeddedFile {
            id: r.get(0)?,
            file_name: r.get(1)?,
            size: r.get::<_, i64>(2)?.max(0) as usize,
        })
    })?;
    let mut files = Vec::new();
    for file in rows {
        files.push(file?);
    }
    Ok(files)
}

/// The embedded file with `id`, if any.
pub fn fetch_embedded(store: &Store, id: i64) -> IngestResult<Option<EmbeddedBlob>> {
    if !registry_exists(store)? {
        return Ok(None);
    }
    let blob = store
        .connection()
        .query_row(
            &format!("SELECT id, file_name, file_blob FROM \"{EMBEDDED_FILES_TABLE}\" WHERE id = ?1"),
            params![id],
            |r| {
                Ok(EmbeddedBlob {
                    id: r.get(0)?,
                    file_name: r.get(1)?,
                    bytes: r.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(blob)
}
