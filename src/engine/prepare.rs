//! Turning a raw [`Sheet`] into reconciled, filtered, fingerprinted rows.

use crate::columns::{ensure_distinct, reconcile_columns, row_hash_position};
use crate::error::{IngestError, IngestResult};
use crate::fingerprint::{ROW_HASH_COLUMN, canonical_text, row_fingerprint};
use crate::naming::Identifier;
use crate::registry::EMBEDDED_FILES_TABLE;
use crate::store::{HashedRows, ROWID_ALIASES};
use crate::types::{Sheet, Value};

/// What to do with a `row_hash` column the incoming sheet already carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HashPolicy {
    /// Ignore it and fingerprint every row.
    Recompute,
    /// Use non-empty provided hashes; fingerprint only rows lacking one.
    KeepProvided,
}

#[derive(Debug, Clone)]
pub(crate) struct PreparedSheet {
    pub sheet_name: String,
    pub rows: HashedRows,
    /// Rows discarded because every data cell was empty.
    pub dropped_empty: usize,
}

pub(crate) fn prepare_sheet(sheet: &Sheet, policy: HashPolicy) -> IngestResult<PreparedSheet> {
    let reconciled = reconcile_columns(&sheet.headers);
    let hash_idx = row_hash_position(&reconciled);

    let data_idx: Vec<usize> = (0..reconciled.len())
        .filter(|idx| Some(*idx) != hash_idx)
        .collect();
    let columns: Vec<Identifier> = data_idx.iter().map(|&idx| reconciled[idx].clone()).collect();

    let context = format!("sheet '{}'", sheet.name);
    if columns.iter().any(|c| c.as_str() == ROW_HASH_COLUMN) {
        return Err(IngestError::invalid_input(format!(
            "{context}: more than one header normalizes to '{ROW_HASH_COLUMN}'"
        )));
    }
    ensure_distinct(&columns, &context)?;
    if ROWID_ALIASES
        .iter()
        .all(|alias| columns.iter().any(|c| c.as_str() == *alias))
    {
        return Err(IngestError::invalid_input(format!(
            "{context}: columns {} leave no way to address insertion order",
            ROWID_ALIASES.join(", ")
        )));
    }

    let mut rows = Vec::with_capacity(sheet.rows.len());
    let mut hashes = Vec::with_capacity(sheet.rows.len());
    let mut dropped_empty = 0usize;

    for raw in &sheet.rows {
        let data: Vec<Value> = data_idx
            .iter()
            .map(|&idx| raw.get(idx).cloned().unwrap_or(Value::Null))
            .collect();
        if data.iter().all(Value::is_empty) {
            dropped_empty += 1;
            continue;
        }

        let provided = match policy {
            HashPolicy::KeepProvided => hash_idx
                .and_then(|idx| raw.get(idx))
                .filter(|v| !v.is_empty())
                .map(|v| canonical_text(v).trim().to_string()),
            HashPolicy::Recompute => None,
        };
        hashes.push(provided.unwrap_or_else(|| row_fingerprint(&data)));
        rows.push(data);
    }

    if dropped_empty > 0 {
        log::debug!("{context}: dropped {dropped_empty} empty row(s)");
    }

    Ok(PreparedSheet {
        sheet_name: sheet.name.clone(),
        rows: HashedRows {
            columns,
            rows,
            hashes,
        },
        dropped_empty,
    })
}

/// Reject table names the engines must never write: SQLite's reserved `sqlite_` prefix and the
/// embedded-file registry.
pub(crate) fn check_target_table(table: &Identifier) -> IngestResult<()> {
    if table.as_str().starts_with("sqlite_") {
        return Err(IngestError::invalid_input(format!(
            "table name '{table}' uses the reserved 'sqlite_' prefix"
        )));
    }
    if table.as_str() == EMBEDDED_FILES_TABLE {
        return Err(IngestError::NameCollision {
            name: table.to_string(),
        });
    }
    Ok(())
}

/// The first `limit` rows with their fingerprint appended, as shown in previews.
pub(crate) fn preview_rows(rows: &HashedRows, limit: usize) -> Vec<Vec<Value>> {
    rows.rows
        .iter()
        .zip(rows.hashes.iter())
        .take(limit)
        .map(|(row, hash)| {
            let mut out = row.clone();
            out.push(Value::Utf8(hash.clone()));
            out
        })
        .collect()
}
