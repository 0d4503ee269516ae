//! Appending a sheet to an existing table.

use crate::columns::{schemas_equal, to_strings, without_row_hash};
use crate::error::{IngestError, IngestResult};
use crate::naming::Identifier;
use crate::store::{HashedRows, Store};
use crate::types::Sheet;

use super::prepare::{HashPolicy, check_target_table, prepare_sheet};

/// Options controlling [`append_sheet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppendOptions {
    /// Skip incoming rows whose fingerprint is already stored in the target table.
    ///
    /// Off by default: repeated identical rows (e.g. repeated events) are legitimate data.
    pub dedup: bool,
}

/// Outcome of [`append_sheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReport {
    pub table_name: String,
    /// Rows inserted.
    pub appended: usize,
    /// Incoming rows skipped by dedup mode.
    pub skipped_duplicates: usize,
}

pub(crate) struct AppendPlan {
    pub rows: HashedRows,
    pub skipped_duplicates: usize,
}

/// Check `incoming` against the stored schema of `table` and, in dedup mode, drop rows whose
/// fingerprint is already present. Reads only; nothing is written.
pub(crate) fn plan_append(
    store: &Store,
    table: &Identifier,
    incoming: HashedRows,
    dedup: bool,
) -> IngestResult<AppendPlan> {
    let existing = store.column_names(table)?;
    let expected = without_row_hash(&existing);
    let actual = to_strings(&incoming.columns);

    if !schemas_equal(&expected, &actual) {
        return Err(IngestError::SchemaMismatch {
            context: format!("table '{table}'"),
            expected,
            actual,
        });
    }

    if !dedup {
        return Ok(AppendPlan {
            rows: incoming,
            skipped_duplicates: 0,
        });
    }

    // Compared against the table as it was before this call only; duplicates inside one batch
    // are all inserted.
    let known = store.row_hashes(table)?;
    let HashedRows {
        columns,
        rows,
        hashes,
    } = incoming;

    let mut kept_rows = Vec::with_capacity(rows.len());
    let mut kept_hashes = Vec::with_capacity(hashes.len());
    let mut skipped_duplicates = 0usize;
    for (row, hash) in rows.into_iter().zip(hashes) {
        if known.contains(&hash) {
            skipped_duplicates += 1;
        } else {
            kept_rows.push(row);
            kept_hashes.push(hash);
        }
    }

    Ok(AppendPlan {
        rows: HashedRows {
            columns,
            rows: kept_rows,
            hashes: kept_hashes,
        },
        skipped_duplicates,
    })
}

/// Append the rows of `sheet` to the existing table `table`.
///
/// The table name is normalized first, so an identifier passes through unchanged. The incoming
/// headers must reconcile to exactly the table's data columns, in the same order (`row_hash` is
/// ignored on both sides). Rows that arrive with a non-empty `row_hash` keep it; the rest are
/// fingerprinted. Nothing is written when the schemas differ.
pub fn append_sheet(
    store: &mut Store,
    table: &str,
    sheet: &Sheet,
    options: &AppendOptions,
) -> IngestResult<AppendReport> {
    let table = Identifier::normalize(table);
    check_target_table(&table)?;
    let prepared = prepare_sheet(sheet, HashPolicy::KeepProvided)?;
    let plan = plan_append(store, &table, prepared.rows, options.dedup)?;
    let appended = store.append_rows(&table, &plan.rows)?;

    log::info!(
        "appended {appended} row(s) from sheet '{}' to '{table}' ({} duplicate(s) skipped)",
        sheet.name,
        plan.skipped_duplicates
    );

    Ok(AppendReport {
        table_name: table.into_string(),
        appended,
        skipped_duplicates: plan.skipped_duplicates,
    })
}
