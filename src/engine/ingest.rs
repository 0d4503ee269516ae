//! Whole-workbook ingestion: one table per sheet, named `<owner>_<sheet>`.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::naming::Identifier;
use crate::reader::{WorkbookFormat, read_workbook_from_path};
use crate::store::{HashedRows, Store};
use crate::types::{Value, Workbook};

use super::append::plan_append;
use super::prepare::{HashPolicy, check_target_table, prepare_sheet, preview_rows};
use super::WriteMode;

/// Rows shown per sheet in an [`IngestReport`] unless configured otherwise.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Options controlling [`ingest_workbook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// How each sheet's table is written.
    pub mode: WriteMode,
    /// Number of rows kept per table in [`IngestedTable::preview`].
    pub preview_rows: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            mode: WriteMode::Replace,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

/// Outcome for one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedTable {
    /// Sheet name as authored.
    pub sheet_name: String,
    /// Table the sheet was written to.
    pub table_name: String,
    /// Table columns, ending with `row_hash`.
    pub columns: Vec<String>,
    /// Rows written by this call.
    pub row_count: usize,
    /// Incoming rows skipped because their fingerprint was already stored (append with dedup).
    pub skipped_duplicates: usize,
    /// Rows dropped because every cell was empty.
    pub dropped_empty: usize,
    /// First rows written, each ending with its `row_hash`.
    pub preview: Vec<Vec<Value>>,
}

/// Outcome of [`ingest_workbook`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngestReport {
    pub tables: Vec<IngestedTable>,
    /// Sheets without a header row; nothing was written for them.
    pub skipped_sheets: Vec<String>,
}

impl IngestReport {
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.table_name.as_str()).collect()
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.row_count).sum()
    }

    /// Preview rows for a sheet, by authored sheet name.
    pub fn preview(&self, sheet_name: &str) -> Option<&[Vec<Value>]> {
        self.tables
            .iter()
            .find(|t| t.sheet_name == sheet_name)
            .map(|t| t.preview.as_slice())
    }
}

/// Derive the table name for `sheet_name` ingested under `owner`.
pub fn table_name_for(owner: &str, sheet_name: &str) -> Identifier {
    Identifier::normalize(owner).join(&Identifier::normalize(sheet_name))
}

struct SheetPlan {
    table: Identifier,
    sheet_name: String,
    rows: HashedRows,
    skipped_duplicates: usize,
    dropped_empty: usize,
}

/// Ingest every sheet of `workbook` into its own table.
///
/// All sheets are validated before the store is touched, and all tables are written inside a
/// single transaction: either every sheet lands or the store keeps its prior state.
///
/// With [`WriteMode::Replace`] re-ingesting the same workbook under the same owner rebuilds each
/// table from scratch, so row counts do not accumulate. Names in the reserved `sqlite_` space are
/// refused as invalid input; the embedded-file registry and tables whose catalog name differs
/// only in case are refused with `NameCollision`.
pub fn ingest_workbook(
    store: &mut Store,
    workbook: &Workbook,
    owner: &str,
    options: &IngestOptions,
) -> IngestResult<IngestReport> {
    if workbook.is_empty() {
        return Err(IngestError::invalid_input("workbook has no sheets"));
    }

    let mut report = IngestReport::default();
    let mut seen: HashMap<Identifier, &str> = HashMap::new();
    let mut plans: Vec<SheetPlan> = Vec::with_capacity(workbook.sheets.len());

    for sheet in &workbook.sheets {
        if sheet.headers.is_empty() {
            log::warn!("sheet '{}' has no header row; skipping", sheet.name);
            report.skipped_sheets.push(sheet.name.clone());
            continue;
        }

        let table = table_name_for(owner, &sheet.name);
        check_target_table(&table)?;
        if let Some(previous) = seen.insert(table.clone(), sheet.name.as_str()) {
            return Err(IngestError::invalid_input(format!(
                "sheets '{previous}' and '{}' both map to table '{table}'",
                sheet.name
            )));
        }

        let prepared = prepare_sheet(sheet, HashPolicy::Recompute)?;
        let (rows, skipped_duplicates) = match options.mode {
            WriteMode::Replace => {
                // A case variant of the derived name was not created by this engine.
                match store.catalog_name(&table)? {
                    Some(existing) if existing != table.as_str() => {
                        return Err(IngestError::NameCollision { name: existing });
                    }
                    _ => {}
                }
                (prepared.rows, 0)
            }
            WriteMode::CreateOnly => {
                if store.table_exists(&table)? {
                    return Err(IngestError::NameCollision {
                        name: table.into_string(),
                    });
                }
                (prepared.rows, 0)
            }
            WriteMode::Append { dedup } => {
                let plan = plan_append(store, &table, prepared.rows, dedup)?;
                (plan.rows, plan.skipped_duplicates)
            }
        };

        plans.push(SheetPlan {
            table,
            sheet_name: prepared.sheet_name,
            rows,
            skipped_duplicates,
            dropped_empty: prepared.dropped_empty,
        });
    }

    if plans.is_empty() {
        return Err(IngestError::invalid_input(
            "workbook has no sheet with a header row",
        ));
    }

    let tx = store.transaction()?;
    for plan in &plans {
        match options.mode {
            WriteMode::Replace => tx.replace_table(&plan.table, &plan.rows)?,
            WriteMode::CreateOnly => tx.create_table(&plan.table, &plan.rows)?,
            WriteMode::Append { .. } => {
                tx.append_rows(&plan.table, &plan.rows)?;
            }
        }
    }
    tx.commit()?;

    for plan in plans {
        let mut columns: Vec<String> = plan.rows.columns.iter().map(|c| c.to_string()).collect();
        columns.push(crate::fingerprint::ROW_HASH_COLUMN.to_string());
        log::info!(
            "sheet '{}' -> table '{}' ({} row(s), mode {:?})",
            plan.sheet_name,
            plan.table,
            plan.rows.row_count(),
            options.mode
        );
        report.tables.push(IngestedTable {
            sheet_name: plan.sheet_name,
            table_name: plan.table.into_string(),
            columns,
            row_count: plan.rows.row_count(),
            skipped_duplicates: plan.skipped_duplicates,
            dropped_empty: plan.dropped_empty,
            preview: preview_rows(&plan.rows, options.preview_rows),
        });
    }

    Ok(report)
}

/// Read the workbook at `path` and ingest it.
///
/// `owner` defaults to the file stem, so `Sales 2024.xlsx` with a sheet `Q1` lands in
/// `sales_2024_q1`.
pub fn ingest_path(
    store: &mut Store,
    path: impl AsRef<Path>,
    owner: Option<&str>,
    format: Option<WorkbookFormat>,
    options: &IngestOptions,
) -> IngestResult<IngestReport> {
    let path = path.as_ref();
    let owner = match owner {
        Some(o) => o.to_string(),
        None => owner_from_path(path)?,
    };
    let workbook = read_workbook_from_path(path, format)?;
    ingest_workbook(store, &workbook, &owner, options)
}

fn owner_from_path(path: &Path) -> IngestResult<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            IngestError::invalid_input(format!(
                "cannot derive an owning name from path ({})",
                path.display()
            ))
        })
}
