//! Combining two workbooks sheet-by-sheet into brand-new tables.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::columns::{schemas_equal, to_strings};
use crate::error::{IngestError, IngestResult};
use crate::naming::Identifier;
use crate::store::{HashedRows, Store};
use crate::types::{Sheet, Workbook};

use super::prepare::{HashPolicy, check_target_table, prepare_sheet};

/// One table created by [`merge_workbooks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTable {
    /// Sheet name as authored in the left workbook.
    pub sheet_name: String,
    pub table_name: String,
    pub row_count: usize,
}

/// Outcome of [`merge_workbooks`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeReport {
    pub tables: Vec<MergedTable>,
}

impl MergeReport {
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.table_name.as_str()).collect()
    }
}

/// Key used to match sheets (and target-name entries) across inputs.
pub fn sheet_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn index_sheets<'a>(workbook: &'a Workbook, side: &str) -> IngestResult<BTreeMap<String, &'a Sheet>> {
    let mut index = BTreeMap::new();
    for sheet in &workbook.sheets {
        if let Some(previous) = index.insert(sheet_key(&sheet.name), sheet) {
            return Err(IngestError::invalid_input(format!(
                "{side} workbook has sheets '{}' and '{}' that differ only by case or whitespace",
                previous.name, sheet.name
            )));
        }
    }
    Ok(index)
}

fn index_targets(targets: &HashMap<String, String>) -> IngestResult<HashMap<String, &str>> {
    let mut index = HashMap::with_capacity(targets.len());
    for (sheet, target) in targets {
        if index.insert(sheet_key(sheet), target.as_str()).is_some() {
            return Err(IngestError::invalid_input(format!(
                "target names given more than once for sheet '{sheet}'"
            )));
        }
    }
    Ok(index)
}

/// Merge two workbooks that hold the same sheets with the same columns.
///
/// `targets` maps each sheet name (matched case-insensitively, ignoring surrounding whitespace) to
/// the name of the table to create for it. For every matched sheet pair the rows of `right` come
/// first, followed by the rows of `left`, each in source order; fingerprints are computed fresh.
/// A sheet without a header row in both inputs is skipped and needs no target.
///
/// The merge is atomic: sheet sets, schemas and target names are all validated before anything is
/// written, and the tables are created in one transaction. Existing tables are never replaced.
pub fn merge_workbooks(
    store: &mut Store,
    left: &Workbook,
    right: &Workbook,
    targets: &HashMap<String, String>,
) -> IngestResult<MergeReport> {
    if left.is_empty() || right.is_empty() {
        return Err(IngestError::invalid_input("merge inputs must each have at least one sheet"));
    }

    let left_index = index_sheets(left, "left")?;
    let right_index = index_sheets(right, "right")?;

    let only_in_left: Vec<String> = left_index
        .iter()
        .filter(|(key, _)| !right_index.contains_key(*key))
        .map(|(_, sheet)| sheet.name.clone())
        .collect();
    let only_in_right: Vec<String> = right_index
        .iter()
        .filter(|(key, _)| !left_index.contains_key(*key))
        .map(|(_, sheet)| sheet.name.clone())
        .collect();
    if !only_in_left.is_empty() || !only_in_right.is_empty() {
        return Err(IngestError::SheetSetMismatch {
            only_in_left,
            only_in_right,
        });
    }

    // Schemas first, for every sheet, so a column mismatch is reported even when a target name
    // is also missing.
    let mut combined: Vec<(&Sheet, HashedRows)> = Vec::with_capacity(left.sheets.len());
    for left_sheet in &left.sheets {
        let key = sheet_key(&left_sheet.name);
        let right_sheet = right_index[&key];

        let left_prepared = prepare_sheet(left_sheet, HashPolicy::Recompute)?;
        let right_prepared = prepare_sheet(right_sheet, HashPolicy::Recompute)?;
        if !schemas_equal(&left_prepared.rows.columns, &right_prepared.rows.columns) {
            return Err(IngestError::SchemaMismatch {
                context: format!("sheet '{}'", left_sheet.name),
                expected: to_strings(&left_prepared.rows.columns),
                actual: to_strings(&right_prepared.rows.columns),
            });
        }
        if left_prepared.rows.columns.is_empty() {
            log::warn!("sheet '{}' has no header row on either side; skipping", left_sheet.name);
            continue;
        }

        let HashedRows {
            columns,
            mut rows,
            mut hashes,
        } = right_prepared.rows;
        rows.extend(left_prepared.rows.rows);
        hashes.extend(left_prepared.rows.hashes);
        combined.push((left_sheet, HashedRows { columns, rows, hashes }));
    }

    let target_index = index_targets(targets)?;
    let mut chosen: HashSet<Identifier> = HashSet::new();
    let mut plans: Vec<(&Sheet, Identifier, HashedRows)> = Vec::with_capacity(combined.len());
    for (sheet, rows) in combined {
        let raw_target = target_index
            .get(&sheet_key(&sheet.name))
            .copied()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                IngestError::invalid_input(format!(
                    "no target table name given for sheet '{}'",
                    sheet.name
                ))
            })?;
        let table = Identifier::normalize(raw_target.trim());
        check_target_table(&table)?;
        if store.table_exists(&table)? || !chosen.insert(table.clone()) {
            return Err(IngestError::NameCollision {
                name: table.into_string(),
            });
        }
        plans.push((sheet, table, rows));
    }

    let tx = store.transaction()?;
    for (_, table, rows) in &plans {
        tx.create_table(table, rows)?;
    }
    tx.commit()?;

    let tables = plans
        .into_iter()
        .map(|(sheet, table, rows)| {
            log::info!(
                "merged sheet '{}' into new table '{table}' ({} row(s))",
                sheet.name,
                rows.row_count()
            );
            MergedTable {
                sheet_name: sheet.name.clone(),
                table_name: table.into_string(),
                row_count: rows.row_count(),
            }
        })
        .collect();

    Ok(MergeReport { tables })
}
