//! CSV workbook source.

use std::io::Read;
use std::path::Path;

use crate::error::IngestResult;
use crate::types::{Sheet, Value, Workbook};

/// Sheet name used when a CSV has no file name to borrow one from.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Read a CSV file as a one-sheet [`Workbook`].
///
/// The sheet is named after the file stem, so `orders.csv` ingested under owner `orders` lands in
/// table `orders_orders`.
pub fn read_csv_workbook_from_path(path: impl AsRef<Path>) -> IngestResult<Workbook> {
    let path = path.as_ref();
    let sheet_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_SHEET_NAME)
        .to_string();
    let file = std::fs::File::open(path)?;
    read_csv_workbook_from_reader(file, &sheet_name)
}

/// Read CSV data from any reader as a one-sheet [`Workbook`].
///
/// Rules:
///
/// - The first record is the header row.
/// - Empty fields become [`Value::Null`]; everything else stays text (no type inference).
/// - Records may be ragged; short records are padded when the engine aligns them to the headers.
pub fn read_csv_workbook_from_reader<R: Read>(reader: R, sheet_name: &str) -> IngestResult<Workbook> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Value::Null
                } else {
                    Value::Utf8(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    Ok(Workbook::new(vec![Sheet::new(sheet_name, headers, rows)]))
}
