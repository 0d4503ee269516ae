#![cfg(feature = "excel")]

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::{IngestError, IngestResult};
use crate::types::{Sheet, Value, Workbook};

/// Read every sheet of an Excel document (`.xlsx`, `.xls`, `.ods`, etc.) into a [`Workbook`].
///
/// Behavior:
/// - Sheets are returned in workbook order
/// - The first non-empty row of a sheet is its header row; later rows are data
/// - A sheet with no non-empty row comes back with no headers and no rows
pub fn read_excel_workbook_from_path(path: impl AsRef<Path>) -> IngestResult<Workbook> {
    let mut workbook = open_workbook_auto(path)?;
    read_all_sheets(&mut workbook)
}

/// Same as [`read_excel_workbook_from_path`], for a workbook held in memory.
pub fn read_excel_workbook_from_bytes(bytes: &[u8]) -> IngestResult<Workbook> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    read_all_sheets(&mut workbook)
}

fn read_all_sheets<RS>(workbook: &mut Sheets<RS>) -> IngestResult<Workbook>
where
    RS: std::io::Read + std::io::Seek,
{
    let names: Vec<String> = workbook.sheet_names().to_vec();
    if names.is_empty() {
        return Err(IngestError::invalid_input("workbook has no sheets"));
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        sheets.push(sheet_from_range(&name, &range));
    }
    Ok(Workbook::new(sheets))
}

fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<Value>> = Vec::new();

    for row in range.rows() {
        match headers {
            None => {
                if row.iter().any(|c| !matches!(c, Data::Empty)) {
                    headers = Some(row.iter().map(cell_to_header_string).collect());
                }
            }
            Some(_) => rows.push(row.iter().map(convert_cell).collect()),
        }
    }

    Sheet::new(name, headers.unwrap_or_default(), rows)
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => match convert_cell(other) {
            Value::Utf8(s) => s,
            value => crate::fingerprint::canonical_text(&value),
        },
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::String(s) => Value::Utf8(s.clone()),
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                Value::Float64(dt.as_f64())
            } else {
                excel_serial_to_datetime(dt.as_f64())
                    .map(Value::DateTime)
                    .unwrap_or_else(|| Value::Float64(dt.as_f64()))
            }
        }
        Data::DateTimeIso(s) => Value::Utf8(s.clone()),
        Data::DurationIso(s) => Value::Utf8(s.clone()),
        Data::Error(e) => Value::Utf8(e.to_string()),
    }
}

/// Convert a serial date in the 1900 date system to a timestamp, rounded to the millisecond.
///
/// Serial 0 is 1899-12-30, which absorbs Excel's phantom 1900-02-29 for every date after it.
pub(crate) fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis as i64)?)
}
