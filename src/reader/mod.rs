//! Workbook sources.
//!
//! Most callers should use [`read_workbook_from_path`], which picks a reader from the file
//! extension (or from an explicit [`WorkbookFormat`]) and returns an in-memory
//! [`crate::types::Workbook`] with headers and cells exactly as authored.
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (cargo feature `excel`, enabled by default)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;

use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::types::Workbook;

/// Supported workbook formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Comma-separated values; always a single sheet.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl WorkbookFormat {
    /// Parse a workbook format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> IngestResult<Self> {
        let ext = path.extension().and_then(|s| s.to_str()).ok_or_else(|| {
            IngestError::invalid_input(format!(
                "cannot infer workbook format: path has no extension ({})",
                path.display()
            ))
        })?;

        Self::from_extension(ext).ok_or_else(|| {
            IngestError::invalid_input(format!(
                "cannot infer workbook format from extension '{ext}' for path ({})",
                path.display()
            ))
        })
    }
}

/// Read every sheet of the workbook at `path`.
///
/// If `format` is `None` the format is inferred from the extension.
pub fn read_workbook_from_path(
    path: impl AsRef<Path>,
    format: Option<WorkbookFormat>,
) -> IngestResult<Workbook> {
    let path = path.as_ref();
    let format = match format {
        Some(f) => f,
        None => WorkbookFormat::from_path(path)?,
    };
    log::debug!("reading {:?} workbook from {}", format, path.display());

    match format {
        WorkbookFormat::Csv => csv::read_csv_workbook_from_path(path),
        WorkbookFormat::Excel => read_excel_dispatch(ExcelSource::Path(path)),
    }
}

/// Read a workbook from in-memory bytes (e.g. a browser upload).
pub fn read_workbook_from_bytes(bytes: &[u8], format: WorkbookFormat) -> IngestResult<Workbook> {
    match format {
        WorkbookFormat::Csv => csv::read_csv_workbook_from_reader(bytes, csv::DEFAULT_SHEET_NAME),
        WorkbookFormat::Excel => read_excel_dispatch(ExcelSource::Bytes(bytes)),
    }
}

enum ExcelSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

fn read_excel_dispatch(source: ExcelSource<'_>) -> IngestResult<Workbook> {
    #[cfg(feature = "excel")]
    {
        match source {
            ExcelSource::Path(path) => excel::read_excel_workbook_from_path(path),
            ExcelSource::Bytes(bytes) => excel::read_excel_workbook_from_bytes(bytes),
        }
    }

    #[cfg(not(feature = "excel"))]
    {
        // Avoid unused warnings when the feature is off.
        let _ = source;
        Err(IngestError::invalid_input(
            "excel reading not enabled (enable cargo feature 'excel')",
        ))
    }
}
