//! The three write paths over the store: whole-workbook ingestion, single-sheet append, and
//! two-workbook merge.
//!
//! The free functions take a caller-managed [`crate::store::Store`]. [`Engine`] wraps them with
//! configuration, a fresh connection per call and observer reporting.
//!
//! Every operation validates its whole input before the first write, so a rejected call
//! ([`crate::error::IngestError::is_validation`]) leaves the store untouched.

pub mod append;
pub mod ingest;
pub mod merge;
mod prepare;
mod unified;

pub use append::{AppendOptions, AppendReport, append_sheet};
pub use ingest::{
    DEFAULT_PREVIEW_ROWS, IngestOptions, IngestReport, IngestedTable, ingest_path, ingest_workbook,
    table_name_for,
};
pub use merge::{MergeReport, MergedTable, merge_workbooks, sheet_key};
pub use unified::Engine;

/// How [`ingest_workbook`] writes each sheet's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Drop any existing table of the same name and rebuild it from the sheet.
    #[default]
    Replace,
    /// Create the table; fail with `NameCollision` if it already exists.
    CreateOnly,
    /// Add rows to an existing table with the same columns.
    Append {
        /// Skip rows whose fingerprint is already stored.
        dedup: bool,
    },
}
