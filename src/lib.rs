//! `sheet-ingest` loads spreadsheet workbooks into a local SQLite database, one table per sheet,
//! and keeps those tables consistent as more data arrives.
//!
//! Every derived table carries a trailing `row_hash` column: an MD5 fingerprint of the row's
//! canonical text, used to recognise rows that were already loaded.
//!
//! ## What you can do
//!
//! - **Ingest** a workbook ([`engine::ingest_workbook`]): each sheet becomes table
//!   `<owner>_<sheet>`. Headers are reconciled (trimmed, lower-cased, de-duplicated with `_1`,
//!   `_2`, ... and normalized to identifiers). Re-ingesting replaces the table by default; see
//!   [`engine::WriteMode`] for create-only and append modes.
//! - **Append** a sheet to an existing table ([`engine::append_sheet`]) when its columns match,
//!   optionally skipping rows whose fingerprint is already stored.
//! - **Merge** two workbooks holding the same sheets and columns into new tables
//!   ([`engine::merge_workbooks`]).
//!
//! Each of these validates its whole input before writing and writes in one transaction, so a
//! rejected call leaves the database as it was.
//!
//! **Input formats (by extension):** `.csv` (one sheet), and with the default `excel` feature
//! `.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`.
//!
//! ## Quick example
//!
//! ```rust
//! use sheet_ingest::engine::{IngestOptions, ingest_workbook};
//! use sheet_ingest::store::Store;
//! use sheet_ingest::types::{Sheet, Value, Workbook};
//!
//! # fn main() -> Result<(), sheet_ingest::IngestError> {
//! let mut store = Store::open_in_memory()?;
//! let workbook = Workbook::new(vec![
//!     Sheet::with_headers("Orders", &["Order ID", "Customer Name!"])
//!         .row(vec![Value::from(1i64), Value::from("Ada")])
//!         .row(vec![Value::from(2i64), Value::from("Grace")]),
//! ]);
//!
//! let report = ingest_workbook(&mut store, &workbook, "Sales", &IngestOptions::default())?;
//! assert_eq!(report.table_names(), vec!["sales_orders"]);
//! assert_eq!(
//!     report.tables[0].columns,
//!     vec!["order_id", "customer_name_", "row_hash"]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! For a configured entry point with a database path, observers and alert thresholds, see
//! [`engine::Engine`].
//!
//! ## Modules
//!
//! - [`naming`]: identifier normalization
//! - [`fingerprint`]: canonical row text and `row_hash`
//! - [`columns`]: header reconciliation and schema comparison
//! - [`reader`]: CSV and workbook readers
//! - [`store`]: the SQLite store
//! - [`engine`]: ingest, append and merge, plus the [`engine::Engine`] facade
//! - [`registry`], [`remote`], [`admin`]: embedded files, archive publishing, gated drops
//! - [`config`], [`observability`], [`error`]

pub mod admin;
pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod naming;
pub mod observability;
pub mod reader;
pub mod registry;
pub mod remote;
pub mod store;
pub mod types;

pub use columns::{reconcile_columns, schemas_equal};
pub use engine::{Engine, WriteMode};
pub use error::{ErrorKind, IngestError, IngestResult};
pub use fingerprint::row_fingerprint;
pub use naming::{Identifier, normalize_identifier};
