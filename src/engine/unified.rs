//! Configured entry point over the engines.
//!
//! [`Engine`] opens a fresh [`Store`] on the configured database for every call and closes it on
//! every exit path. When an [`OperationObserver`] is attached it reports:
//!
//! - `on_success` on success, with table and row counts
//! - `on_failure` on failure, with a computed severity
//! - `on_alert` on failure when that severity is >= `config.alert_at_or_above`

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::admin::{self, AdminGate, AdminToken};
use crate::config::EngineConfig;
use crate::error::IngestResult;
use crate::naming::Identifier;
use crate::observability::{
    Operation, OperationContext, OperationObserver, OperationStats, severity_for_error,
};
use crate::reader::WorkbookFormat;
use crate::registry::{self, EmbeddedBlob, EmbeddedFile};
use crate::remote::{self, PublishReport, RemoteArchive};
use crate::store::Store;
use crate::types::{Sheet, TableData, Workbook};

use super::WriteMode;
use super::append::{AppendOptions, AppendReport, append_sheet};
use super::ingest::{IngestOptions, IngestReport, ingest_path, ingest_workbook};
use super::merge::{MergeReport, merge_workbooks};

/// Ingestion, append and merge against one database file.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use sheet_ingest::config::EngineConfig;
/// use sheet_ingest::engine::Engine;
/// use sheet_ingest::observability::LogObserver;
///
/// # fn main() -> Result<(), sheet_ingest::IngestError> {
/// let engine = Engine::new(EngineConfig::with_database("reports.sqlite"))
///     .with_observer(Arc::new(LogObserver));
///
/// // Sheet `Q1` of `Sales 2024.xlsx` lands in table `sales_2024_q1`.
/// let report = engine.ingest_path("Sales 2024.xlsx", None)?;
/// for table in &report.tables {
///     println!("{} rows -> {}", table.row_count, table.table_name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    observer: Option<Arc<dyn OperationObserver>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("database", &self.config.database)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn OperationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open a connection to the configured database.
    pub fn open_store(&self) -> IngestResult<Store> {
        Store::open_path(&self.config.database)
    }

    /// Ingest `workbook` under `owner`, replacing existing tables of the same names.
    pub fn ingest(&self, workbook: &Workbook, owner: &str) -> IngestResult<IngestReport> {
        self.ingest_with(workbook, owner, WriteMode::Replace)
    }

    pub fn ingest_with(
        &self,
        workbook: &Workbook,
        owner: &str,
        mode: WriteMode,
    ) -> IngestResult<IngestReport> {
        let options = self.ingest_options(mode);
        self.run(
            Operation::Ingest,
            owner,
            |store| ingest_workbook(store, workbook, owner, &options),
            ingest_stats,
        )
    }

    /// Read and ingest the workbook at `path`; `owner` defaults to the file stem.
    pub fn ingest_path(
        &self,
        path: impl AsRef<Path>,
        owner: Option<&str>,
    ) -> IngestResult<IngestReport> {
        let path = path.as_ref();
        let options = self.ingest_options(WriteMode::Replace);
        self.run(
            Operation::Ingest,
            path.display().to_string(),
            |store| ingest_path(store, path, owner, None::<WorkbookFormat>, &options),
            ingest_stats,
        )
    }

    /// Append `sheet` to `table`, deduplicating when `config.dedup_on_append` is set.
    pub fn append(&self, table: &str, sheet: &Sheet) -> IngestResult<AppendReport> {
        let options = AppendOptions {
            dedup: self.config.dedup_on_append,
        };
        self.append_with(table, sheet, &options)
    }

    pub fn append_with(
        &self,
        table: &str,
        sheet: &Sheet,
        options: &AppendOptions,
    ) -> IngestResult<AppendReport> {
        self.run(
            Operation::Append,
            table,
            |store| append_sheet(store, table, sheet, options),
            |r| OperationStats {
                tables: 1,
                rows: r.appended,
            },
        )
    }

    pub fn merge(
        &self,
        left: &Workbook,
        right: &Workbook,
        targets: &HashMap<String, String>,
    ) -> IngestResult<MergeReport> {
        let mut names: Vec<&str> = targets.values().map(String::as_str).collect();
        names.sort_unstable();
        self.run(
            Operation::Merge,
            names.join(","),
            |store| merge_workbooks(store, left, right, targets),
            |r| OperationStats {
                tables: r.tables.len(),
                rows: r.tables.iter().map(|t| t.row_count).sum(),
            },
        )
    }

    /// Table names in the catalog, sorted.
    pub fn tables(&self) -> IngestResult<Vec<String>> {
        self.open_store()?.table_names()
    }

    /// Read a table (first `limit` rows when given). The name is normalized first.
    pub fn read_table(&self, name: &str, limit: Option<usize>) -> IngestResult<TableData> {
        self.open_store()?
            .read_table(&Identifier::normalize(name), limit)
    }

    /// Store the file at `path` verbatim in the embedded-file registry.
    pub fn embed_file(&self, path: impl AsRef<Path>) -> IngestResult<i64> {
        let path = path.as_ref();
        self.run(
            Operation::Embed,
            path.display().to_string(),
            |store| registry::embed_file(store, path),
            |_| OperationStats { tables: 1, rows: 1 },
        )
    }

    pub fn list_embedded(&self) -> IngestResult<Vec<EmbeddedFile>> {
        registry::list_embedded(&self.open_store()?)
    }

    pub fn fetch_embedded(&self, id: i64) -> IngestResult<Option<EmbeddedBlob>> {
        registry::fetch_embedded(&self.open_store()?, id)
    }

    /// Upload the file at `path` to `archive`. See [`remote::publish_file`].
    pub fn publish<A: RemoteArchive + ?Sized>(
        &self,
        archive: &A,
        path: impl AsRef<Path>,
        dest_name: Option<&str>,
        overwrite: bool,
    ) -> IngestResult<PublishReport> {
        let path = path.as_ref();
        let ctx = OperationContext {
            operation: Operation::Publish,
            target: path.display().to_string(),
        };
        let result = remote::publish_file(archive, path, dest_name, overwrite);
        self.report(&ctx, &result, |_| OperationStats::default());
        result
    }

    /// Gate configured with `config.admin_secret`.
    pub fn admin_gate(&self) -> AdminGate {
        AdminGate::new(self.config.admin_secret.clone())
    }

    pub fn drop_table(&self, token: &AdminToken, name: &str) -> IngestResult<String> {
        self.run(
            Operation::Drop,
            name,
            |store| admin::drop_table(store, token, name),
            |_| OperationStats { tables: 1, rows: 0 },
        )
    }

    pub fn drop_all_tables(&self, token: &AdminToken) -> IngestResult<Vec<String>> {
        self.run(
            Operation::Drop,
            "*",
            |store| admin::drop_all_tables(store, token),
            |names| OperationStats {
                tables: names.len(),
                rows: 0,
            },
        )
    }

    fn ingest_options(&self, mode: WriteMode) -> IngestOptions {
        IngestOptions {
            mode,
            preview_rows: self.config.preview_rows,
        }
    }

    fn run<T>(
        &self,
        operation: Operation,
        target: impl Into<String>,
        op: impl FnOnce(&mut Store) -> IngestResult<T>,
        stats: impl FnOnce(&T) -> OperationStats,
    ) -> IngestResult<T> {
        let ctx = OperationContext {
            operation,
            target: target.into(),
        };
        let result = self.open_store().and_then(|mut store| op(&mut store));
        self.report(&ctx, &result, stats);
        result
    }

    fn report<T>(
        &self,
        ctx: &OperationContext,
        result: &IngestResult<T>,
        stats: impl FnOnce(&T) -> OperationStats,
    ) {
        let Some(obs) = self.observer.as_ref() else {
            return;
        };
        match result {
            Ok(value) => obs.on_success(ctx, stats(value)),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(ctx, sev, e);
                if sev >= self.config.alert_at_or_above {
                    obs.on_alert(ctx, sev, e);
                }
            }
        }
    }
}

fn ingest_stats(report: &IngestReport) -> OperationStats {
    OperationStats {
        tables: report.tables.len(),
        rows: report.total_rows(),
    }
}
