//! Operation outcome reporting.
//!
//! The [`crate::engine::Engine`] facade reports every ingest/append/merge to an optional
//! [`OperationObserver`]. Failures get a [`Severity`]; failures at or above the configured
//! threshold are additionally raised through [`OperationObserver::on_alert`].

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;

use crate::error::{ErrorKind, IngestError};

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation rejected; nothing written).
    Error,
    /// Critical error (storage or I/O failure; state must be re-verified).
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        })
    }
}

/// Which engine operation an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Ingest,
    Append,
    Merge,
    Embed,
    Publish,
    Drop,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Ingest => "ingest",
            Operation::Append => "append",
            Operation::Merge => "merge",
            Operation::Embed => "embed",
            Operation::Publish => "publish",
            Operation::Drop => "drop",
        }
    }

    /// What the context's `target` names for this operation.
    fn target_label(self) -> &'static str {
        match self {
            Operation::Ingest => "source",
            Operation::Append | Operation::Drop => "table",
            Operation::Merge => "targets",
            Operation::Embed | Operation::Publish => "file",
        }
    }
}

/// Context about an operation attempt.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub operation: Operation,
    /// Owner name, table name or file path the operation targeted.
    pub target: String,
}

impl OperationContext {
    /// Human summary of a successful outcome, worded for the operation.
    pub fn outcome(&self, stats: OperationStats) -> String {
        let OperationStats { tables, rows } = stats;
        match self.operation {
            Operation::Ingest => format!("{rows} row(s) written to {tables} table(s)"),
            Operation::Append => format!("{rows} row(s) appended"),
            Operation::Merge => format!("{tables} table(s) created with {rows} row(s)"),
            Operation::Embed => "stored in the registry".to_string(),
            Operation::Publish => "uploaded".to_string(),
            Operation::Drop => format!("{tables} table(s) dropped"),
        }
    }
}

impl fmt::Display for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}='{}'",
            self.operation.as_str(),
            self.operation.target_label(),
            self.target
        )
    }
}

/// Minimal stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationStats {
    /// Tables created, replaced or extended.
    pub tables: usize,
    /// Rows written.
    pub rows: usize,
}

/// Observer interface for operation outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait OperationObserver: Send + Sync {
    /// Called when an operation succeeds.
    fn on_success(&self, _ctx: &OperationContext, _stats: OperationStats) {}

    /// Called when an operation fails.
    fn on_failure(&self, _ctx: &OperationContext, _severity: Severity, _error: &IngestError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &IngestError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Severity assigned to an error: storage and I/O failures are critical, rejections are errors.
pub fn severity_for_error(e: &IngestError) -> Severity {
    match e {
        IngestError::Io(_) => Severity::Critical,
        IngestError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        other if other.kind() == ErrorKind::Storage => Severity::Critical,
        _ => Severity::Error,
    }
}

/// Fans every callback out to each wrapped observer, in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn OperationObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn OperationObserver>>) -> Self {
        Self { observers }
    }

    fn each(&self, f: impl Fn(&dyn OperationObserver)) {
        self.observers.iter().for_each(|o| f(o.as_ref()));
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl OperationObserver for CompositeObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        self.each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &IngestError) {
        self.each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &IngestError) {
        self.each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Forwards events to the `log` facade (target `sheet_ingest::ops`).
///
/// Rejections log at `warn`; storage and I/O failures at `error`.
#[derive(Debug, Default)]
pub struct LogObserver;

impl OperationObserver for LogObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        log::info!(target: "sheet_ingest::ops", "{ctx}: {}", ctx.outcome(stats));
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &IngestError) {
        let level = match severity {
            Severity::Info => log::Level::Info,
            Severity::Warning | Severity::Error => log::Level::Warn,
            Severity::Critical => log::Level::Error,
        };
        log::log!(
            target: "sheet_ingest::ops",
            level,
            "{ctx}: rejected as {:?} ({severity}): {error}",
            error.kind()
        );
    }

    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &IngestError) {
        log::error!(
            target: "sheet_ingest::ops",
            "ALERT {ctx}: {severity} {:?}: {error}",
            error.kind()
        );
    }
}

/// Prints one line per event to stderr, for command-line callers without a logger.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl OperationObserver for StdErrObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        eprintln!("sheet-ingest: {ctx}: {}", ctx.outcome(stats));
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &IngestError) {
        let hint = if error.is_storage() {
            "; re-check the target before retrying"
        } else {
            "; nothing was written"
        };
        eprintln!("sheet-ingest: {ctx} failed ({severity}): {error}{hint}");
    }

    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &IngestError) {
        eprintln!("sheet-ingest: ALERT [{severity}] {ctx}: {error}");
    }
}

/// Appends one tab-separated record per event to a local file:
/// `timestamp  status  operation  target  detail`.
///
/// Writes are best-effort; a log file that cannot be opened or written is skipped.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn record(&self, status: &str, ctx: &OperationContext, detail: &str) {
        let line = format!(
            "{}\t{status}\t{}\t{}\t{}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            ctx.operation.as_str(),
            ctx.target,
            detail.replace(['\t', '\n'], " ")
        );
        let _guard = self.lock.lock().ok();
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut f) => {
                if let Err(e) = writeln!(f, "{line}") {
                    log::debug!("operation log {}: {e}", self.path.display());
                }
            }
            Err(e) => log::debug!("operation log {}: {e}", self.path.display()),
        }
    }
}

impl OperationObserver for FileObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        self.record("ok", ctx, &ctx.outcome(stats));
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &IngestError) {
        self.record(&severity.to_string(), ctx, &format!("{:?}: {error}", error.kind()));
    }

    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &IngestError) {
        self.record(
            &format!("alert:{severity}"),
            ctx,
            &format!("{:?}: {error}", error.kind()),
        );
    }
}
