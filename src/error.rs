use thiserror::Error;

/// Convenience result type for ingestion, append and merge operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Error type returned by every operation in this crate.
///
/// Validation failures (`InvalidInput`, `SchemaMismatch`, `SheetSetMismatch`, `NameCollision`,
/// `TableNotFound`) are always raised before the store is touched. [`IngestError::Storage`] is the
/// only variant that can leave a table in an unknown state; see [`IngestError::is_storage`].
#[derive(Debug, Error)]
pub enum IngestError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook could not be opened or a sheet could not be read (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV workbook source could not be parsed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The workbook or a caller argument is unusable (no sheets, ambiguous names, ...).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Column sets differ after reconciliation.
    #[error("schema mismatch for {context}: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        context: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// Two workbooks being merged do not contain the same (case-insensitive) sheet names.
    #[error(
        "sheet sets differ: only in left {only_in_left:?}, only in right {only_in_right:?}"
    )]
    SheetSetMismatch {
        only_in_left: Vec<String>,
        only_in_right: Vec<String>,
    },

    /// A table (or remote file) with this name already exists where creation was required.
    #[error("name collision: '{name}' already exists")]
    NameCollision { name: String },

    /// The named table is not present in the catalog.
    #[error("table '{table}' does not exist")]
    TableNotFound { table: String },

    /// Administrative authentication failed or was never configured.
    #[error("unauthorized: administrative secret missing or incorrect")]
    Unauthorized,

    /// The remote archive rejected or failed an operation.
    #[error("remote archive error: {message}")]
    Remote { message: String },

    /// The embedded store failed. The target table's state must be re-verified before retrying.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Coarse classification of an [`IngestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    SchemaMismatch,
    SheetSetMismatch,
    NameCollision,
    NotFound,
    Unauthorized,
    Remote,
    Storage,
}

impl IngestError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Classify this error.
    ///
    /// Workbook read failures (`Io`, `Csv`, `Excel`) count as invalid input: nothing was persisted.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Csv(_) | Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            #[cfg(feature = "excel")]
            Self::Excel(_) => ErrorKind::InvalidInput,
            Self::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            Self::SheetSetMismatch { .. } => ErrorKind::SheetSetMismatch,
            Self::NameCollision { .. } => ErrorKind::NameCollision,
            Self::TableNotFound { .. } => ErrorKind::NotFound,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// `true` when the operation was rejected before any write was attempted.
    pub fn is_validation(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Storage | ErrorKind::Remote)
    }

    /// `true` when the store failed mid-operation and the target may be partially written.
    pub fn is_storage(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}
