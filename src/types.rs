//! Core data model types.
//!
//! A [`Workbook`] is an ordered list of [`Sheet`]s as they arrive from a reader (or from the
//! caller). Sheet names and headers are kept exactly as authored; normalization happens in the
//! engines. [`TableData`] is what the store hands back when a table is read.

use chrono::NaiveDateTime;

/// Text layout used for date-time cells, both when fingerprinting and when persisting.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single scalar cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty cell.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Calendar date and wall-clock time without a timezone.
    DateTime(NaiveDateTime),
}

impl Value {
    /// `true` for `Null` and for text that is empty after trimming.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Utf8(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Utf8(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Utf8(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One tabular unit of a workbook: raw headers plus positional rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Sheet name as authored.
    pub name: String,
    /// Column headers as authored (may be blank or duplicated).
    pub headers: Vec<String>,
    /// Row-major cell storage, positionally aligned with `headers`.
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    /// Create a sheet from a name, headers and rows.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Convenience constructor taking anything string-like for the headers.
    pub fn with_headers<S: AsRef<str>>(name: impl Into<String>, headers: &[S]) -> Self {
        Self::new(
            name,
            headers.iter().map(|h| h.as_ref().to_string()).collect(),
            Vec::new(),
        )
    }

    /// Append a row (builder style).
    pub fn row(mut self, cells: Vec<Value>) -> Self {
        self.rows.push(cells);
        self
    }

    /// Number of rows in the sheet.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Ordered mapping from sheet name to [`Sheet`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    /// Sheets in authored order.
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Create a workbook from sheets (order is preserved).
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Look up a sheet by its exact authored name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Iterate sheet names in order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Rows read back from a persisted table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    /// Table name.
    pub name: String,
    /// Column names in table order (including `row_hash`).
    pub columns: Vec<String>,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl TableData {
    /// Number of rows read.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the index of a column by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}
