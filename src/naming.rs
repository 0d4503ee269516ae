//! Storage-safe identifiers for tables and columns.
//!
//! [`normalize_identifier`] is total: any input, including the empty string, maps to a valid
//! [`Identifier`]. Distinct inputs may map to the same identifier; uniqueness is the job of
//! [`crate::columns::reconcile_columns`] and of the catalog checks in the engines.

use std::fmt;

use crate::error::{IngestError, IngestResult};

/// A lower-case name made of letters, digits and underscores that does not start with a digit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Normalize arbitrary text into an identifier. Never fails.
    pub fn normalize(raw: &str) -> Self {
        Identifier(normalize_text(raw))
    }

    /// Accept `raw` only if it already is a valid identifier.
    pub fn parse(raw: &str) -> IngestResult<Self> {
        if is_identifier(raw) {
            Ok(Identifier(raw.to_string()))
        } else {
            Err(IngestError::invalid_input(format!(
                "'{raw}' is not a valid identifier"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Join two identifiers with `_`, as used for `<owner>_<sheet>` table names.
    pub fn join(&self, other: &Identifier) -> Identifier {
        Identifier(format!("{}_{}", self.0, other.0))
    }

    /// Double-quoted form for embedding in SQL text.
    pub(crate) fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Map arbitrary human text (file, sheet or column name) to an [`Identifier`].
///
/// Every maximal run of characters other than letters, digits and `_` becomes a single `_`,
/// leading underscores are stripped, a `_` is prefixed when the result is empty or starts with a
/// digit, and the result is lower-cased.
pub fn normalize_identifier(raw: &str) -> Identifier {
    Identifier::normalize(raw)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn normalize_text(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if is_word_char(c) {
            collapsed.push(c);
            in_run = false;
        } else if !in_run {
            collapsed.push('_');
            in_run = true;
        }
    }

    let trimmed = collapsed.trim_start_matches('_');
    let needs_prefix = trimmed.chars().next().is_none_or(|c| c.is_numeric());
    let mut out = String::with_capacity(trimmed.len() + 1);
    if needs_prefix {
        out.push('_');
    }
    out.push_str(trimmed);

    // Lower-casing can expand characters (e.g. 'İ'); re-filter so the result stays a word.
    out.to_lowercase().chars().filter(|c| is_word_char(*c)).collect()
}

fn is_identifier(raw: &str) -> bool {
    let mut chars = raw.chars();
    match chars.next() {
        None => false,
        Some(first) if first.is_numeric() => false,
        Some(_) => raw.chars().all(is_word_char) && raw.to_lowercase() == raw,
    }
}
