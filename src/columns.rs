//! Column header reconciliation and schema comparison.

use std::collections::{HashMap, HashSet};

use crate::error::{IngestError, IngestResult};
use crate::fingerprint::ROW_HASH_COLUMN;
use crate::naming::Identifier;

/// Turn raw sheet headers into a same-length list of column identifiers.
///
/// Runs in three phases, in this order:
///
/// 1. trim and lower-case each header;
/// 2. suffix repeats of an already-seen cleaned name with `_1`, `_2`, ... (counter per name);
/// 3. normalize every result with [`Identifier::normalize`].
///
/// Deduplication runs before sanitization, so `"a b"` and `"a-b"` are *not* suffixed even though
/// both normalize to `a_b`. Use [`ensure_distinct`] to reject such lists before writing them.
pub fn reconcile_columns<S: AsRef<str>>(raw_headers: &[S]) -> Vec<Identifier> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw_headers
        .iter()
        .map(|raw| {
            let cleaned = raw.as_ref().trim().to_lowercase();
            let deduped = match seen.get_mut(&cleaned) {
                Some(count) => {
                    *count += 1;
                    format!("{cleaned}_{count}")
                }
                None => {
                    seen.insert(cleaned.clone(), 0);
                    cleaned
                }
            };
            Identifier::normalize(&deduped)
        })
        .collect()
}

/// Exact, order-sensitive comparison of two column lists after trimming and lower-casing.
pub fn schemas_equal<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(left, right)| comparable(left.as_ref()) == comparable(right.as_ref()))
}

fn comparable(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Position of the reserved `row_hash` column, if present.
pub fn row_hash_position<S: AsRef<str>>(columns: &[S]) -> Option<usize> {
    columns
        .iter()
        .position(|c| comparable(c.as_ref()) == ROW_HASH_COLUMN)
}

/// The column list with the reserved `row_hash` column removed.
pub fn without_row_hash<S: AsRef<str> + Clone>(columns: &[S]) -> Vec<S> {
    columns
        .iter()
        .filter(|c| comparable(c.as_ref()) != ROW_HASH_COLUMN)
        .cloned()
        .collect()
}

/// Fail with `InvalidInput` if two reconciled columns ended up with the same identifier.
pub fn ensure_distinct(columns: &[Identifier], context: &str) -> IngestResult<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(IngestError::invalid_input(format!(
                "{context}: several headers normalize to column '{column}'"
            )));
        }
    }
    Ok(())
}

pub(crate) fn to_strings(columns: &[Identifier]) -> Vec<String> {
    columns.iter().map(|c| c.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(ids: &[Identifier]) -> Vec<&str> {
        ids.iter().map(|i| i.as_str()).collect()
    }

    #[test]
    fn case_and_whitespace_variants_are_duplicates() {
        let out = reconcile_columns(&["ID", "id", " Id "]);
        assert_eq!(names(&out), vec!["id", "id_1", "id_2"]);
    }

    #[test]
    fn counters_are_scoped_per_name() {
        let out = reconcile_columns(&["a", "b", "a", "b", "a"]);
        assert_eq!(names(&out), vec!["a", "b", "a_1", "b_1", "a_2"]);
    }

    #[test]
    fn sanitization_runs_after_dedup() {
        let out = reconcile_columns(&["Order ID", "Order-ID", "Total $"]);
        assert_eq!(names(&out), vec!["order_id", "order_id", "total_"]);
        assert!(ensure_distinct(&out, "sheet 'x'").is_err());
    }

    #[test]
    fn blank_headers_get_placeholder_names() {
        let out = reconcile_columns(&["", "  ", "name"]);
        assert_eq!(names(&out), vec!["_", "_1", "name"]);
        assert!(ensure_distinct(&out, "sheet").is_ok());
    }

    #[test]
    fn schema_comparison_is_order_sensitive() {
        assert!(schemas_equal(&["name", "date"], &[" Name", "DATE "]));
        assert!(!schemas_equal(&["name", "date"], &["date", "name"]));
        assert!(!schemas_equal(&["name"], &["name", "date"]));
    }

    #[test]
    fn row_hash_is_recognised_case_insensitively() {
        let cols = vec!["name".to_string(), "Row_Hash".to_string()];
        assert_eq!(row_hash_position(&cols), Some(1));
        assert_eq!(without_row_hash(&cols), vec!["name".to_string()]);
    }

    proptest! {
        #[test]
        fn reconcile_preserves_length(headers in proptest::collection::vec(".{0,8}", 0..12)) {
            prop_assert_eq!(reconcile_columns(&headers).len(), headers.len());
        }
    }
}
