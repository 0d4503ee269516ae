//! Content fingerprints for rows.
//!
//! A fingerprint is the lowercase hex MD5 of the row's cells rendered with [`canonical_text`] and
//! joined by [`FIELD_DELIMITER`]. It is an identity key for "already imported" detection, not a
//! security boundary.

use md5::{Digest, Md5};

use crate::types::{DATETIME_FORMAT, Value};

/// Name of the reserved trailing column holding each row's fingerprint.
pub const ROW_HASH_COLUMN: &str = "row_hash";

/// Separator placed between rendered cells before hashing.
pub const FIELD_DELIMITER: char = '|';

// Largest magnitude at which every integer is exactly representable as an f64.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Render a cell the way it participates in a fingerprint.
///
/// Integral floats render like integers so `5`, `5.0` and `"5"` all produce the same text.
pub fn canonical_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int64(i) => i.to_string(),
        Value::Float64(f) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT_INT {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Utf8(s) => s.clone(),
        Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
    }
}

/// Compute the fingerprint of an ordered sequence of cells.
pub fn row_fingerprint(values: &[Value]) -> String {
    let mut joined = String::new();
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            joined.push(FIELD_DELIMITER);
        }
        joined.push_str(&canonical_text(value));
    }
    let digest = Md5::digest(joined.as_bytes());
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(cells: &[Value]) -> Vec<Value> {
        cells.to_vec()
    }

    #[test]
    fn fingerprint_is_32_hex_chars_and_stable() {
        let r = row(&[Value::from("Ada"), Value::from(1i64), Value::from(98.5f64)]);
        let first = row_fingerprint(&r);
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(first, row_fingerprint(&r));
    }

    #[test]
    fn matches_md5_of_pipe_joined_text() {
        // md5("a|1|") computed independently
        let r = row(&[Value::from("a"), Value::from(1i64), Value::Null]);
        let expected = format!("{:x}", Md5::digest(b"a|1|"));
        assert_eq!(row_fingerprint(&r), expected);
    }

    #[test]
    fn changing_any_cell_changes_the_fingerprint() {
        let base = row(&[Value::from("Ada"), Value::from(1i64), Value::from(true)]);
        let original = row_fingerprint(&base);
        for idx in 0..base.len() {
            let mut changed = base.clone();
            changed[idx] = Value::Utf8("other".to_string());
            assert_ne!(row_fingerprint(&changed), original, "cell {idx}");
        }
    }

    #[test]
    fn column_order_matters() {
        let ab = row(&[Value::from("a"), Value::from("b")]);
        let ba = row(&[Value::from("b"), Value::from("a")]);
        assert_ne!(row_fingerprint(&ab), row_fingerprint(&ba));
    }

    #[test]
    fn numeric_and_text_five_collide_intentionally() {
        let int = row_fingerprint(&[Value::Int64(5)]);
        let float = row_fingerprint(&[Value::Float64(5.0)]);
        let text = row_fingerprint(&[Value::Utf8("5".to_string())]);
        assert_eq!(int, float);
        assert_eq!(int, text);
    }

    #[test]
    fn canonical_text_renders_each_variant() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(canonical_text(&Value::Null), "");
        assert_eq!(canonical_text(&Value::Float64(2.5)), "2.5");
        assert_eq!(canonical_text(&Value::Float64(-3.0)), "-3");
        assert_eq!(canonical_text(&Value::Float64(1e20)), "100000000000000000000");
        assert_eq!(canonical_text(&Value::Float64(f64::NAN)), "NaN");
        assert_eq!(canonical_text(&Value::Bool(false)), "false");
        assert_eq!(canonical_text(&Value::DateTime(dt)), "2024-03-09 14:05:00");
    }
}
