//! Conversion between [`Value`] cells and SQLite values.

use rusqlite::types::{Value as SqlValue, ValueRef};

use crate::types::{DATETIME_FORMAT, Value};

/// Declared SQLite type for a data column, inferred from its non-empty cells.
///
/// All integers/booleans → `INTEGER`, any numeric mix → `REAL`, all date-times → `TIMESTAMP`,
/// anything else (including an all-empty column) → `TEXT`.
pub(crate) fn column_affinity(rows: &[Vec<Value>], idx: usize) -> &'static str {
    let mut integer = true;
    let mut real = true;
    let mut datetime = true;
    let mut seen = false;

    for value in rows.iter().filter_map(|r| r.get(idx)) {
        match value {
            Value::Null => continue,
            Value::Int64(_) | Value::Bool(_) => datetime = false,
            Value::Float64(_) => {
                integer = false;
                datetime = false;
            }
            Value::DateTime(_) => {
                integer = false;
                real = false;
            }
            Value::Utf8(_) => return "TEXT",
        }
        seen = true;
    }

    if !seen {
        "TEXT"
    } else if integer && real {
        "INTEGER"
    } else if real {
        "REAL"
    } else if datetime {
        "TIMESTAMP"
    } else {
        "TEXT"
    }
}

pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Int64(i) => SqlValue::Integer(*i),
        Value::Float64(f) => SqlValue::Real(*f),
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Utf8(s) => SqlValue::Text(s.clone()),
        Value::DateTime(dt) => SqlValue::Text(dt.format(DATETIME_FORMAT).to_string()),
    }
}

pub(crate) fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(bytes) => Value::Utf8(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Utf8(format!("<blob {} bytes>", bytes.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn column(values: Vec<Value>) -> Vec<Vec<Value>> {
        values.into_iter().map(|v| vec![v]).collect()
    }

    #[test]
    fn affinity_follows_cell_types() {
        assert_eq!(column_affinity(&column(vec![1i64.into(), Value::Null, true.into()]), 0), "INTEGER");
        assert_eq!(column_affinity(&column(vec![1i64.into(), 2.5f64.into()]), 0), "REAL");
        assert_eq!(column_affinity(&column(vec![1i64.into(), "x".into()]), 0), "TEXT");
        assert_eq!(column_affinity(&column(vec![Value::Null]), 0), "TEXT");

        let dt = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(column_affinity(&column(vec![dt.into()]), 0), "TIMESTAMP");
        assert_eq!(column_affinity(&column(vec![dt.into(), 1i64.into()]), 0), "TEXT");
    }

    #[test]
    fn booleans_and_datetimes_are_stored_as_integer_and_text() {
        assert_eq!(to_sql(&Value::Bool(true)), SqlValue::Integer(1));
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        assert_eq!(
            to_sql(&Value::DateTime(dt)),
            SqlValue::Text("2024-01-02 03:04:05".to_string())
        );
    }
}
