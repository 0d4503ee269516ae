use std::collections::HashMap;

use sheet_ingest::engine::{IngestOptions, ingest_workbook, merge_workbooks};
use sheet_ingest::store::Store;
use sheet_ingest::types::{Sheet, Value, Workbook};
use sheet_ingest::{ErrorKind, IngestError, Identifier};

fn people(name: &str, rows: &[&str]) -> Sheet {
    rows.iter().fold(Sheet::with_headers(name, &["Name", "Team"]), |s, n| {
        s.row(vec![Value::from(*n), Value::from("core")])
    })
}

fn orders(rows: &[i64]) -> Sheet {
    rows.iter().fold(Sheet::with_headers("Orders", &["Order ID"]), |s, id| {
        s.row(vec![Value::from(*id)])
    })
}

fn targets(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn ident(name: &str) -> Identifier {
    Identifier::parse(name).unwrap()
}

#[test]
fn merge_puts_right_rows_before_left_rows() {
    let mut store = Store::open_in_memory().unwrap();
    let left = Workbook::new(vec![people("People", &["ada", "grace"]), orders(&[1])]);
    let right = Workbook::new(vec![orders(&[2, 3]), people(" people ", &["linus"])]);

    let report = merge_workbooks(
        &mut store,
        &left,
        &right,
        &targets(&[("PEOPLE", "All People"), ("orders", "all_orders")]),
    )
    .unwrap();

    assert_eq!(report.table_names(), vec!["all_people", "all_orders"]);
    assert_eq!(report.tables[0].row_count, 3);

    let data = store.read_table(&ident("all_people"), None).unwrap();
    let names: Vec<&Value> = data.rows.iter().map(|r| &r[0]).collect();
    assert_eq!(
        names,
        vec![&Value::from("linus"), &Value::from("ada"), &Value::from("grace")]
    );
    assert_eq!(data.columns, vec!["name", "team", "row_hash"]);

    let orders = store.read_table(&ident("all_orders"), None).unwrap();
    assert_eq!(orders.row_count(), 3);
    assert_eq!(orders.rows[0][0], Value::Int64(2));
}

#[test]
fn sheet_set_mismatch_creates_nothing() {
    let mut store = Store::open_in_memory().unwrap();
    let left = Workbook::new(vec![people("People", &["ada"]), orders(&[1])]);
    let right = Workbook::new(vec![people("People", &["grace"])]);

    let err = merge_workbooks(
        &mut store,
        &left,
        &right,
        &targets(&[("People", "p"), ("Orders", "o")]),
    )
    .unwrap_err();

    match err {
        IngestError::SheetSetMismatch {
            only_in_left,
            only_in_right,
        } => {
            assert_eq!(only_in_left, vec!["Orders"]);
            assert!(only_in_right.is_empty());
        }
        other => panic!("expected SheetSetMismatch, got {other:?}"),
    }
    assert!(store.table_names().unwrap().is_empty());
}

#[test]
fn one_mismatched_sheet_creates_no_tables() {
    let mut store = Store::open_in_memory().unwrap();
    let left = Workbook::new(vec![people("People", &["ada"]), orders(&[1])]);
    let bad_orders = Sheet::with_headers("Orders", &["Order ID", "Total"])
        .row(vec![Value::from(2i64), Value::from(9.5)]);
    let right = Workbook::new(vec![people("People", &["grace"]), bad_orders]);

    let err = merge_workbooks(
        &mut store,
        &left,
        &right,
        &targets(&[("People", "p"), ("Orders", "o")]),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    assert!(err.to_string().contains("Orders"));
    assert!(store.table_names().unwrap().is_empty());
}

#[test]
fn existing_target_table_is_a_collision() {
    let mut store = Store::open_in_memory().unwrap();
    let existing = Workbook::new(vec![orders(&[9])]);
    ingest_workbook(&mut store, &existing, "all", &IngestOptions::default()).unwrap();

    let left = Workbook::new(vec![people("People", &["ada"]), orders(&[1])]);
    let right = Workbook::new(vec![people("People", &["grace"]), orders(&[2])]);
    let err = merge_workbooks(
        &mut store,
        &left,
        &right,
        &targets(&[("People", "merged_people"), ("Orders", "All Orders")]),
    )
    .unwrap_err();

    assert!(matches!(&err, IngestError::NameCollision { name } if name == "all_orders"));
    assert_eq!(store.table_names().unwrap(), vec!["all_orders"]);
    assert_eq!(store.row_count(&ident("all_orders")).unwrap(), 1);
}

#[test]
fn two_sheets_cannot_share_a_target() {
    let mut store = Store::open_in_memory().unwrap();
    let left = Workbook::new(vec![people("People", &["ada"]), orders(&[1])]);
    let right = Workbook::new(vec![people("People", &["grace"]), orders(&[2])]);
    let err = merge_workbooks(
        &mut store,
        &left,
        &right,
        &targets(&[("People", "merged"), ("Orders", "Merged")]),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NameCollision);
    assert!(store.table_names().unwrap().is_empty());
}

#[test]
fn missing_target_and_empty_inputs_are_invalid() {
    let mut store = Store::open_in_memory().unwrap();
    let left = Workbook::new(vec![people("People", &["ada"])]);
    let right = Workbook::new(vec![people("People", &["grace"])]);

    let err = merge_workbooks(&mut store, &left, &right, &targets(&[])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = merge_workbooks(&mut store, &left, &right, &targets(&[("People", "  ")])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err =
        merge_workbooks(&mut store, &Workbook::default(), &right, &targets(&[])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(store.table_names().unwrap().is_empty());
}

#[test]
fn target_matching_a_mixed_case_table_is_a_collision() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.sqlite");
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch(r#"CREATE TABLE "Orders" (legacy TEXT)"#)
        .unwrap();

    let mut store = Store::open_path(&path).unwrap();
    let left = Workbook::new(vec![orders(&[1])]);
    let right = Workbook::new(vec![orders(&[2])]);
    let err = merge_workbooks(&mut store, &left, &right, &targets(&[("Orders", "orders")]))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NameCollision);
    assert!(!err.is_storage());
    assert_eq!(store.table_names().unwrap(), vec!["Orders"]);
}

#[test]
fn reserved_and_registry_targets_are_refused() {
    let mut store = Store::open_in_memory().unwrap();
    let left = Workbook::new(vec![orders(&[1])]);
    let right = Workbook::new(vec![orders(&[2])]);

    let err = merge_workbooks(&mut store, &left, &right, &targets(&[("Orders", "embedded files")]))
        .unwrap_err();
    assert!(matches!(&err, IngestError::NameCollision { name } if name == "embedded_files"));

    let err = merge_workbooks(&mut store, &left, &right, &targets(&[("Orders", "sqlite_orders")]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(store.table_names().unwrap().is_empty());
}
