use std::fs;

use sheet_ingest::admin::{self, AdminGate};
use sheet_ingest::config::EngineConfig;
use sheet_ingest::engine::{AppendOptions, Engine, IngestOptions, append_sheet, ingest_workbook};
use sheet_ingest::registry::{
    EMBEDDED_FILES_TABLE, embed_bytes, embed_file, fetch_embedded, list_embedded,
};
use sheet_ingest::remote::{DirectoryArchive, RemoteArchive, publish_file};
use sheet_ingest::store::Store;
use sheet_ingest::types::{Sheet, Value, Workbook};
use sheet_ingest::{ErrorKind, IngestError};

fn two_sheet_workbook() -> Workbook {
    Workbook::new(vec![
        Sheet::with_headers("A", &["x"]).row(vec![Value::from(1i64)]),
        Sheet::with_headers("B", &["y"]).row(vec![Value::from(2i64)]),
    ])
}

#[test]
fn source_files_can_be_embedded_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("people.csv");
    fs::copy("tests/fixtures/people.csv", &source).unwrap();

    let store = Store::open_path(dir.path().join("db.sqlite")).unwrap();
    let id = embed_file(&store, &source).unwrap();

    let listed = list_embedded(&store).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_name, "people.csv");

    let blob = fetch_embedded(&store, id).unwrap().unwrap();
    assert_eq!(blob.bytes, fs::read(&source).unwrap());
    assert!(store.table_names().unwrap().contains(&EMBEDDED_FILES_TABLE.to_string()));
}

#[test]
fn ingest_and_append_never_touch_the_registry() {
    let mut store = Store::open_in_memory().unwrap();
    embed_bytes(&store, "source.xlsx", b"PK").unwrap();

    let workbook = Workbook::new(vec![
        Sheet::with_headers("Files", &["a"]).row(vec![Value::from(1i64)]),
    ]);
    let err = ingest_workbook(&mut store, &workbook, "Embedded", &IngestOptions::default())
        .unwrap_err();
    assert!(matches!(&err, IngestError::NameCollision { name } if name == EMBEDDED_FILES_TABLE));

    let err = append_sheet(
        &mut store,
        "Embedded Files",
        &workbook.sheets[0],
        &AppendOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NameCollision);

    let listed = list_embedded(&store).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_name, "source.xlsx");
}

#[test]
fn listing_an_empty_database_does_not_create_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::with_database(dir.path().join("db.sqlite")));
    assert!(engine.list_embedded().unwrap().is_empty());
    assert!(engine.fetch_embedded(1).unwrap().is_none());
    assert!(engine.tables().unwrap().is_empty());
}

#[test]
fn drops_require_a_token_from_the_gate() {
    let mut store = Store::open_in_memory().unwrap();
    ingest_workbook(&mut store, &two_sheet_workbook(), "o", &IngestOptions::default()).unwrap();

    let gate = AdminGate::new(Some("letmein".to_string()));
    assert!(matches!(gate.authenticate("nope"), Err(IngestError::Unauthorized)));
    let token = gate.authenticate("letmein").unwrap();

    assert_eq!(admin::drop_table(&mut store, &token, "O A").unwrap(), "o_a");
    assert_eq!(store.table_names().unwrap(), vec!["o_b"]);

    let err = admin::drop_table(&mut store, &token, "o_a").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let dropped = admin::drop_all_tables(&mut store, &token).unwrap();
    assert_eq!(dropped, vec!["o_b"]);
    assert!(store.table_names().unwrap().is_empty());
}

#[test]
fn engine_gate_uses_the_configured_secret() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::with_database(dir.path().join("db.sqlite")));
    assert!(engine.admin_gate().authenticate("").is_err());

    let engine = Engine::new(EngineConfig {
        admin_secret: Some("s".to_string()),
        ..EngineConfig::with_database(dir.path().join("db.sqlite"))
    });
    engine.ingest(&two_sheet_workbook(), "o").unwrap();
    let token = engine.admin_gate().authenticate("s").unwrap();
    engine.drop_all_tables(&token).unwrap();
    assert!(engine.tables().unwrap().is_empty());
}

#[test]
fn publishing_refuses_to_overwrite_unless_asked() {
    let dir = tempfile::tempdir().unwrap();
    let remote_dir = dir.path().join("remote");
    fs::create_dir(&remote_dir).unwrap();
    let archive = DirectoryArchive::new(&remote_dir).unwrap();

    let source = dir.path().join("report.xlsx");
    fs::write(&source, b"v1").unwrap();
    let first = publish_file(&archive, &source, None, false).unwrap();
    assert_eq!(first.remote_name, "report.xlsx");
    assert!(!first.replaced);
    assert!(archive.exists("report.xlsx").unwrap());

    fs::write(&source, b"v2").unwrap();
    let err = publish_file(&archive, &source, None, false).unwrap_err();
    assert!(matches!(err, IngestError::NameCollision { ref name } if name == "report.xlsx"));
    assert_eq!(fs::read(remote_dir.join("report.xlsx")).unwrap(), b"v1");

    let second = publish_file(&archive, &source, None, true).unwrap();
    assert!(second.replaced);
    assert_eq!(fs::read(remote_dir.join("report.xlsx")).unwrap(), b"v2");

    let renamed = publish_file(&archive, &source, Some("copy.xlsx"), false).unwrap();
    assert_eq!(renamed.remote_name, "copy.xlsx");
}

#[test]
fn engine_embeds_and_publishes() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::with_database(dir.path().join("db.sqlite")));
    let id = engine.embed_file("tests/fixtures/people.csv").unwrap();
    assert_eq!(engine.fetch_embedded(id).unwrap().unwrap().file_name, "people.csv");
    assert_eq!(engine.list_embedded().unwrap().len(), 1);

    let archive = DirectoryArchive::new(dir.path()).unwrap();
    let report = engine
        .publish(&archive, "tests/fixtures/people.csv", None, false)
        .unwrap();
    assert_eq!(report.remote_name, "people.csv");
}
