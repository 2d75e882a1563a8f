use patient_records::storage::{SqliteStorage, Storage};
use patient_records::{Database, Paging, PatientFields};

fn table_names(db: &Database) -> Vec<String> {
    let conn = db.session().unwrap();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('patient', 'diagnosis') ORDER BY name")
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

fn ann() -> PatientFields {
    PatientFields {
        name: "Ann".to_string(),
        age: Some(40),
        ssn: "123-45-6789".to_string(),
    }
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("data").join("records.db");
    let db = Database::open(&path).unwrap();
    assert!(path.exists());
    assert_eq!(db.path(), path.as_path());
}

#[test]
fn ensure_schema_creates_both_tables() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("records.db")).unwrap();
    assert!(table_names(&db).is_empty());

    db.ensure_schema().unwrap();
    assert_eq!(table_names(&db), vec!["diagnosis", "patient"]);
}

#[tokio::test]
async fn ensure_schema_is_idempotent_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("records.db")).unwrap();
    db.ensure_schema().unwrap();

    let storage = SqliteStorage::new(db.clone());
    let created = storage.create_patient(ann()).await.unwrap();

    db.ensure_schema().unwrap();
    assert_eq!(storage.get_patient(created.id).await.unwrap(), created);
}

#[tokio::test]
async fn reset_schema_drops_all_records() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("records.db")).unwrap();
    db.ensure_schema().unwrap();

    let storage = SqliteStorage::new(db.clone());
    let patient = storage.create_patient(ann()).await.unwrap();
    storage
        .create_diagnosis(
            patient.id,
            patient_records::DiagnosisFields {
                name: "flu".to_string(),
            },
        )
        .await
        .unwrap();

    db.reset_schema().unwrap();

    assert_eq!(table_names(&db), vec!["diagnosis", "patient"]);
    assert!(storage
        .list_patients(Paging::default())
        .await
        .unwrap()
        .is_empty());
}

#[test]
fn sessions_enforce_foreign_keys() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("records.db")).unwrap();
    db.ensure_schema().unwrap();

    let conn = db.session().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO diagnosis (name, patient_id) VALUES ('flu', 12)",
        [],
    );
    assert!(orphan.is_err());
}
