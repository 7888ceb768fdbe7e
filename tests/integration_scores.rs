use kwiz::ledger::{HighScore, Ledger, LEDGER_KEY};
use kwiz::store::{KvStore, SqliteStore};
use kwiz::view::{ViewModel, DISPLAY_SLOTS};

/// High scores survive reopening the database and stay ranked.
#[test]
fn scores_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("state").join("kwiz.db");

    {
        let mut view = ViewModel::default();
        let mut ledger = Ledger::new(SqliteStore::open(&db).unwrap());
        ledger.load(&mut view).unwrap();
        ledger.record("t1", 80, &mut view).unwrap();
        ledger.record("t2", 95, &mut view).unwrap();
        ledger.record("t3", 80, &mut view).unwrap();
    }

    let mut view = ViewModel::default();
    let mut ledger = Ledger::new(SqliteStore::open(&db).unwrap());
    ledger.load(&mut view).unwrap();

    let names: Vec<&str> = ledger.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["t2", "t1", "t3"]);

    let rows = view.high_score_rows();
    assert_eq!(rows.len(), DISPLAY_SLOTS);
    assert_eq!(rows[0].name, "t2");
    assert!(rows[3].is_placeholder());
}

/// Two ledgers over one database see each other's writes because every
/// record reloads before it writes.
#[test]
fn record_reloads_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("kwiz.db");
    let mut view = ViewModel::default();

    let mut first = Ledger::new(SqliteStore::open(&db).unwrap());
    let mut second = Ledger::new(SqliteStore::open(&db).unwrap());
    first.load(&mut view).unwrap();
    second.load(&mut view).unwrap();

    first.record("ada", 70, &mut view).unwrap();
    second.record("bob", 60, &mut view).unwrap();

    let store = SqliteStore::open(&db).unwrap();
    let raw = store.get(LEDGER_KEY).unwrap().unwrap();
    let persisted: Vec<HighScore> = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[0].name, "ada");
}

#[test]
fn corrupt_table_is_replaced_on_next_record() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("kwiz.db");
    SqliteStore::open(&db)
        .unwrap()
        .set(LEDGER_KEY, "this is not json")
        .unwrap();

    let mut view = ViewModel::default();
    let mut ledger = Ledger::new(SqliteStore::open(&db).unwrap());
    ledger.load(&mut view).unwrap();
    assert!(ledger.entries().is_empty());

    ledger.record("ada", 40, &mut view).unwrap();
    let raw = SqliteStore::open(&db).unwrap().get(LEDGER_KEY).unwrap().unwrap();
    let persisted: Vec<HighScore> = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted.len(), 1);
}
