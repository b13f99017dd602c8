use richnote_core::service::persistence_gateway::FallbackReason;
use richnote_core::{
    default_document, open_db, open_db_in_memory, BlockType, Control, EditorEvent, EditorSession,
    LoadSource, PersistenceGateway, Selection, SessionConfig, SnapshotStore, SqliteSnapshotStore,
    STORAGE_KEY,
};

#[test]
fn saved_document_survives_reopen_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots.sqlite3");

    let saved = {
        let conn = open_db(&path).unwrap();
        let store = SqliteSnapshotStore::try_new(&conn).unwrap();
        let mut session = EditorSession::open(store, SessionConfig::default()).unwrap();
        let first_text = session.document().texts()[0].key.clone();
        session.select(Selection::collapsed(first_text, 0));
        session.set_block_type(&BlockType::HeadingTwo).unwrap();
        session.dispatch(EditorEvent::Control(Control::Save)).unwrap();
        session.document().clone()
    };
    assert_ne!(saved, default_document());

    let conn = open_db(&path).unwrap();
    let store = SqliteSnapshotStore::try_new(&conn).unwrap();
    let session = EditorSession::open(store, SessionConfig::default()).unwrap();
    assert_eq!(session.document(), &saved);
}

#[test]
fn cancel_deletes_the_stored_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSnapshotStore::try_new(&conn).unwrap();
    let mut session = EditorSession::open(&store, SessionConfig::default()).unwrap();

    session.save().unwrap();
    assert!(store.read(STORAGE_KEY).unwrap().is_some());

    session.dispatch(EditorEvent::Control(Control::Cancel)).unwrap();
    assert!(store.read(STORAGE_KEY).unwrap().is_none());
    assert_eq!(session.document(), &default_document());
}

#[test]
fn malformed_snapshot_falls_back_to_default() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSnapshotStore::try_new(&conn).unwrap();
    store.write(STORAGE_KEY, "{\"document\": 42}").unwrap();

    let outcome = PersistenceGateway::new(&store).load().unwrap();
    assert!(matches!(
        outcome.source,
        LoadSource::Default(FallbackReason::Malformed(_))
    ));
    assert_eq!(outcome.document, default_document());

    let session = EditorSession::open(&store, SessionConfig::default()).unwrap();
    assert_eq!(session.document(), &default_document());
}

#[test]
fn custom_storage_key_is_isolated() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSnapshotStore::try_new(&conn).unwrap();
    let config = SessionConfig::default().with_storage_key("draft");
    let mut session = EditorSession::open(&store, config).unwrap();
    assert_eq!(session.config().storage_key, "draft");

    session.save().unwrap();

    assert!(store.read("draft").unwrap().is_some());
    assert!(store.read(STORAGE_KEY).unwrap().is_none());
}
