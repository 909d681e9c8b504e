use newschat_core::session::{
    generate_session_id, resolve_session_id, FileSessionStore, MemorySessionStore, SessionStore,
    SESSION_KEY,
};
use tempfile::TempDir;

// ========================================================================
// FileSessionStore
// ========================================================================

#[test]
fn test_file_store_empty_when_missing() {
    let dir = TempDir::new().unwrap();
    let store = FileSessionStore::in_dir(dir.path(), "http://localhost:3001");

    assert_eq!(store.load().unwrap(), None);
    assert!(!store.path().exists());
}

#[test]
fn test_file_store_roundtrip_survives_new_instance() {
    let dir = TempDir::new().unwrap();
    let store = FileSessionStore::in_dir(dir.path(), "http://localhost:3001");
    store.store("abc-123").unwrap();

    let reopened = FileSessionStore::in_dir(dir.path(), "http://localhost:3001");
    assert_eq!(reopened.load().unwrap().as_deref(), Some("abc-123"));

    let raw = std::fs::read_to_string(reopened.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json[SESSION_KEY], "abc-123");
}

#[test]
fn test_file_store_is_scoped_per_origin() {
    let dir = TempDir::new().unwrap();
    let local = FileSessionStore::in_dir(dir.path(), "http://localhost:3001");
    let remote = FileSessionStore::in_dir(dir.path(), "https://news.example.com");

    local.store("local-id").unwrap();

    assert_eq!(remote.load().unwrap(), None);
    assert_ne!(local.path(), remote.path());
}

#[test]
fn test_file_store_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FileSessionStore::in_dir(&nested, "http://localhost:3001");

    store.store("nested-id").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("nested-id"));
}

#[test]
fn test_file_store_clear_removes_id() {
    let dir = TempDir::new().unwrap();
    let store = FileSessionStore::in_dir(dir.path(), "http://localhost:3001");
    store.store("gone-soon").unwrap();

    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), None);
    // Clearing twice is fine
    store.clear().unwrap();
}

#[test]
fn test_file_store_corrupt_file_is_storage_unavailable() {
    let dir = TempDir::new().unwrap();
    let store = FileSessionStore::in_dir(dir.path(), "http://localhost:3001");
    std::fs::write(store.path(), "{{{ not json").unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(err, newschat_core::ChatError::StorageUnavailable(_)));
}

#[test]
fn test_file_store_unwritable_location_fails() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "a file, not a directory").unwrap();

    let store = FileSessionStore::in_dir(&blocker, "http://localhost:3001");
    assert!(store.store("id").is_err());
}

// ========================================================================
// Resolution
// ========================================================================

#[test]
fn test_generated_ids_are_unique_uuids() {
    let a = generate_session_id();
    let b = generate_session_id();

    assert_ne!(a, b);
    assert!(uuid::Uuid::parse_str(&a).is_ok());
}

#[test]
fn test_resolve_generates_once_then_reuses() {
    let store = MemorySessionStore::new();

    let first = resolve_session_id(&store);
    let second = resolve_session_id(&store);

    assert_eq!(first, second);
    assert_eq!(store.load().unwrap(), Some(first));
}

#[test]
fn test_resolve_prefers_stored_id() {
    let store = MemorySessionStore::with_id("kept");
    assert_eq!(resolve_session_id(&store), "kept");
}

#[test]
fn test_resolve_degrades_when_storage_broken() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x").unwrap();
    let store = FileSessionStore::in_dir(&blocker, "http://localhost:3001");

    let id = resolve_session_id(&store);
    assert_eq!(id.len(), 36);
}
