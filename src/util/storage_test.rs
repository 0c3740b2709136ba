use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

fn scratch_path(label: &str) -> PathBuf {
    let n = NEXT_FILE.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("cinema-storage-{label}-{}-{n}.json", std::process::id()))
}

// =============================================================================
// MemoryStorage
// =============================================================================

#[test]
fn memory_missing_key_is_none() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get_item("token").unwrap(), None);
}

#[test]
fn memory_set_then_get() {
    let storage = MemoryStorage::new();
    storage.set_item("token", "abc").unwrap();
    assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("abc"));
}

#[test]
fn memory_set_overwrites() {
    let storage = MemoryStorage::new();
    storage.set_item("token", "old").unwrap();
    storage.set_item("token", "new").unwrap();
    assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("new"));
}

#[test]
fn memory_remove_missing_key_is_ok() {
    let storage = MemoryStorage::new();
    storage.remove_item("nope").unwrap();
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_missing_reads_empty() {
    let storage = FileStorage::new(scratch_path("missing"));
    assert_eq!(storage.get_item("token").unwrap(), None);
}

#[test]
fn file_survives_reopen() {
    let path = scratch_path("reopen");
    FileStorage::new(&path).set_item("token", "persisted").unwrap();

    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get_item("token").unwrap().as_deref(), Some("persisted"));

    let _ = std::fs::remove_file(path);
}

#[test]
fn file_remove_deletes_only_that_key() {
    let path = scratch_path("remove");
    let storage = FileStorage::new(&path);
    storage.set_item("token", "t").unwrap();
    storage.set_item("user", "{}").unwrap();
    storage.remove_item("token").unwrap();

    assert_eq!(storage.get_item("token").unwrap(), None);
    assert_eq!(storage.get_item("user").unwrap().as_deref(), Some("{}"));

    let _ = std::fs::remove_file(path);
}

#[test]
fn file_corrupt_contents_error() {
    let path = scratch_path("corrupt");
    std::fs::write(&path, "{not json").unwrap();
    let storage = FileStorage::new(&path);
    assert!(matches!(storage.get_item("token"), Err(StorageError::Json(_))));

    let _ = std::fs::remove_file(path);
}

// =============================================================================
// load_json / save_json
// =============================================================================

#[test]
fn json_helpers_roundtrip_struct() {
    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Draft {
        seats: Vec<u32>,
    }

    let storage = MemoryStorage::new();
    save_json(&storage, "draft", &Draft { seats: vec![3, 4] }).unwrap();
    let loaded: Option<Draft> = load_json(&storage, "draft").unwrap();
    assert_eq!(loaded, Some(Draft { seats: vec![3, 4] }));
}

#[test]
fn load_json_absent_key_is_none() {
    let storage = MemoryStorage::new();
    let loaded: Option<serde_json::Value> = load_json(&storage, "user").unwrap();
    assert!(loaded.is_none());
}

#[test]
fn load_json_invalid_value_errors() {
    let storage = MemoryStorage::new();
    storage.set_item("user", "nope").unwrap();
    let loaded: Result<Option<serde_json::Value>, _> = load_json(&storage, "user");
    assert!(loaded.is_err());
}
