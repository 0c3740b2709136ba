use super::*;
use crate::util::storage::MemoryStorage;

fn make_user(name: &str) -> User {
    User { id: format!("id-{name}"), full_name: name.to_owned(), ..User::default() }
}

fn empty_context() -> (Arc<MemoryStorage>, SessionContext) {
    let storage = Arc::new(MemoryStorage::new());
    let ctx = SessionContext::load(storage.clone());
    (storage, ctx)
}

/// Storage that accepts reads but rejects every write.
struct ReadOnlyStorage;

impl Storage for ReadOnlyStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(std::io::Error::other("read-only").into())
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Err(std::io::Error::other("read-only").into())
    }
}

// =============================================================================
// load
// =============================================================================

#[test]
fn load_from_empty_storage_is_anonymous() {
    let (_, ctx) = empty_context();
    assert_eq!(ctx.snapshot(), Session::default());
    assert!(!ctx.is_authenticated());
}

#[test]
fn load_restores_persisted_token_and_user() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(TOKEN_KEY, "jwt-1").unwrap();
    save_json(storage.as_ref(), USER_KEY, &make_user("Aida")).unwrap();

    let ctx = SessionContext::load(storage);
    assert_eq!(ctx.token().as_deref(), Some("jwt-1"));
    assert_eq!(ctx.user(), Some(make_user("Aida")));
    assert!(ctx.is_authenticated());
}

#[test]
fn load_discards_corrupt_user_but_keeps_token() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(TOKEN_KEY, "jwt-1").unwrap();
    storage.set_item(USER_KEY, "{broken").unwrap();

    let ctx = SessionContext::load(storage);
    assert!(ctx.user().is_none());
    assert!(ctx.is_authenticated());
}

// =============================================================================
// establish / replace_user / clear
// =============================================================================

#[test]
fn establish_writes_memory_and_storage() {
    let (storage, ctx) = empty_context();
    ctx.establish("jwt-2".into(), make_user("Bek")).unwrap();

    assert_eq!(ctx.token().as_deref(), Some("jwt-2"));
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("jwt-2"));
    let persisted: Option<User> = load_json(storage.as_ref(), USER_KEY).unwrap();
    assert_eq!(persisted, Some(make_user("Bek")));
}

#[test]
fn establish_failure_leaves_memory_untouched() {
    let ctx = SessionContext::load(Arc::new(ReadOnlyStorage));
    assert!(ctx.establish("jwt".into(), make_user("X")).is_err());
    assert_eq!(ctx.snapshot(), Session::default());
}

#[test]
fn replace_user_keeps_token() {
    let (storage, ctx) = empty_context();
    ctx.establish("jwt-3".into(), make_user("Old")).unwrap();
    ctx.replace_user(make_user("New")).unwrap();

    assert_eq!(ctx.token().as_deref(), Some("jwt-3"));
    assert_eq!(ctx.user(), Some(make_user("New")));
    let persisted: Option<User> = load_json(storage.as_ref(), USER_KEY).unwrap();
    assert_eq!(persisted, Some(make_user("New")));
}

#[test]
fn clear_empties_memory_and_storage() {
    let (storage, ctx) = empty_context();
    ctx.establish("jwt-4".into(), make_user("Dana")).unwrap();
    ctx.clear();

    assert_eq!(ctx.snapshot(), Session::default());
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
}

#[test]
fn clear_still_resets_memory_when_storage_fails() {
    let ctx = SessionContext::load(Arc::new(ReadOnlyStorage));
    ctx.clear();
    assert!(!ctx.is_authenticated());
}

#[test]
fn clear_bumps_epoch_and_notifies_subscribers() {
    let (_, ctx) = empty_context();
    let rx = ctx.subscribe();
    assert_eq!(ctx.epoch(), 0);

    ctx.clear();
    assert_eq!(ctx.epoch(), 1);
    assert!(rx.has_changed().unwrap());
}

// =============================================================================
// persisted_token
// =============================================================================

#[test]
fn persisted_token_follows_out_of_band_storage_changes() {
    let (storage, ctx) = empty_context();
    ctx.establish("jwt-5".into(), make_user("Erlan")).unwrap();

    storage.remove_item(TOKEN_KEY).unwrap();
    assert_eq!(ctx.persisted_token(), None);
    // In-memory flag still reflects the last write through the context.
    assert!(ctx.is_authenticated());
}

#[test]
fn clones_share_state() {
    let (_, ctx) = empty_context();
    let other = ctx.clone();
    ctx.establish("jwt-6".into(), make_user("F")).unwrap();
    assert_eq!(other.token().as_deref(), Some("jwt-6"));
}
