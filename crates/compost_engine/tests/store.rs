use std::fs;
use std::rc::Rc;
use std::time::Duration;

use compost_core::{ConversationId, SelectionSet};
use compost_engine::{
    ensure_session_dir, FileSessionStorage, MemoryStorage, ReentrancyGuard, SelectionStore,
    SessionStorage,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const KEY: &str = "chatcompost_chatgpt_checked";

fn ids(values: &[&str]) -> SelectionSet {
    values.iter().filter_map(ConversationId::new).collect()
}

fn store_over(storage: Rc<MemoryStorage>) -> (SelectionStore, Rc<ReentrancyGuard>) {
    let guard = Rc::new(ReentrancyGuard::new());
    (SelectionStore::new(storage, KEY, guard.clone()), guard)
}

#[test]
fn load_of_missing_or_corrupt_data_is_empty() {
    let storage = Rc::new(MemoryStorage::new());
    let (store, _) = store_over(storage.clone());
    assert!(store.load().is_empty());

    storage.set(KEY, "{not json").unwrap();
    assert!(store.load().is_empty());
}

#[test]
fn empty_observation_without_controls_keeps_persisted_selection() {
    let storage = Rc::new(MemoryStorage::new());
    let (store, _) = store_over(storage.clone());
    assert!(store.merge(&ids(&["a", "b"])));

    let writes = storage.write_count();
    assert!(!store.replace(SelectionSet::new(), false));
    assert_eq!(storage.write_count(), writes);
    assert_eq!(store.load(), ids(&["a", "b"]));
}

#[test]
fn unchecking_everything_with_controls_mounted_clears_selection() {
    let storage = Rc::new(MemoryStorage::new());
    let (store, _) = store_over(storage);
    store.merge(&ids(&["a"]));

    assert!(store.replace(SelectionSet::new(), true));
    assert!(store.load().is_empty());
}

#[test]
fn empty_to_empty_is_not_written() {
    let storage = Rc::new(MemoryStorage::new());
    let (store, _) = store_over(storage.clone());
    assert!(!store.replace(SelectionSet::new(), true));
    assert_eq!(storage.write_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn writes_are_suppressed_while_guard_holds() {
    let storage = Rc::new(MemoryStorage::new());
    let (store, guard) = store_over(storage.clone());
    store.merge(&ids(&["a"]));

    guard.engage();
    assert!(!store.replace(ids(&["a", "b"]), true));
    assert!(!store.remove(&ConversationId::new("a").unwrap()));

    guard.release_after(Duration::from_millis(100));
    assert!(guard.is_active());
    assert!(!store.replace(ids(&["b"]), true));
    assert_eq!(store.load(), ids(&["a"]));

    tokio::time::advance(Duration::from_millis(101)).await;
    assert!(!guard.is_active());
    assert!(store.replace(ids(&["b"]), true));
    assert_eq!(store.load(), ids(&["b"]));
}

#[test]
fn remove_and_clear() {
    let storage = Rc::new(MemoryStorage::new());
    let (store, _) = store_over(storage);
    store.merge(&ids(&["a", "b"]));

    assert!(store.remove(&ConversationId::new("a").unwrap()));
    assert!(!store.remove(&ConversationId::new("zzz").unwrap()));
    assert_eq!(store.load(), ids(&["b"]));

    store.clear();
    assert!(store.load().is_empty());
}

#[test]
fn file_storage_roundtrips_and_removes() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("session");
    let storage = FileSessionStorage::new(dir.clone());

    assert_eq!(storage.get(KEY).unwrap(), None);
    storage.set(KEY, r#"["a"]"#).unwrap();
    assert!(dir.is_dir());
    assert_eq!(storage.get(KEY).unwrap().as_deref(), Some(r#"["a"]"#));

    storage.set(KEY, r#"["b"]"#).unwrap();
    assert_eq!(
        fs::read_to_string(storage.path_for(KEY)).unwrap(),
        r#"["b"]"#
    );

    storage.remove(KEY).unwrap();
    storage.remove(KEY).unwrap();
    assert_eq!(storage.get(KEY).unwrap(), None);
}

#[test]
fn file_storage_keys_are_sanitized() {
    let temp = TempDir::new().unwrap();
    let storage = FileSessionStorage::new(temp.path().to_path_buf());
    let path = storage.path_for("../odd key");
    assert_eq!(path.parent().unwrap(), temp.path());
    assert_eq!(path.file_name().unwrap(), "___odd_key.json");
}

#[test]
fn session_dir_must_be_a_directory() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();
    assert!(ensure_session_dir(&file_path).is_err());

    let storage = FileSessionStorage::new(file_path);
    assert!(storage.set(KEY, "[]").is_err());
}
