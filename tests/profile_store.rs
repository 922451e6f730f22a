// tests/profile_store.rs
use phd_agent::profile::{DEFAULT_KEYWORDS, PROFILE_KEY};
use phd_agent::{JsonFileStore, KeyValueStore, Profile, ProfileStore};
use std::fs;

#[test]
fn new_file_is_seeded_and_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("profile.json");

    let store = ProfileStore::open(JsonFileStore::new(&path));
    assert_eq!(store.get().keywords(), &DEFAULT_KEYWORDS.map(String::from)[..]);
    assert!(path.exists(), "seed must be persisted on first open");

    let raw = JsonFileStore::new(&path).get(PROFILE_KEY).unwrap().unwrap();
    let persisted: Vec<String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted, DEFAULT_KEYWORDS.map(String::from).to_vec());
}

#[test]
fn add_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");

    let mut store = ProfileStore::open(JsonFileStore::new(&path));
    store.add("assistive technology");
    drop(store);

    let reopened = ProfileStore::open(JsonFileStore::new(&path));
    assert!(reopened.get().iter().any(|k| k == "assistive technology"));
}

#[test]
fn remove_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");

    let mut store = ProfileStore::open(JsonFileStore::new(&path));
    let removed = store.get().keywords()[1].clone();
    store.remove(1);
    drop(store);

    let reopened = ProfileStore::open(JsonFileStore::new(&path));
    let p = reopened.get();
    assert_eq!(p.len(), DEFAULT_KEYWORDS.len() - 1);
    assert!(!p.iter().any(|k| k == removed));
}

#[test]
fn noop_mutations_do_not_touch_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");

    let mut store = ProfileStore::open(JsonFileStore::new(&path));
    let before = fs::read_to_string(&path).unwrap();
    store.add("  \t ");
    store.remove(42);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn other_keys_are_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    let kv = JsonFileStore::new(&path);
    kv.set("theme", "dark").unwrap();

    let mut store = ProfileStore::open(JsonFileStore::new(&path));
    store.add("hospital");

    assert_eq!(kv.get("theme").unwrap().as_deref(), Some("dark"));
}

#[test]
fn corrupted_file_falls_back_to_seed_and_is_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    fs::write(&path, "<<< definitely not json").unwrap();

    let mut store = ProfileStore::open(JsonFileStore::new(&path));
    assert_eq!(store.get(), Profile::default_seed());
    store.add("medical ux");

    let reopened = ProfileStore::open(JsonFileStore::new(&path));
    assert_eq!(reopened.get().keywords().last().map(String::as_str), Some("medical ux"));
}

#[test]
fn persisted_empty_list_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    JsonFileStore::new(&path).set(PROFILE_KEY, "[]").unwrap();

    let store = ProfileStore::open(JsonFileStore::new(&path));
    assert!(store.get().is_empty(), "an explicit empty list is not 'missing'");
}
