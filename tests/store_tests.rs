//! End-to-end tests for the cache lifecycle: load, reconcile, save.

use std::fs;
use std::path::Path;

use filetime::FileTime;
use tempfile::TempDir;

use hashcache::cache::{CacheEntry, CacheStore, CACHE_FILE_NAME};
use hashcache::digest::Md5;

/// One full load → update → save cycle, as the driver performs it.
fn run_cycle(root: &Path) -> CacheStore {
    let mut store = CacheStore::new();
    store.load(root).unwrap();
    store.update(root).unwrap();
    store.save(root).unwrap();
    store
}

fn mtime_of(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap())
}

#[test]
fn test_fresh_tree_creates_one_entry_per_file() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("sub/deeper")).unwrap();
    fs::write(root.path().join("top.txt"), b"top").unwrap();
    fs::write(root.path().join("sub/mid.txt"), b"mid").unwrap();
    fs::write(root.path().join("sub/deeper/leaf.txt"), b"leaf").unwrap();

    let store = run_cycle(root.path());

    assert_eq!(store.len(), 3);
    assert!(store.is_modified());
    for (rel, content) in [
        ("top.txt", &b"top"[..]),
        ("sub/mid.txt", b"mid"),
        ("sub/deeper/leaf.txt", b"leaf"),
    ] {
        let entry = store
            .get(Path::new(rel))
            .unwrap_or_else(|| panic!("missing entry for {rel}"));
        assert_eq!(entry.hash, Md5::hash(content).to_hex(), "{rel}");
    }
    assert!(root.path().join(CACHE_FILE_NAME).exists());
}

#[test]
fn test_stable_tree_second_run_is_unmodified_and_file_identical() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("a.txt"), b"alpha").unwrap();
    fs::write(root.path().join("b.txt"), b"beta").unwrap();

    run_cycle(root.path());
    let first = fs::read(root.path().join(CACHE_FILE_NAME)).unwrap();
    let first_mtime = mtime_of(&root.path().join(CACHE_FILE_NAME));

    let store = run_cycle(root.path());
    assert!(!store.is_modified());
    assert_eq!(store.len(), 2);

    let second = fs::read(root.path().join(CACHE_FILE_NAME)).unwrap();
    assert_eq!(first, second);
    // The skipped save must not even touch the cache file's own timestamp.
    assert_eq!(first_mtime, mtime_of(&root.path().join(CACHE_FILE_NAME)));
}

#[test]
fn test_timestamp_repair_restores_mtime_without_modifying_store() {
    let root = TempDir::new().unwrap();
    let file = root.path().join("steady.txt");
    fs::write(&file, b"same bytes").unwrap();

    let first = run_cycle(root.path());
    let recorded = first.get(Path::new("steady.txt")).unwrap().clone();
    let original_mtime = mtime_of(&file);

    // Metadata-only change: same content, bumped timestamp.
    let bumped = FileTime::from_unix_time(original_mtime.unix_seconds() + 3600, 0);
    filetime::set_file_mtime(&file, bumped).unwrap();
    assert_ne!(mtime_of(&file), original_mtime);

    let second = run_cycle(root.path());
    assert!(!second.is_modified());
    assert_eq!(second.get(Path::new("steady.txt")), Some(&recorded));
    assert_eq!(mtime_of(&file), original_mtime);
}

#[test]
fn test_content_change_updates_hash_and_timestamp() {
    let root = TempDir::new().unwrap();
    let file = root.path().join("volatile.txt");
    fs::write(&file, b"before").unwrap();

    let first = run_cycle(root.path());
    let old_entry = first.get(Path::new("volatile.txt")).unwrap().clone();

    fs::write(&file, b"after, and longer").unwrap();
    // Force a timestamp distinct from the recorded one regardless of
    // filesystem timestamp granularity.
    let new_mtime = FileTime::from_unix_time(mtime_of(&file).unix_seconds() + 60, 500);
    filetime::set_file_mtime(&file, new_mtime).unwrap();

    let second = run_cycle(root.path());
    assert!(second.is_modified());
    let entry = second.get(Path::new("volatile.txt")).unwrap();
    assert_ne!(entry, &old_entry);
    assert_eq!(entry.hash, Md5::hash(b"after, and longer").to_hex());
    // The file's timestamp is left alone on a real content change.
    assert_eq!(mtime_of(&file), new_mtime);
}

#[test]
fn test_hidden_entries_are_excluded_but_their_cache_entries_survive() {
    let root = TempDir::new().unwrap();
    fs::create_dir(root.path().join(".hidden")).unwrap();
    fs::write(root.path().join(".hidden/inner.txt"), b"invisible").unwrap();
    fs::write(root.path().join(".dotfile"), b"also invisible").unwrap();
    fs::write(root.path().join("plain.txt"), b"visible").unwrap();

    // Pre-existing entry for a now-hidden path must be left untouched.
    fs::write(
        root.path().join(CACHE_FILE_NAME),
        "77 aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa .dotfile\n",
    )
    .unwrap();

    let store = run_cycle(root.path());

    assert_eq!(store.len(), 2);
    assert!(store.get(Path::new("plain.txt")).is_some());
    assert!(store.get(Path::new(".hidden/inner.txt")).is_none());
    let dotfile = store.get(Path::new(".dotfile")).unwrap();
    assert_eq!(dotfile.timestamp, 77);
    assert_eq!(dotfile.hash, "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");

    // The persisted file keeps the stale hidden entry too.
    let content = fs::read_to_string(root.path().join(CACHE_FILE_NAME)).unwrap();
    assert!(content.contains(".dotfile"));
    assert!(!content.contains("inner.txt"));
}

#[test]
fn test_removed_file_leaves_stale_entry() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("keep.txt"), b"keep").unwrap();
    fs::write(root.path().join("gone.txt"), b"gone").unwrap();

    run_cycle(root.path());
    fs::remove_file(root.path().join("gone.txt")).unwrap();

    let store = run_cycle(root.path());
    assert!(!store.is_modified());
    assert_eq!(store.len(), 2);
    assert!(store.get(Path::new("gone.txt")).is_some());
}

#[test]
fn test_paths_with_spaces_survive_a_full_cycle() {
    let root = TempDir::new().unwrap();
    fs::create_dir(root.path().join("my docs")).unwrap();
    let file = root.path().join("my docs/read me.txt");
    fs::write(&file, b"spacey").unwrap();

    run_cycle(root.path());

    let mut reloaded = CacheStore::new();
    reloaded.load(root.path()).unwrap();
    let entry = reloaded.get(Path::new("my docs/read me.txt")).unwrap();
    assert_eq!(entry.hash, Md5::hash(b"spacey").to_hex());

    // And the reloaded store reconciles without seeing any change.
    reloaded.update(root.path()).unwrap();
    assert!(!reloaded.is_modified());
}

#[test]
fn test_malformed_cache_file_fails_load_and_leaves_store_empty() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join(CACHE_FILE_NAME),
        "1 aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa ok.txt\n999\n",
    )
    .unwrap();

    let mut store = CacheStore::new();
    assert!(store.load(root.path()).is_err());
    assert!(store.is_empty());
    assert!(!store.is_modified());
}

#[test]
fn test_save_then_load_reproduces_entries() {
    let root = TempDir::new().unwrap();
    let mut store = CacheStore::new();
    store.insert(
        Path::new("x/y.bin"),
        CacheEntry {
            timestamp: -5,
            hash: "0123456789abcdef0123456789abcdef".to_string(),
        },
    );
    store.insert(
        Path::new("name with spaces.txt"),
        CacheEntry {
            timestamp: 1_700_000_000_000_000_000,
            hash: "fedcba9876543210fedcba9876543210".to_string(),
        },
    );
    store.save(root.path()).unwrap();

    let mut reloaded = CacheStore::new();
    reloaded.load(root.path()).unwrap();
    let original: Vec<_> = store.entries().collect();
    let restored: Vec<_> = reloaded.entries().collect();
    assert_eq!(original, restored);
}

#[test]
fn test_run_in_driver_wires_all_three_phases() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("file.txt"), b"driver").unwrap();

    hashcache::run_in(root.path()).unwrap();

    let content = fs::read_to_string(root.path().join(CACHE_FILE_NAME)).unwrap();
    let line = content.lines().next().unwrap();
    assert!(line.ends_with(" file.txt"), "{line}");
    assert!(line.contains(&Md5::hash(b"driver").to_hex()), "{line}");
}
