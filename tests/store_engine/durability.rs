//! File-backed stores: config file, instances, reopen and checksums

use crate::common::*;
use std::fs;
use tagkv::{FileBackend, OpenError, CONFIG_FILE_NAME};

#[test]
fn open_creates_default_config() {
    let test = TestStore::new();
    let config_path = test.path().join(CONFIG_FILE_NAME);
    assert!(config_path.exists());

    let config = StoreConfig::from_file(&config_path).unwrap();
    assert_eq!(config, StoreConfig::default());
}

#[test]
fn edited_config_applies_on_reopen() {
    let test = TestStore::new();
    test.store.put("k", Value::I32(1)).unwrap();
    fs::write(
        test.path().join(CONFIG_FILE_NAME),
        "uniqueness = \"overwrite\"\n",
    )
    .unwrap();

    let test = test.reopen();
    test.store.put("k", Value::I32(2)).unwrap();
    assert_eq!(test.store.get("k").unwrap(), Value::I32(2));
}

#[test]
fn invalid_config_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), "uniqueness = \"later\"\n").unwrap();
    assert!(matches!(Store::open(dir.path()), Err(OpenError::Config(_))));
}

#[test]
fn stored_file_holds_tagged_values() {
    let test = TestStore::new();
    test.store.put("i32", Value::I32(-321)).unwrap();

    let text = fs::read_to_string(FileBackend::kvs_filename(test.path(), 0)).unwrap();
    assert_eq!(text, r#"{"i32":{"t":"i32","v":-321}}"#);
    assert!(FileBackend::hash_filename(test.path(), 0).exists());
}

#[test]
fn instances_share_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let first = Store::open_with_config(dir.path(), &StoreConfig::default().with_instance_id(1))
        .unwrap();
    let second = Store::open_with_config(dir.path(), &StoreConfig::default().with_instance_id(2))
        .unwrap();

    first.put("shared_name", Value::from("first")).unwrap();
    second.put("shared_name", Value::from("second")).unwrap();

    assert_eq!(first.get("shared_name").unwrap(), Value::from("first"));
    assert_eq!(second.get("shared_name").unwrap(), Value::from("second"));
    assert!(FileBackend::kvs_filename(dir.path(), 1).exists());
    assert!(FileBackend::kvs_filename(dir.path(), 2).exists());
}

#[test]
fn removal_survives_reopen() {
    let test = TestStore::new();
    test.store.put("gone", Value::Null).unwrap();
    test.store.put("kept", Value::Null).unwrap();
    test.store.remove("gone").unwrap();

    let test = test.reopen();
    assert_eq!(test.store.keys().unwrap(), vec!["kept"]);
}

#[test]
fn tampered_file_fails_open() {
    let test = TestStore::new();
    test.store.put("i32", Value::I32(-321)).unwrap();
    let path = test.path().to_path_buf();
    drop(test.store);

    fs::write(
        FileBackend::kvs_filename(&path, 0),
        r#"{"i32":{"t":"i32","v":-320}}"#,
    )
    .unwrap();
    assert!(matches!(
        Store::open(&path),
        Err(OpenError::Storage(tagkv::Error::Corruption(_)))
    ));
}

#[test]
fn undecodable_entry_is_corrupt_on_get() {
    let dir = tempfile::tempdir().unwrap();
    let data = br#"{"bad":{"t":"u32","v":-1}}"#;
    fs::write(FileBackend::kvs_filename(dir.path(), 0), data).unwrap();
    fs::write(
        FileBackend::hash_filename(dir.path(), 0),
        crc32fast::hash(data).to_be_bytes(),
    )
    .unwrap();

    let store = Store::open(dir.path()).unwrap();
    assert!(matches!(
        store.get("bad"),
        Err(GetError::Corrupt { ref key, .. }) if key == "bad"
    ));
}

#[test]
fn failed_checksum_write_keeps_store_openable() {
    let test = TestStore::new();
    test.store.put("k1", Value::I32(1)).unwrap();

    // A directory where the checksum temp file goes makes the next write fail
    let blocker = test.path().join("kvs_0_0.hash.tmp");
    fs::create_dir(&blocker).unwrap();
    assert!(matches!(
        test.store.put("k2", Value::I32(2)),
        Err(PutError::Storage(_))
    ));
    assert!(matches!(test.store.get("k2"), Err(GetError::NotFound { .. })));
    fs::remove_dir(&blocker).unwrap();

    let test = test.reopen();
    assert_eq!(test.store.get("k1").unwrap(), Value::I32(1));
    assert!(matches!(test.store.get("k2"), Err(GetError::NotFound { .. })));
    test.store.put("k2", Value::I32(2)).unwrap();
}
