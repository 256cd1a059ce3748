//! Snapshot rotation, restore and per-generation file paths

use crate::common::*;
use std::fs;
use tagkv::{SnapshotError, CONFIG_FILE_NAME};

fn counter_store(max_count: usize) -> TestStore {
    TestStore::with_config(
        &StoreConfig::default()
            .with_uniqueness(UniquenessPolicy::Overwrite)
            .with_snapshot_max_count(max_count),
    )
}

fn write_counter(test: &TestStore, count: i64) {
    for i in 0..count {
        test.store.put("counter", Value::I64(i)).unwrap();
    }
}

#[test]
fn count_is_capped_by_max_count() {
    for max_count in [1, 3, 10] {
        for writes in [1, 2, 5] {
            let test = counter_store(max_count);
            let mut seen = Vec::new();
            for i in 0..writes {
                seen.push(test.store.snapshot_count());
                test.store.put("counter", Value::I64(i)).unwrap();
            }

            let expected: Vec<usize> = (0..writes as usize).map(|n| n.min(max_count)).collect();
            assert_eq!(seen, expected, "max_count {max_count}, writes {writes}");
            assert_eq!(
                test.store.snapshot_count(),
                (writes as usize).min(max_count),
                "max_count {max_count}, writes {writes}"
            );
        }
    }
}

#[test]
fn max_count_comes_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), "snapshot_max_count = 10\n").unwrap();
    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.snapshot_max_count(), 10);

    let test = TestStore::new();
    assert_eq!(test.store.snapshot_max_count(), 3);
    assert_eq!(Store::ephemeral().snapshot_max_count(), 0);
}

#[test]
fn restore_brings_back_earlier_values() {
    let test = counter_store(3);
    write_counter(&test, 3);

    test.store.snapshot_restore(1).unwrap();
    assert_eq!(test.store.get("counter").unwrap(), Value::I64(1));

    // The restored state is the current file after a reopen
    let test = test.reopen();
    assert_eq!(test.store.get("counter").unwrap(), Value::I64(1));
}

#[test]
fn restore_rejects_ids_not_on_disk() {
    let test = counter_store(3);
    write_counter(&test, 2);

    for id in [0, 2, 3] {
        assert!(matches!(
            test.store.snapshot_restore(id),
            Err(SnapshotError::InvalidSnapshotId { .. })
        ));
    }
    assert_eq!(test.store.get("counter").unwrap(), Value::I64(1));
}

#[test]
fn paths_exist_only_for_generations_on_disk() {
    let test = counter_store(3);
    write_counter(&test, 2);

    for id in [0, 1] {
        let kvs = test.store.kvs_filename(id).unwrap();
        let hash = test.store.hash_filename(id).unwrap();
        assert_eq!(kvs, test.path().join(format!("kvs_0_{id}.json")));
        assert_eq!(hash, test.path().join(format!("kvs_0_{id}.hash")));
        assert_eq!(
            fs::read(hash).unwrap(),
            crc32fast::hash(&fs::read(kvs).unwrap()).to_be_bytes()
        );
    }
    assert!(matches!(
        test.store.kvs_filename(2),
        Err(SnapshotError::FileNotFound { snapshot_id: 2 })
    ));
    assert!(matches!(
        test.store.hash_filename(2),
        Err(SnapshotError::FileNotFound { snapshot_id: 2 })
    ));
}
