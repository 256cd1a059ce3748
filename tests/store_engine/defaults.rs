//! Default values

use crate::common::*;
use std::fs;
use tagkv::{FileBackend, OpenError, CONFIG_FILE_NAME};

fn defaults() -> Vec<(&'static str, Value)> {
    vec![
        ("retries", Value::U32(3)),
        ("mode", Value::from("auto")),
        ("limits", sub_number_object()),
    ]
}

#[test]
fn defaults_apply_until_shadowed() {
    let store = Store::ephemeral().with_defaults(defaults()).unwrap();

    for (key, value) in defaults() {
        assert!(store.is_default(key).unwrap(), "{key}");
        assert_eq!(store.get_or_default(key).unwrap(), value);
        assert_eq!(store.get_default(key).unwrap(), value);
        assert!(matches!(store.get(key), Err(GetError::NotFound { .. })));
    }

    store.put("retries", Value::U32(5)).unwrap();
    assert!(!store.is_default("retries").unwrap());
    assert_eq!(store.get_or_default("retries").unwrap(), Value::U32(5));
    assert_eq!(store.get_default("retries").unwrap(), Value::U32(3));
}

#[test]
fn reset_restores_default() {
    let test = TestStore::new();
    let TestStore { store, dir: _dir, .. } = test;
    let store = store.with_defaults(defaults()).unwrap();

    store.put("mode", Value::from("manual")).unwrap();
    store.reset_key("mode").unwrap();

    assert!(store.is_default("mode").unwrap());
    assert_eq!(store.get_or_default("mode").unwrap(), Value::from("auto"));
    assert!(!store.contains_key("mode").unwrap());

    // Resetting a key that already resolves to its default is fine
    store.reset_key("mode").unwrap();
}

#[test]
fn reset_without_default_is_not_found() {
    let store = Store::ephemeral().with_defaults(defaults()).unwrap();
    store.put("plain", Value::Null).unwrap();

    assert!(matches!(
        store.reset_key("plain"),
        Err(RemoveError::NotFound { .. })
    ));
    assert_eq!(store.get("plain").unwrap(), Value::Null);
}

#[test]
fn missing_everywhere_is_not_found() {
    let store = Store::ephemeral().with_defaults(defaults()).unwrap();
    assert!(matches!(
        store.get_or_default("nothing"),
        Err(GetError::NotFound { .. })
    ));
    assert!(!store.is_default("nothing").unwrap());
}

#[test]
fn defaults_follow_put_rules() {
    let err = Store::ephemeral()
        .with_defaults([("utf8_ключ", Value::Null)])
        .unwrap_err();
    assert!(matches!(
        err,
        OpenError::InvalidDefault {
            source: PutError::Key(_),
            ..
        }
    ));

    let err = Store::ephemeral()
        .with_defaults([("nan", Value::F64(f64::NAN))])
        .unwrap_err();
    assert!(matches!(
        err,
        OpenError::InvalidDefault {
            source: PutError::InvalidValue(_),
            ..
        }
    ));
}

#[test]
fn defaults_are_not_listed_as_keys() {
    let store = Store::ephemeral().with_defaults(defaults()).unwrap();
    assert!(store.keys().unwrap().is_empty());
}

#[test]
fn reset_all_keys_restores_every_default() {
    let test = TestStore::with_config(
        &StoreConfig::default().with_uniqueness(UniquenessPolicy::Overwrite),
    );
    let TestStore { store, dir, .. } = test;
    let store = store.with_defaults(defaults()).unwrap();

    store.put("retries", Value::U32(5)).unwrap();
    store.put("mode", Value::from("manual")).unwrap();
    store.put("plain", Value::Null).unwrap();

    assert_eq!(store.reset_all_keys().unwrap(), 3);
    for (key, value) in defaults() {
        assert!(store.is_default(key).unwrap(), "{key}");
        assert_eq!(store.get_or_default(key).unwrap(), value);
    }
    assert!(store.keys().unwrap().is_empty());

    drop(store);
    let store = Store::open(dir.path()).unwrap();
    assert!(store.keys().unwrap().is_empty());
}

#[test]
fn defaults_file_is_loaded_on_open() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        FileBackend::defaults_filename(dir.path(), 0),
        r#"{"retries":{"t":"u32","v":3},"limits":{"t":"obj","v":{"sub-number":{"t":"f64","v":789.0}}}}"#,
    )
    .unwrap();

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.get_or_default("retries").unwrap(), Value::U32(3));
    assert_eq!(store.get_default("limits").unwrap(), sub_number_object());
    assert!(store.is_default("retries").unwrap());
}

#[test]
fn required_defaults_fail_open_without_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), "defaults = \"required\"\n").unwrap();
    assert!(matches!(
        Store::open(dir.path()),
        Err(OpenError::DefaultsMissing { .. })
    ));

    fs::write(
        FileBackend::defaults_filename(dir.path(), 0),
        r#"{"mode":{"t":"str","v":"auto"}}"#,
    )
    .unwrap();
    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.get_or_default("mode").unwrap(), Value::from("auto"));
}
