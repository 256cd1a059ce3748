//! Key admission through the store
//!
//! Keys use `[A-Za-z0-9_-]` and are at most 32 bytes.

use crate::common::*;
use tagkv::KeyError;

const VALID_KEYS: &[&str] = &[
    "alphaNumeric123",
    "with_underscore",
    "with-dash",
    "A1_b2-C3",
    "utf8_emoji_valid",
    "utf8_alphaNumeric123",
    "utf8_with_underscore",
    "utf8-with-dash",
    "utf8_A1_b2-C3",
];

const INVALID_CHARACTER_KEYS: &[&str] = &[
    "has space",
    "has$pecial",
    "emoji✅",
    "utf8_ключ",
    "utf8_漢字",
    "utf8_emoji ✅❗😀",
    "utf8_greek ημα",
];

// ============================================================================
// Admission
// ============================================================================

#[test]
fn valid_keys_are_stored() {
    let test = TestStore::new();
    for key in VALID_KEYS {
        test.store.put(key, Value::from(*key)).unwrap();
    }
    for key in VALID_KEYS {
        assert_eq!(test.store.get(key).unwrap(), Value::from(*key));
    }

    let mut expected: Vec<String> = VALID_KEYS.iter().map(|k| k.to_string()).collect();
    expected.sort();
    assert_eq!(test.store.keys().unwrap(), expected);
}

#[test]
fn invalid_characters_are_rejected() {
    let test = TestStore::new();
    for key in INVALID_CHARACTER_KEYS {
        let err = test.store.put(key, Value::Bool(true)).unwrap_err();
        assert!(
            matches!(err, PutError::Key(KeyError::InvalidCharacter { .. })),
            "{key}: {err:?}"
        );
    }
    assert!(test.store.keys().unwrap().is_empty());
}

#[test]
fn rejected_key_is_not_found() {
    let test = TestStore::new();
    assert!(test.store.put("utf8_ключ", Value::I32(1)).is_err());
    assert!(matches!(
        test.store.get("utf8_ключ"),
        Err(GetError::NotFound { .. })
    ));
}

// ============================================================================
// Length
// ============================================================================

#[test]
fn max_length_key_accepted() {
    let test = TestStore::new();
    let key = "a".repeat(32);
    test.store.put(&key, Value::Null).unwrap();
    assert!(test.store.contains_key(&key).unwrap());
}

#[test]
fn over_length_key_rejected() {
    let test = TestStore::new();
    let err = test
        .store
        .put("too_long_key_abcdefghijklmnopqrstuvwxyz123456", Value::Null)
        .unwrap_err();
    assert!(matches!(
        err,
        PutError::Key(KeyError::TooLong { actual: 45, max: 32 })
    ));

    let err = test.store.put(&"a".repeat(33), Value::Null).unwrap_err();
    assert!(matches!(err, PutError::Key(KeyError::TooLong { .. })));
}

#[test]
fn empty_key_is_admitted() {
    let test = TestStore::new();
    test.store.put("", Value::U32(0)).unwrap();
    assert_eq!(test.store.get("").unwrap(), Value::U32(0));
}

// ============================================================================
// Uniqueness
// ============================================================================

#[test]
fn duplicate_key_rejected_by_default() {
    let test = TestStore::new();
    test.store.put("unique_key", Value::from("first")).unwrap();

    let err = test.store.put("unique_key", Value::from("second")).unwrap_err();
    assert!(matches!(err, PutError::DuplicateKey { ref key } if key == "unique_key"));
    assert_eq!(test.store.get("unique_key").unwrap(), Value::from("first"));
}

#[test]
fn keys_are_compared_bytewise() {
    let test = TestStore::new();
    test.store.put("Key", Value::I32(1)).unwrap();
    test.store.put("key", Value::I32(2)).unwrap();
    assert_eq!(test.store.keys().unwrap(), vec!["Key", "key"]);
}
