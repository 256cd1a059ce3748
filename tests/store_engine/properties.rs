//! Property tests over the store

use crate::common::*;
use proptest::prelude::*;
use tagkv::{decode_json, value_len, KeyError};

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::I32),
        any::<u32>().prop_map(Value::U32),
        any::<i64>().prop_map(Value::I64),
        any::<u64>().prop_map(Value::U64),
        (-1.0e12f64..1.0e12).prop_map(Value::F64),
        any::<bool>().prop_map(Value::Bool),
        "[a-z0-9 ]{0,16}".prop_map(Value::String),
        Just(Value::Null),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z_-]{1,6}", inner), 0..4).prop_map(|fields| {
                Value::Object(fields.into_iter().collect::<ObjectMap>())
            }),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn put_then_get_returns_value(key in "[A-Za-z0-9_-]{1,32}", value in arb_value()) {
        prop_assume!(value_len(&value) <= 1024);
        let store = Store::ephemeral();
        store.put(&key, value.clone()).unwrap();
        prop_assert_eq!(store.get(&key).unwrap(), value.clone());
        prop_assert_eq!(decode_json(&encode_json(&value)).unwrap(), value);
    }

    #[test]
    fn repeated_puts_keep_first_value(
        key in "[A-Za-z0-9_-]{1,32}",
        values in prop::collection::vec(arb_scalar(), 2..6),
    ) {
        let store = Store::ephemeral();
        store.put(&key, values[0].clone()).unwrap();
        for value in &values[1..] {
            let rejected = matches!(
                store.put(&key, value.clone()),
                Err(PutError::DuplicateKey { .. })
            );
            prop_assert!(rejected);
        }
        prop_assert_eq!(store.get(&key).unwrap(), values[0].clone());
    }

    #[test]
    fn repeated_puts_keep_last_value_under_overwrite(
        key in "[A-Za-z0-9_-]{1,32}",
        values in prop::collection::vec(arb_scalar(), 2..6),
    ) {
        let config = StoreConfig::default().with_uniqueness(UniquenessPolicy::Overwrite);
        let store = Store::with_persistence(
            std::sync::Arc::new(tagkv::MemoryBackend::new()),
            &config,
        )
        .unwrap();
        for value in &values {
            store.put(&key, value.clone()).unwrap();
        }
        prop_assert_eq!(store.get(&key).unwrap(), values[values.len() - 1].clone());
        prop_assert_eq!(store.keys().unwrap().len(), 1);
    }

    #[test]
    fn over_length_keys_never_stored(key in "[A-Za-z0-9_-]{33,48}") {
        let store = Store::ephemeral();
        let too_long = matches!(
            store.put(&key, Value::Null),
            Err(PutError::Key(KeyError::TooLong { .. }))
        );
        prop_assert!(too_long);
        prop_assert!(store.keys().unwrap().is_empty());
    }
}
