//! Shared test utilities for all integration test suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
pub use tagkv::{
    encode_json, GetError, ObjectMap, PutError, RemoveError, Store, StoreConfig, UniquenessPolicy,
    Value,
};
use tempfile::TempDir;

// ============================================================================
// TestStore - file-backed store in a temp directory
// ============================================================================

/// File-backed store that owns its directory.
pub struct TestStore {
    pub store: Store,
    pub dir: TempDir,
    config: Option<StoreConfig>,
}

impl TestStore {
    /// Open a store with the default config.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = Store::open(dir.path()).expect("Failed to open test store");
        TestStore {
            store,
            dir,
            config: None,
        }
    }

    /// Open a store with an explicit config.
    pub fn with_config(config: &StoreConfig) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = Store::open_with_config(dir.path(), config).expect("Failed to open test store");
        TestStore {
            store,
            dir,
            config: Some(config.clone()),
        }
    }

    /// Drop the store and open it again from the same directory.
    pub fn reopen(self) -> Self {
        let TestStore { store, dir, config } = self;
        drop(store);
        let store = match &config {
            Some(config) => Store::open_with_config(dir.path(), config),
            None => Store::open(dir.path()),
        }
        .expect("Failed to reopen test store");
        TestStore { store, dir, config }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// `{"sub-number": F64(789.0)}`
pub fn sub_number_object() -> Value {
    let mut obj = ObjectMap::new();
    obj.insert("sub-number".to_string(), Value::F64(789.0));
    Value::Object(obj)
}

/// The mixed array scenario: every composite and several scalars.
pub fn mixed_array() -> Value {
    Value::Array(vec![
        Value::F64(321.5),
        Value::Bool(false),
        Value::from("hello"),
        Value::Null,
        Value::Array(vec![]),
        sub_number_object(),
    ])
}

/// One value of every kind, keyed by its tag.
pub fn every_kind() -> Vec<(&'static str, Value)> {
    vec![
        ("i32", Value::I32(-321)),
        ("u32", Value::U32(1234)),
        ("i64", Value::I64(-123456789)),
        ("u64", Value::U64(123456789)),
        ("f64", Value::F64(-5432.1)),
        ("bool", Value::Bool(true)),
        ("str", Value::from("example")),
        ("arr", mixed_array()),
        ("obj", sub_number_object()),
        ("null", Value::Null),
    ]
}

// ============================================================================
// Log capture
// ============================================================================

/// In-memory sink for the JSON formatter.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    /// One parsed JSON object per emitted event.
    pub fn records(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

/// A captured log event.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: String,
    pub message: String,
    pub fields: serde_json::Value,
}

impl LogRecord {
    /// String field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    /// The `value` field parsed back into JSON.
    pub fn value_json(&self) -> Option<serde_json::Value> {
        self.field("value").map(|v| serde_json::from_str(v).unwrap())
    }
}

/// Run `f` with a JSON subscriber installed and return what it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<LogRecord>) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);

    let records = buffer
        .records()
        .into_iter()
        .map(|record| {
            let fields = record["fields"].clone();
            LogRecord {
                level: record["level"].as_str().unwrap_or_default().to_string(),
                message: fields["message"].as_str().unwrap_or_default().to_string(),
                fields,
            }
        })
        .collect();
    (out, records)
}

/// Info-level records carrying a `key` field.
pub fn info_records_with_key<'a>(records: &'a [LogRecord], key: &str) -> Vec<&'a LogRecord> {
    records
        .iter()
        .filter(|r| r.level == "INFO" && r.field("key") == Some(key))
        .collect()
}
