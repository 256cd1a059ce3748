//! tagkv - Embedded key-value store with a closed, tagged value domain
//!
//! Values are one of ten kinds (`i32`, `u32`, `i64`, `u64`, `f64`, `bool`,
//! `str`, `arr`, `obj`, `null`) and are stored in a canonical tagged JSON
//! form, `{"t":"<tag>","v":<payload>}`. Keys are admitted only if they use
//! `[A-Za-z0-9_-]` and fit in 32 bytes.
//!
//! # Quick Start
//!
//! ```
//! use tagkv::{Store, Value};
//!
//! // In-memory store
//! let store = Store::ephemeral();
//!
//! store.put("i32", Value::I32(-321)).unwrap();
//! assert_eq!(store.get("i32").unwrap(), Value::I32(-321));
//!
//! // The wire form
//! assert_eq!(tagkv::encode_json(&Value::I32(-321)), r#"{"t":"i32","v":-321}"#);
//! ```
//!
//! # Architecture
//!
//! - `tagkv-core`: values, keys, limits, the `Persistence` trait
//! - `tagkv-wire`: the tagged codec
//! - `tagkv-storage`: memory and file backends
//! - `tagkv-engine`: the `Store`, its config and errors
//!
//! File-backed stores are opened with [`Store::open`], which reads
//! `tagkv.toml` from the data directory.

pub use tagkv_core::{
    validate_key, validate_key_with_limits, Error, InvalidValueShape, Key, KeyError, Limits,
    ObjectMap, Persistence, Value, ValueKind, MAX_NESTING_DEPTH,
};
pub use tagkv_engine::*;
pub use tagkv_storage::{
    FileBackend, FileOptions, LoadMode, MemoryBackend, DEFAULT_SNAPSHOT_MAX_COUNT,
};
pub use tagkv_wire::{
    decode, decode_json, decode_slice, decode_value, encode, encode_json, encoded_value_len,
    value_len, DecodeError, Tagged,
};

/// Commonly used items
pub mod prelude {
    pub use crate::{
        GetError, ObjectMap, PutError, RemoveError, Store, StoreConfig, UniquenessPolicy, Value,
        ValueKind,
    };
}
