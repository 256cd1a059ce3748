//! Core types for tagkv
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: The ten-kind value enum and its construction rules
//! - ValueKind: Kind tags (`i32`, `u32`, ..., `null`)
//! - Key: Validated key newtype and the key validator
//! - Limits: Key and value length bounds
//! - Error: Storage error hierarchy
//! - Persistence: The storage-medium boundary trait

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod limits;
pub mod traits;
pub mod value;

pub use error::{Error, Result};
pub use key::{validate_key, validate_key_with_limits, Key, KeyError};
pub use limits::{LimitError, Limits, DEFAULT_MAX_KEY_BYTES, DEFAULT_MAX_VALUE_BYTES, MAX_NESTING_DEPTH};
pub use traits::Persistence;
pub use value::{json_type_name, InvalidValueShape, ObjectMap, Value, ValueKind};
