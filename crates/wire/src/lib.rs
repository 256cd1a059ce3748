//! Wire encoding for tagkv
//!
//! This crate implements the tagged representation of tagkv values. Every
//! value, at every nesting level, is written as a two-field JSON object:
//!
//! ```text
//! {"t": "<tag>", "v": <payload>}
//! ```
//!
//! ## Wire Encoding Rules
//!
//! | Value Kind | Tag | Payload |
//! |------------|-----|---------|
//! | I32 / U32 / I64 / U64 | `i32` / `u32` / `i64` / `u64` | integer |
//! | F64 | `f64` | number |
//! | Bool | `bool` | `true`/`false` |
//! | String | `str` | string |
//! | Array | `arr` | array of tagged values |
//! | Object | `obj` | object of tagged values |
//! | Null | `null` | `null` |
//!
//! ## Examples
//!
//! ```
//! use tagkv_wire::{encode_json, decode_json};
//! use tagkv_core::Value;
//!
//! let json = encode_json(&Value::I32(-321));
//! assert_eq!(json, r#"{"t":"i32","v":-321}"#);
//!
//! let decoded = decode_json(&json).unwrap();
//! assert_eq!(decoded, Value::I32(-321));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod json;

// Re-export main types
pub use json::{
    decode, decode_json, decode_slice, decode_value, encode, encode_json, encoded_value_len, value_len,
    DecodeError, Tagged, PAYLOAD_FIELD, TAG_FIELD,
};
