//! JSON tagged encoding for tagkv values
//!
//! - `encode` / `encode_json`: Value to tagged representation
//! - `decode` / `decode_json` / `decode_slice`: the strict inverse
//! - `value_len` / `encoded_value_len`: the length measure used by the value bound

mod decode;
mod encode;
mod path;
mod strict;
mod tagged;

pub use decode::{decode, decode_json, decode_slice, decode_value, DecodeError};
pub use encode::{encode, encode_json, encoded_value_len, value_len};
pub use tagged::Tagged;

/// Field holding the type tag
pub const TAG_FIELD: &str = "t";

/// Field holding the payload
pub const PAYLOAD_FIELD: &str = "v";
