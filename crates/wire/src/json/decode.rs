//! Decoding of tagged representations back into values
//!
//! Decoding is strict. At every nesting level the node must be an object
//! with exactly the fields `t` and `v`, the tag must be one of the ten kind
//! tags, and the payload must have the shape the tag demands. Integer
//! payloads are never widened or narrowed to fit. Text input with a repeated
//! member name anywhere is rejected as `InvalidJson` rather than letting the
//! last occurrence win.

use tagkv_core::{json_type_name, InvalidValueShape, ObjectMap, Value, ValueKind, MAX_NESTING_DEPTH};
use thiserror::Error;

use super::path::Path;
use super::strict;
use super::tagged::Tagged;
use super::{PAYLOAD_FIELD, TAG_FIELD};

/// Decode error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Input is not JSON at all
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// A node does not have the `{"t", "v"}` shape its tag requires
    #[error("Malformed tag at {path}: {reason}")]
    MalformedTag {
        /// Location of the offending node, e.g. `arr[4].obj.sub-number`
        path: String,
        /// What was wrong with it
        reason: String,
    },

    /// An integer payload does not fit the width named by its tag
    #[error("Numeric overflow at {path}: {payload} does not fit '{tag}'")]
    NumericOverflow {
        /// Location of the offending node
        path: String,
        /// Integer tag
        tag: &'static str,
        /// Payload as written
        payload: String,
    },
}

impl DecodeError {
    /// Location of the failure, when it has one
    pub fn path(&self) -> Option<&str> {
        match self {
            DecodeError::InvalidJson(_) => None,
            DecodeError::MalformedTag { path, .. } | DecodeError::NumericOverflow { path, .. } => {
                Some(path)
            }
        }
    }

    /// Get the reason code for error reporting
    pub fn reason_code(&self) -> &'static str {
        match self {
            DecodeError::InvalidJson(_) => "invalid_json",
            DecodeError::MalformedTag { .. } => "malformed_tag",
            DecodeError::NumericOverflow { .. } => "numeric_overflow",
        }
    }
}

/// Decode a tagged representation to a Value
pub fn decode(tagged: &Tagged) -> Result<Value, DecodeError> {
    decode_value(tagged.as_json())
}

/// Decode a JSON tree holding a tagged representation
pub fn decode_value(json: &serde_json::Value) -> Result<Value, DecodeError> {
    Decoder::default().node(json)
}

/// Decode tagged JSON text
pub fn decode_json(text: &str) -> Result<Value, DecodeError> {
    decode(&Tagged::parse(text)?)
}

/// Decode tagged JSON bytes, as read back from persistence
pub fn decode_slice(bytes: &[u8]) -> Result<Value, DecodeError> {
    let json = strict::from_slice(bytes).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    decode_value(&json)
}

#[derive(Default)]
struct Decoder {
    path: Path,
}

impl Decoder {
    fn malformed(&self, reason: impl Into<String>) -> DecodeError {
        DecodeError::MalformedTag {
            path: self.path.to_string(),
            reason: reason.into(),
        }
    }

    fn node(&mut self, json: &serde_json::Value) -> Result<Value, DecodeError> {
        let fields = json.as_object().ok_or_else(|| {
            self.malformed(format!(
                "expected tagged object, found {}",
                json_type_name(json)
            ))
        })?;

        if let Some(extra) = fields
            .keys()
            .find(|name| name.as_str() != TAG_FIELD && name.as_str() != PAYLOAD_FIELD)
        {
            return Err(self.malformed(format!("unexpected field '{}'", extra)));
        }
        let tag = fields
            .get(TAG_FIELD)
            .ok_or_else(|| self.malformed(format!("missing field '{}'", TAG_FIELD)))?;
        let payload = fields
            .get(PAYLOAD_FIELD)
            .ok_or_else(|| self.malformed(format!("missing field '{}'", PAYLOAD_FIELD)))?;

        let tag = tag.as_str().ok_or_else(|| {
            self.malformed(format!("tag must be a string, found {}", json_type_name(tag)))
        })?;
        let kind = ValueKind::from_tag(tag).map_err(|e| self.malformed(e.to_string()))?;

        // A container at path depth d makes the value at least d + 1 deep
        if kind.is_composite() && self.path.depth() >= MAX_NESTING_DEPTH {
            return Err(self.malformed(format!(
                "nesting exceeds {} levels",
                MAX_NESTING_DEPTH
            )));
        }

        match kind {
            ValueKind::Array => self.array(payload),
            ValueKind::Object => self.object(payload),
            _ => Value::from_scalar(tag, payload).map_err(|e| self.scalar_error(e)),
        }
    }

    fn array(&mut self, payload: &serde_json::Value) -> Result<Value, DecodeError> {
        let items = payload.as_array().ok_or_else(|| {
            self.malformed(format!(
                "tag 'arr' expects array, found {}",
                json_type_name(payload)
            ))
        })?;

        let mut values = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            self.path.push_index(index);
            values.push(self.node(item)?);
            self.path.pop();
        }
        Ok(Value::Array(values))
    }

    fn object(&mut self, payload: &serde_json::Value) -> Result<Value, DecodeError> {
        let members = payload.as_object().ok_or_else(|| {
            self.malformed(format!(
                "tag 'obj' expects object, found {}",
                json_type_name(payload)
            ))
        })?;

        let mut fields = ObjectMap::with_capacity(members.len());
        for (name, member) in members {
            self.path.push_field(name);
            let value = self.node(member)?;
            self.path.pop();
            fields.insert(name.clone(), value);
        }
        Ok(Value::Object(fields))
    }

    fn scalar_error(&self, err: InvalidValueShape) -> DecodeError {
        match err {
            InvalidValueShape::OutOfRange { tag, payload } => DecodeError::NumericOverflow {
                path: self.path.to_string(),
                tag,
                payload,
            },
            other => self.malformed(other.to_string()),
        }
    }
}
