//! Value types for tagkv
//!
//! This module defines:
//! - Value: Unified enum for every storable data type
//! - ValueKind: The closed set of kind tags
//! - InvalidValueShape: Construction failures for out-of-domain input
//!
//! ## Canonical Value Model
//!
//! The Value enum has exactly 10 variants:
//! - I32, U32, I64, U64, F64, Bool, String, Array, Object, Null
//!
//! ### Type Rules
//!
//! - Ten kinds only. Every node, nested members included, carries one tag.
//! - No implicit coercions: `I32(1) != I64(1) != F64(1.0)`.
//! - Numeric kinds keep their machine width.
//! - F64 uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`.
//! - Object equality ignores field order; iteration keeps insertion order.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::limits::MAX_NESTING_DEPTH;

/// Object member map: unique field names, insertion-ordered
pub type ObjectMap = IndexMap<String, Value>;

/// Canonical tagkv value type
///
/// Members of `Array` and `Object` are owned directly; values are trees,
/// never graphs.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit signed integer
    I32(i32),
    /// 32-bit unsigned integer
    U32(u32),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit unsigned integer
    U64(u64),
    /// 64-bit floating point (IEEE-754)
    F64(f64),
    /// Boolean value
    Bool(bool),
    /// UTF-8 string
    String(String),
    /// Ordered sequence of values
    Array(Vec<Value>),
    /// Field name to value mapping
    Object(ObjectMap),
    /// Null value
    Null,
}

/// The closed set of value kinds and their wire tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// `i64`
    I64,
    /// `u64`
    U64,
    /// `f64`
    F64,
    /// `bool`
    Bool,
    /// `str`
    String,
    /// `arr`
    Array,
    /// `obj`
    Object,
    /// `null`
    Null,
}

impl ValueKind {
    /// All kinds in declaration order
    pub const ALL: [ValueKind; 10] = [
        ValueKind::I32,
        ValueKind::U32,
        ValueKind::I64,
        ValueKind::U64,
        ValueKind::F64,
        ValueKind::Bool,
        ValueKind::String,
        ValueKind::Array,
        ValueKind::Object,
        ValueKind::Null,
    ];

    /// Wire tag for this kind
    pub fn tag(self) -> &'static str {
        match self {
            ValueKind::I32 => "i32",
            ValueKind::U32 => "u32",
            ValueKind::I64 => "i64",
            ValueKind::U64 => "u64",
            ValueKind::F64 => "f64",
            ValueKind::Bool => "bool",
            ValueKind::String => "str",
            ValueKind::Array => "arr",
            ValueKind::Object => "obj",
            ValueKind::Null => "null",
        }
    }

    /// Resolve a wire tag
    pub fn from_tag(tag: &str) -> Result<ValueKind, InvalidValueShape> {
        ValueKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| InvalidValueShape::UnknownTag(tag.to_string()))
    }

    /// Whether values of this kind hold other values
    pub fn is_composite(self) -> bool {
        matches!(self, ValueKind::Array | ValueKind::Object)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ValueKind {
    type Err = InvalidValueShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::from_tag(s)
    }
}

/// A representation that does not describe any Value
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidValueShape {
    /// Tag is not one of the ten kind tags
    #[error("unknown type tag '{0}'")]
    UnknownTag(String),

    /// Payload has the wrong JSON type for the tag
    #[error("tag '{tag}' expects {expected}, found {found}")]
    PayloadMismatch {
        /// Kind tag
        tag: &'static str,
        /// Expected payload shape
        expected: &'static str,
        /// Actual payload shape
        found: &'static str,
    },

    /// Integer payload does not fit the tag's width
    #[error("{payload} is out of range for '{tag}'")]
    OutOfRange {
        /// Kind tag
        tag: &'static str,
        /// Offending payload, as written
        payload: String,
    },

    /// Composite tag passed where a scalar was required
    #[error("tag '{0}' is composite")]
    NotScalar(&'static str),

    /// Float that has no JSON number representation
    #[error("f64 value {0} is not finite")]
    NonFinite(f64),

    /// Arrays and objects nested deeper than the codec accepts
    #[error("nesting depth {depth} exceeds maximum {max}")]
    TooDeep {
        /// Depth of the value
        depth: usize,
        /// Maximum accepted depth
        max: usize,
    },
}

impl InvalidValueShape {
    /// Get the reason code for error reporting
    pub fn reason_code(&self) -> &'static str {
        match self {
            InvalidValueShape::UnknownTag(_) => "unknown_tag",
            InvalidValueShape::PayloadMismatch { .. } => "payload_mismatch",
            InvalidValueShape::OutOfRange { .. } => "out_of_range",
            InvalidValueShape::NotScalar(_) => "not_scalar",
            InvalidValueShape::NonFinite(_) => "non_finite",
            InvalidValueShape::TooDeep { .. } => "too_deep",
        }
    }
}

/// JSON type name used in shape errors
pub fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(n) if n.is_f64() => "float",
        serde_json::Value::Number(_) => "integer",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl Value {
    /// Kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::I32(_) => ValueKind::I32,
            Value::U32(_) => ValueKind::U32,
            Value::I64(_) => ValueKind::I64,
            Value::U64(_) => ValueKind::U64,
            Value::F64(_) => ValueKind::F64,
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Null => ValueKind::Null,
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.kind().tag()
    }

    /// Build a scalar value from a wire tag and its JSON payload
    ///
    /// Integers must be JSON integers within the tag's width; `f64` accepts
    /// any JSON number. Composite tags are rejected, the codec assembles
    /// those itself.
    pub fn from_scalar(tag: &str, payload: &serde_json::Value) -> Result<Value, InvalidValueShape> {
        let kind = ValueKind::from_tag(tag)?;
        let mismatch = |expected: &'static str| InvalidValueShape::PayloadMismatch {
            tag: kind.tag(),
            expected,
            found: json_type_name(payload),
        };
        let out_of_range = || InvalidValueShape::OutOfRange {
            tag: kind.tag(),
            payload: payload.to_string(),
        };

        match kind {
            ValueKind::Array | ValueKind::Object => Err(InvalidValueShape::NotScalar(kind.tag())),
            ValueKind::Null => match payload {
                serde_json::Value::Null => Ok(Value::Null),
                _ => Err(mismatch("null")),
            },
            ValueKind::Bool => payload.as_bool().map(Value::Bool).ok_or_else(|| mismatch("boolean")),
            ValueKind::String => payload
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(|| mismatch("string")),
            ValueKind::F64 => payload.as_f64().map(Value::F64).ok_or_else(|| mismatch("number")),
            ValueKind::I32 | ValueKind::U32 | ValueKind::I64 | ValueKind::U64 => {
                let n = match payload {
                    serde_json::Value::Number(n) if !n.is_f64() => n,
                    _ => return Err(mismatch("integer")),
                };
                // Integer JSON numbers are either i64 or u64-above-i64::MAX
                let wide: i128 = match (n.as_i64(), n.as_u64()) {
                    (Some(i), _) => i as i128,
                    (None, Some(u)) => u as i128,
                    (None, None) => return Err(mismatch("integer")),
                };
                match kind {
                    ValueKind::I32 => i32::try_from(wide).map(Value::I32).map_err(|_| out_of_range()),
                    ValueKind::U32 => u32::try_from(wide).map(Value::U32).map_err(|_| out_of_range()),
                    ValueKind::I64 => i64::try_from(wide).map(Value::I64).map_err(|_| out_of_range()),
                    _ => u64::try_from(wide).map(Value::U64).map_err(|_| out_of_range()),
                }
            }
        }
    }

    /// Check the value lies in the encodable domain
    ///
    /// Every F64 in the tree must be finite and the tree may nest at most
    /// `MAX_NESTING_DEPTH` levels, the same bound the decoder enforces.
    pub fn check_domain(&self) -> Result<(), InvalidValueShape> {
        let depth = self.depth();
        if depth > MAX_NESTING_DEPTH {
            return Err(InvalidValueShape::TooDeep {
                depth,
                max: MAX_NESTING_DEPTH,
            });
        }
        self.check_floats()
    }

    fn check_floats(&self) -> Result<(), InvalidValueShape> {
        match self {
            Value::F64(f) if !f.is_finite() => Err(InvalidValueShape::NonFinite(*f)),
            Value::Array(items) => items.iter().try_for_each(Value::check_floats),
            Value::Object(fields) => fields.values().try_for_each(Value::check_floats),
            _ => Ok(()),
        }
    }

    /// Nesting depth (scalars are depth 0)
    pub fn depth(&self) -> usize {
        match self {
            Value::Array(items) => 1 + items.iter().map(Value::depth).max().unwrap_or(0),
            Value::Object(fields) => 1 + fields.values().map(Value::depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is any integer kind
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::I32(_) | Value::U32(_) | Value::I64(_) | Value::U64(_))
    }

    /// Check if this is an array value
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Check if this is an object value
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is a signed integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(i) => Some(i64::from(*i)),
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as u64 if this is an unsigned integer value
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U32(u) => Some(u64::from(*u)),
            Value::U64(u) => Some(*u),
            _ => None,
        }
    }

    /// Get as f64 if this is an F64 value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[Value] if this is an Array value
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as the member map if this is an Object value
    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::I32(i)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::U32(u)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::U64(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<ObjectMap> for Value {
    fn from(o: ObjectMap) -> Self {
        Value::Object(o)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(o: HashMap<String, Value>) -> Self {
        Value::Object(o.into_iter().collect())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
