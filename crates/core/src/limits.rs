//! Size limits for keys and values
//!
//! This module defines the limits enforced by the key validator and the
//! store engine. Defaults match the store contract: 32-byte keys and
//! 1024-byte values. Custom limits can be set at store open time.

use thiserror::Error;

/// Default maximum key length in bytes
pub const DEFAULT_MAX_KEY_BYTES: usize = 32;

/// Default maximum value length in bytes
pub const DEFAULT_MAX_VALUE_BYTES: usize = 1024;

/// Maximum nesting depth of a value, as measured by `Value::depth`
///
/// Each nesting level takes two levels of JSON text (the tagged node and its
/// payload container), so a value at this depth stays well inside the JSON
/// parser's recursion limit even when wrapped in a file-level map.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Size limits for keys and values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum key length in bytes (default: 32)
    pub max_key_bytes: usize,

    /// Maximum value length in bytes (default: 1024)
    pub max_value_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_key_bytes: DEFAULT_MAX_KEY_BYTES,
            max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        Limits {
            max_key_bytes: 8,
            max_value_bytes: 64,
        }
    }

    /// Validate a measured value length
    pub fn validate_value_len(&self, len: usize) -> Result<(), LimitError> {
        if len > self.max_value_bytes {
            return Err(LimitError::ValueTooLarge {
                actual: len,
                max: self.max_value_bytes,
            });
        }
        Ok(())
    }
}

/// Limit validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimitError {
    /// Value exceeds the length bound
    #[error("Value too large: {actual} bytes exceeds maximum {max}")]
    ValueTooLarge {
        /// Measured length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },
}
