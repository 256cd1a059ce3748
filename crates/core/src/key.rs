//! Key validation for tagkv
//!
//! This module defines key validation rules that are enforced on every
//! write path. Keys are stored and compared as their UTF-8 bytes.
//!
//! ## Contract
//!
//! - Keys contain only ASCII alphanumerics, `_` and `-`
//! - Keys must not exceed `max_key_bytes` (default: 32)
//!
//! The character rule is checked first: a long key containing a space
//! reports `InvalidCharacter`, not `TooLong`.

use crate::limits::Limits;
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

/// Validate a key using default limits
///
/// # Examples
///
/// ```
/// use tagkv_core::key::validate_key;
///
/// assert!(validate_key("alphaNumeric123").is_ok());
/// assert!(validate_key("A1_b2-C3").is_ok());
///
/// assert!(validate_key("has space").is_err());
/// assert!(validate_key("utf8_ключ").is_err());
/// assert!(validate_key(&"a".repeat(33)).is_err());
/// ```
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    validate_key_with_limits(key, &Limits::default())
}

/// Validate a key with custom limits
pub fn validate_key_with_limits(key: &str, limits: &Limits) -> Result<(), KeyError> {
    if let Some((index, ch)) = key.char_indices().find(|(_, c)| !is_key_char(*c)) {
        return Err(KeyError::InvalidCharacter { ch, index });
    }

    let len = key.len();
    if len > limits.max_key_bytes {
        return Err(KeyError::TooLong {
            actual: len,
            max: limits.max_key_bytes,
        });
    }

    Ok(())
}

#[inline]
fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Key validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Key contains a character outside `[A-Za-z0-9_-]`
    #[error("Key contains invalid character {ch:?} at byte {index}")]
    InvalidCharacter {
        /// First offending character
        ch: char,
        /// Byte offset of the character
        index: usize,
    },

    /// Key exceeds maximum length
    #[error("Key too long: {actual} bytes exceeds maximum {max}")]
    TooLong {
        /// Actual key length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },
}

impl KeyError {
    /// Get the reason code for error reporting
    pub fn reason_code(&self) -> &'static str {
        match self {
            KeyError::InvalidCharacter { .. } => "invalid_character",
            KeyError::TooLong { .. } => "key_too_long",
        }
    }
}

/// A validated key
///
/// Equality, ordering and hashing follow the UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(String);

impl Key {
    /// Validate `raw` against default limits and wrap it
    pub fn new(raw: &str) -> Result<Key, KeyError> {
        Key::with_limits(raw, &Limits::default())
    }

    /// Validate `raw` against `limits` and wrap it
    pub fn with_limits(raw: &str, limits: &Limits) -> Result<Key, KeyError> {
        validate_key_with_limits(raw, limits)?;
        Ok(Key(raw.to_string()))
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key as stored bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consume into the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Key {
    type Error = KeyError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Key::new(raw)
    }
}
