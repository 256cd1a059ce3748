//! The tagged representation as a value
//!
//! `Tagged` wraps the JSON tree produced by `encode`. It is only a carrier:
//! a `Tagged` built from arbitrary JSON is checked when it is decoded.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::decode::DecodeError;
use super::strict;
use super::{PAYLOAD_FIELD, TAG_FIELD};

/// Canonical `{"t": tag, "v": payload}` form of a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tagged(serde_json::Value);

impl Tagged {
    pub(crate) fn new(json: serde_json::Value) -> Self {
        Tagged(json)
    }

    /// Wrap an arbitrary JSON tree without checking it
    pub fn from_json(json: serde_json::Value) -> Self {
        Tagged(json)
    }

    /// Parse JSON text into an unchecked `Tagged`
    ///
    /// Repeated member names are rejected here, before any shape check.
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        strict::from_str(text)
            .map(Tagged)
            .map_err(|e| DecodeError::InvalidJson(e.to_string()))
    }

    /// The root tag, if present and a string
    pub fn tag(&self) -> Option<&str> {
        self.0.get(TAG_FIELD).and_then(serde_json::Value::as_str)
    }

    /// The root payload, if present
    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.0.get(PAYLOAD_FIELD)
    }

    /// Borrow the JSON tree
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Consume into the JSON tree
    pub fn into_json(self) -> serde_json::Value {
        self.0
    }

    /// Compact JSON bytes, as persisted
    pub fn to_vec(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Tagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
