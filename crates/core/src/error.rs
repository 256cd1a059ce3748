//! Error types for tagkv storage
//!
//! Errors raised by persistence collaborators.
//! Validation and codec failures have their own types next to the code
//! that raises them.

use std::io;
use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the storage layer
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}
