//! Error types for store operations
//!
//! Each store operation has its own error enum so callers can match on
//! exactly the failures that operation can produce. A rejected put never
//! creates or mutates an entry; a failed get never has side effects.

use std::fmt;
use std::path::PathBuf;
use tagkv_core::{Error, InvalidValueShape, KeyError, LimitError};
use tagkv_wire::DecodeError;
use thiserror::Error;

use crate::config::ConfigError;

/// Stages of a put, in order
///
/// `Received → KeyValidated → ValueEncoded → SizeChecked →
/// UniquenessChecked → Persisted`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PutStage {
    /// Raw key and value accepted by the call
    Received,
    /// Key passed the character and length rules
    KeyValidated,
    /// Value is in the encodable domain and has been encoded
    ValueEncoded,
    /// Value length is within the bound
    SizeChecked,
    /// Uniqueness policy allows the write
    UniquenessChecked,
    /// Entry written to the persistence collaborator
    Persisted,
}

impl PutStage {
    /// Stage name as used in log records
    pub fn as_str(self) -> &'static str {
        match self {
            PutStage::Received => "received",
            PutStage::KeyValidated => "key_validated",
            PutStage::ValueEncoded => "value_encoded",
            PutStage::SizeChecked => "size_checked",
            PutStage::UniquenessChecked => "uniqueness_checked",
            PutStage::Persisted => "persisted",
        }
    }
}

impl fmt::Display for PutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Put rejections
#[derive(Debug, Error)]
pub enum PutError {
    /// Key failed validation
    #[error("Invalid key: {0}")]
    Key(#[from] KeyError),

    /// Value is outside the encodable domain
    #[error("Invalid value: {0}")]
    InvalidValue(#[from] InvalidValueShape),

    /// Value length exceeds the bound
    #[error("Value too long: {actual} bytes exceeds maximum {max}")]
    ValueTooLong {
        /// Measured length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Key already holds a value and the policy is `Reject`
    #[error("Duplicate key: '{key}' already exists")]
    DuplicateKey {
        /// The existing key
        key: String,
    },

    /// The persistence collaborator failed
    #[error("Storage error: {0}")]
    Storage(#[from] Error),
}

impl From<LimitError> for PutError {
    fn from(e: LimitError) -> Self {
        match e {
            LimitError::ValueTooLarge { actual, max } => PutError::ValueTooLong { actual, max },
        }
    }
}

impl PutError {
    /// Last stage the put reached before it was rejected
    pub fn stage(&self) -> PutStage {
        match self {
            PutError::Key(_) => PutStage::Received,
            PutError::InvalidValue(_) => PutStage::KeyValidated,
            PutError::ValueTooLong { .. } => PutStage::ValueEncoded,
            PutError::DuplicateKey { .. } => PutStage::SizeChecked,
            PutError::Storage(_) => PutStage::UniquenessChecked,
        }
    }

    /// Get the reason code for error reporting
    pub fn reason_code(&self) -> &'static str {
        match self {
            PutError::Key(e) => e.reason_code(),
            PutError::InvalidValue(e) => e.reason_code(),
            PutError::ValueTooLong { .. } => "value_too_long",
            PutError::DuplicateKey { .. } => "duplicate_key",
            PutError::Storage(_) => "storage",
        }
    }
}

/// Get failures
#[derive(Debug, Error)]
pub enum GetError {
    /// No entry under the key
    #[error("Key not found: '{key}'")]
    NotFound {
        /// Requested key
        key: String,
    },

    /// Stored bytes do not decode to a value
    #[error("Corrupt entry for '{key}': {source}")]
    Corrupt {
        /// Requested key
        key: String,
        /// Decode failure
        #[source]
        source: DecodeError,
    },

    /// The persistence collaborator failed
    #[error("Storage error: {0}")]
    Storage(#[from] Error),
}

impl GetError {
    /// Whether this is `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, GetError::NotFound { .. })
    }

    /// Get the reason code for error reporting
    pub fn reason_code(&self) -> &'static str {
        match self {
            GetError::NotFound { .. } => "not_found",
            GetError::Corrupt { .. } => "corrupt",
            GetError::Storage(_) => "storage",
        }
    }
}

/// Remove and reset failures
#[derive(Debug, Error)]
pub enum RemoveError {
    /// Nothing to remove (or, for a reset, no default to fall back to)
    #[error("Key not found: '{key}'")]
    NotFound {
        /// Requested key
        key: String,
    },

    /// The persistence collaborator failed
    #[error("Storage error: {0}")]
    Storage(#[from] Error),
}

/// Store open failures
#[derive(Debug, Error)]
pub enum OpenError {
    /// `tagkv.toml` could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backing medium could not be opened
    #[error("Storage error: {0}")]
    Storage(#[from] Error),

    /// A default value would be rejected by `put`
    #[error("Invalid default for '{key}': {source}")]
    InvalidDefault {
        /// Key of the rejected default
        key: String,
        /// Why `put` would reject it
        #[source]
        source: PutError,
    },

    /// A value in the defaults file does not decode
    #[error("Corrupt default for '{key}': {source}")]
    CorruptDefault {
        /// Key of the default
        key: String,
        /// Decode failure
        #[source]
        source: DecodeError,
    },

    /// Defaults are required but the defaults file does not exist
    #[error("Defaults file '{}' is required but missing", .path.display())]
    DefaultsMissing {
        /// Expected defaults file
        path: PathBuf,
    },
}

/// Snapshot failures
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No restorable snapshot has this id
    #[error("Invalid snapshot id {id}: {count} generation(s) on disk")]
    InvalidSnapshotId {
        /// Requested snapshot
        id: usize,
        /// Generations present, current file included
        count: usize,
    },

    /// The requested generation has no file on disk
    #[error("No file for snapshot {snapshot_id}")]
    FileNotFound {
        /// Requested snapshot
        snapshot_id: usize,
    },

    /// The persistence collaborator failed
    #[error("Storage error: {0}")]
    Storage(#[from] Error),
}

impl SnapshotError {
    /// Get the reason code for error reporting
    pub fn reason_code(&self) -> &'static str {
        match self {
            SnapshotError::InvalidSnapshotId { .. } => "invalid_snapshot_id",
            SnapshotError::FileNotFound { .. } => "file_not_found",
            SnapshotError::Storage(_) => "storage",
        }
    }
}
