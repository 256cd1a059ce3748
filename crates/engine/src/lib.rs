//! Store engine for tagkv
//!
//! This crate ties the lower layers together:
//! - Store: key admission, value bounds, uniqueness and persistence
//! - StoreConfig: settings loaded from `tagkv.toml`
//! - KeyLocks: per-key serialization of puts and gets
//! - Snapshots and defaults files, through the file backend
//!
//! The engine is the only component that knows about:
//! - The put state machine and where a rejection came from
//! - The uniqueness policy
//! - Default values

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod locks;
pub mod store;

pub use config::{ConfigError, StoreConfig, UniquenessPolicy, CONFIG_FILE_NAME};
pub use error::{GetError, OpenError, PutError, PutStage, RemoveError, SnapshotError};
pub use locks::KeyLocks;
pub use store::Store;
