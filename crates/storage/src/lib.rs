//! Storage layer for tagkv
//!
//! This crate implements the persistence collaborators the store engine
//! writes through:
//! - MemoryBackend: DashMap-backed, nothing leaves the process
//! - FileBackend: checksummed JSON files per store instance, with rotating
//!   snapshots and an optional defaults file
//!
//! Both implement [`tagkv_core::Persistence`]. Neither interprets keys or
//! values beyond what its medium requires.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod file;
pub mod memory;

pub use file::{FileBackend, FileOptions, LoadMode, DEFAULT_SNAPSHOT_MAX_COUNT};
pub use memory::MemoryBackend;
pub use tagkv_core::Persistence;
