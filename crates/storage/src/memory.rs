//! In-memory persistence
//!
//! DashMap gives sharded writes and lock-free reads. Every call replaces or
//! reads a whole entry, so readers never see partial values.

use dashmap::DashMap;
use tagkv_core::{Persistence, Result};

/// Process-local persistence backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<Vec<u8>, Vec<u8>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Persistence for MemoryBackend {
    fn persist(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn retrieve(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn remove(&self, key: &[u8]) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>> {
        let mut keys: Vec<Vec<u8>> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn clear(&self) -> Result<usize> {
        let removed = self.entries.len();
        self.entries.clear();
        Ok(removed)
    }
}
