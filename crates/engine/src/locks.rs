//! Per-key lock table
//!
//! Operations on the same key are serialized; operations on distinct keys
//! never contend beyond the brief shard lock taken to look up the mutex.
//! A key's mutex is dropped from the table once no operation holds it, so
//! the table only ever holds keys with an operation in flight.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Lazily populated map from key bytes to that key's mutex
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<Vec<u8>, Arc<Mutex<()>>>,
}

impl KeyLocks {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutex for `key`, created on first use
    ///
    /// Callers hold the returned `Arc` and lock it for the duration of the
    /// operation:
    ///
    /// ```
    /// use tagkv_engine::KeyLocks;
    ///
    /// let locks = KeyLocks::new();
    /// let lock = locks.lock_for(b"user");
    /// let _guard = lock.lock();
    /// ```
    pub fn lock_for(&self, key: &[u8]) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(key) {
            return Arc::clone(&lock);
        }
        self.locks
            .entry(key.to_vec())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding the mutex for `key`
    ///
    /// The mutex is evicted afterwards unless another caller holds it.
    ///
    /// ```
    /// use tagkv_engine::KeyLocks;
    ///
    /// let locks = KeyLocks::new();
    /// let answer = locks.with_lock(b"user", || 42);
    /// assert_eq!(answer, 42);
    /// assert!(locks.is_empty());
    /// ```
    pub fn with_lock<R>(&self, key: &[u8], f: impl FnOnce() -> R) -> R {
        let lock = self.lock_for(key);
        let result = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        // Clones are only handed out under the shard lock, so a count of one
        // means nobody is waiting on this mutex.
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Number of keys that have a mutex
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no mutex has been created yet
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
