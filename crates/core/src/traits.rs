//! Core trait for the persistence boundary
//!
//! The store engine talks to its storage medium only through
//! [`Persistence`], so validation and codec logic can be exercised
//! without I/O and backends can be swapped without touching the engine.

use crate::error::Result;

/// Byte-level persistence collaborator
///
/// Keys are the UTF-8 bytes of validated keys; values are encoded tagged
/// representations. Implementations never interpret either.
///
/// Thread safety: All methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync). Each call must be atomic with
/// respect to readers: a `retrieve` never observes a half-written value.
pub trait Persistence: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be made durable in the medium.
    fn persist(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Fetch the bytes stored under `key`
    ///
    /// Returns `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn retrieve(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Remove `key`, returning whether it was present
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn remove(&self, key: &[u8]) -> Result<bool>;

    /// All stored keys, in byte order
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn keys(&self) -> Result<Vec<Vec<u8>>>;

    /// Whether `key` is present
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.retrieve(key)?.is_some())
    }

    /// Remove every key, returning how many were present
    ///
    /// The default removes keys one at a time; backends that rewrite their
    /// whole medium per mutation should override it with a single write.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for key in self.keys()? {
            if self.remove(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
