//! Store: validated key-value access over a persistence collaborator
//!
//! ## Put
//!
//! `Received → KeyValidated → ValueEncoded → SizeChecked →
//! UniquenessChecked → Persisted`. A rejection at any stage leaves storage
//! untouched; `PutError::stage()` reports where it happened.
//!
//! ## Get
//!
//! Retrieve the stored bytes, decode them strictly. A key that could never
//! have been admitted is simply not found, without touching the lock table.
//!
//! ## Thread Safety
//!
//! `Store` is `Send + Sync` and is shared by `Arc`. Puts and gets of the
//! same key are serialized through [`KeyLocks`]; distinct keys proceed in
//! parallel. Whole-store operations (`reset_all_keys`, `snapshot_restore`)
//! wait for in-flight key operations and block new ones until they finish.
//!
//! ## Snapshots
//!
//! File-backed stores keep up to `snapshot_max_count` generations of their
//! data file, the current one included. Every write shifts the older
//! generations; `snapshot_restore(id)` brings generation `id` back.
//!
//! ## Observability
//!
//! Every completed put and get emits an info event with the fields `key`
//! and `value`, the latter being the compact tagged JSON.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagkv_core::{Error, Key, Limits, Persistence, Value};
use tagkv_storage::{FileBackend, LoadMode, MemoryBackend};
use tagkv_wire::{decode_slice, encode_json, encoded_value_len};
use tracing::{debug, info, warn};

use crate::config::{StoreConfig, UniquenessPolicy, CONFIG_FILE_NAME};
use crate::error::{GetError, OpenError, PutError, RemoveError, SnapshotError};
use crate::locks::KeyLocks;

/// Embedded key-value store
///
/// # Example
///
/// ```
/// use tagkv_core::Value;
/// use tagkv_engine::Store;
///
/// let store = Store::ephemeral();
/// store.put("i32", Value::I32(-321)).unwrap();
/// assert_eq!(store.get("i32").unwrap(), Value::I32(-321));
///
/// // Default policy rejects a second put of the same key
/// assert!(store.put("i32", Value::I32(1)).is_err());
/// ```
pub struct Store {
    persistence: Arc<dyn Persistence>,
    /// Same backend as `persistence` when it is file-backed
    files: Option<Arc<FileBackend>>,
    policy: UniquenessPolicy,
    limits: Limits,
    locks: KeyLocks,
    /// Key operations hold it shared, whole-store operations exclusively
    bulk: RwLock<()>,
    defaults: HashMap<String, Value>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("policy", &self.policy)
            .field("limits", &self.limits)
            .field("file_backed", &self.files.is_some())
            .field("defaults", &self.defaults.len())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open a file-backed store in `dir`
    ///
    /// Creates the directory and a default `tagkv.toml` if they are missing,
    /// then loads the config and the instance's data file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the data file cannot be
    /// loaded (including a checksum mismatch).
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Store, OpenError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(Error::from)?;

        let config_path = dir.join(CONFIG_FILE_NAME);
        StoreConfig::write_default_if_missing(&config_path)?;
        let config = StoreConfig::from_file(&config_path)?;

        Self::open_with_config(dir, &config)
    }

    /// Open a file-backed store in `dir` with an explicit config
    ///
    /// `tagkv.toml` is neither read nor written. The data file is loaded as
    /// `kvs_load` says, and defaults come from the instance's defaults file
    /// as `defaults` says.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the data file cannot be
    /// loaded, or the defaults file is missing when required or holds a
    /// value `put` would reject.
    pub fn open_with_config<P: AsRef<Path>>(
        dir: P,
        config: &StoreConfig,
    ) -> Result<Store, OpenError> {
        let dir = dir.as_ref();
        config.validate()?;
        let defaults = Self::read_defaults_file(dir, config)?;
        let files = Arc::new(FileBackend::open_with_options(
            dir,
            config.instance_id,
            &config.file_options()?,
        )?);
        let persistence: Arc<dyn Persistence> = files.clone();
        Self::build(persistence, Some(files), config)?.with_defaults(defaults)
    }

    fn read_defaults_file(
        dir: &Path,
        config: &StoreConfig,
    ) -> Result<Vec<(String, Value)>, OpenError> {
        let mode = config.defaults_mode()?;
        if mode == LoadMode::Ignored {
            return Ok(Vec::new());
        }
        let Some(raw) = FileBackend::read_defaults(dir, config.instance_id)? else {
            if mode == LoadMode::Required {
                return Err(OpenError::DefaultsMissing {
                    path: FileBackend::defaults_filename(dir, config.instance_id),
                });
            }
            return Ok(Vec::new());
        };

        raw.into_iter()
            .map(|(key, bytes)| match decode_slice(&bytes) {
                Ok(value) => Ok((key, value)),
                Err(source) => Err(OpenError::CorruptDefault { key, source }),
            })
            .collect()
    }

    /// In-memory store with the default config
    ///
    /// Nothing is written to disk. Useful for tests.
    pub fn ephemeral() -> Store {
        Store {
            persistence: Arc::new(MemoryBackend::new()),
            files: None,
            policy: UniquenessPolicy::default(),
            limits: Limits::default(),
            locks: KeyLocks::new(),
            bulk: RwLock::new(()),
            defaults: HashMap::new(),
        }
    }

    /// Store over any persistence collaborator
    ///
    /// The file settings of `config` (`snapshot_max_count`, `defaults`,
    /// `kvs_load`) are validated but unused; such a store keeps no snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid.
    pub fn with_persistence(
        persistence: Arc<dyn Persistence>,
        config: &StoreConfig,
    ) -> Result<Store, OpenError> {
        Self::build(persistence, None, config)
    }

    fn build(
        persistence: Arc<dyn Persistence>,
        files: Option<Arc<FileBackend>>,
        config: &StoreConfig,
    ) -> Result<Store, OpenError> {
        config.validate()?;
        let store = Store {
            persistence,
            files,
            policy: config.uniqueness_policy()?,
            limits: config.limits(),
            locks: KeyLocks::new(),
            bulk: RwLock::new(()),
            defaults: HashMap::new(),
        };
        info!(
            uniqueness = %store.policy,
            instance_id = config.instance_id,
            max_key_bytes = store.limits.max_key_bytes,
            max_value_bytes = store.limits.max_value_bytes,
            "Opened store"
        );
        Ok(store)
    }

    /// Attach default values
    ///
    /// A default applies to `get_or_default` whenever the key has no
    /// stored value. Each default must pass the same key and value rules
    /// as `put`.
    ///
    /// # Errors
    ///
    /// Returns `OpenError::InvalidDefault` for the first default `put`
    /// would reject.
    pub fn with_defaults<I, K>(mut self, defaults: I) -> Result<Store, OpenError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (key, value) in defaults {
            let key = key.into();
            if let Err(source) = self.admit(&key, &value) {
                return Err(OpenError::InvalidDefault { key, source });
            }
            self.defaults.insert(key, value);
        }
        Ok(self)
    }

    /// Uniqueness policy in force
    pub fn uniqueness(&self) -> UniquenessPolicy {
        self.policy
    }

    /// Key and value bounds in force
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // ========== Put / Get ==========

    /// Store `value` under `key`
    ///
    /// # Errors
    ///
    /// - `PutError::Key` if the key fails validation
    /// - `PutError::InvalidValue` if the value cannot be encoded
    /// - `PutError::ValueTooLong` if the value exceeds the length bound
    /// - `PutError::DuplicateKey` if the key exists under `Reject`
    /// - `PutError::Storage` if the collaborator fails
    pub fn put(&self, key: &str, value: impl Into<Value>) -> Result<(), PutError> {
        let value = value.into();
        self.put_value(key, &value).map_err(|e| {
            debug!(key, stage = %e.stage(), reason = e.reason_code(), "Put rejected");
            e
        })
    }

    fn put_value(&self, raw: &str, value: &Value) -> Result<(), PutError> {
        let (key, encoded) = self.admit(raw, value)?;

        let _bulk = self.bulk.read();
        self.locks.with_lock(key.as_bytes(), || -> Result<(), PutError> {
            if self.policy == UniquenessPolicy::Reject
                && self.persistence.contains(key.as_bytes())?
            {
                return Err(PutError::DuplicateKey {
                    key: key.as_str().to_string(),
                });
            }

            self.persistence.persist(key.as_bytes(), encoded.as_bytes())?;
            info!(key = key.as_str(), value = %encoded, "Stored value");
            Ok(())
        })
    }

    /// Key, domain and size checks shared by `put` and defaults
    fn admit(&self, raw: &str, value: &Value) -> Result<(Key, String), PutError> {
        let key = Key::with_limits(raw, &self.limits)?;
        value.check_domain()?;
        let encoded = encode_json(value);
        self.limits
            .validate_value_len(encoded_value_len(value, &encoded))?;
        Ok((key, encoded))
    }

    /// Whether `raw` could ever have been stored
    fn admissible(&self, raw: &str) -> bool {
        Key::with_limits(raw, &self.limits).is_ok()
    }

    /// Fetch the value stored under `key`
    ///
    /// # Errors
    ///
    /// - `GetError::NotFound` if nothing is stored under the key
    /// - `GetError::Corrupt` if the stored bytes do not decode
    /// - `GetError::Storage` if the collaborator fails
    pub fn get(&self, key: &str) -> Result<Value, GetError> {
        let bytes = if self.admissible(key) {
            let _bulk = self.bulk.read();
            self.locks
                .with_lock(key.as_bytes(), || self.persistence.retrieve(key.as_bytes()))?
        } else {
            None
        };

        let Some(bytes) = bytes else {
            debug!(key, "Key not found");
            return Err(GetError::NotFound {
                key: key.to_string(),
            });
        };

        let value = decode_slice(&bytes).map_err(|source| {
            warn!(key, reason = source.reason_code(), error = %source, "Stored value does not decode");
            GetError::Corrupt {
                key: key.to_string(),
                source,
            }
        })?;

        info!(key, value = %encode_json(&value), "Retrieved value");
        Ok(value)
    }

    // ========== Keys / Remove ==========

    /// All stored keys, sorted by their bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator fails or holds a non-UTF-8 key.
    pub fn keys(&self) -> Result<Vec<String>, Error> {
        let mut keys = self
            .persistence
            .keys()?
            .into_iter()
            .map(|k| {
                String::from_utf8(k)
                    .map_err(|e| Error::Corruption(format!("stored key is not UTF-8: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        keys.sort();
        Ok(keys)
    }

    /// Whether a value is stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator fails.
    pub fn contains_key(&self, key: &str) -> Result<bool, Error> {
        if !self.admissible(key) {
            return Ok(false);
        }
        self.persistence.contains(key.as_bytes())
    }

    /// Remove the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns `RemoveError::NotFound` if nothing is stored under the key.
    pub fn remove(&self, key: &str) -> Result<(), RemoveError> {
        let removed = self.admissible(key) && {
            let _bulk = self.bulk.read();
            self.locks
                .with_lock(key.as_bytes(), || self.persistence.remove(key.as_bytes()))?
        };

        if !removed {
            return Err(RemoveError::NotFound {
                key: key.to_string(),
            });
        }
        info!(key, "Removed value");
        Ok(())
    }

    // ========== Defaults ==========

    /// Default value for `key`
    ///
    /// # Errors
    ///
    /// Returns `GetError::NotFound` if the key has no default.
    pub fn get_default(&self, key: &str) -> Result<Value, GetError> {
        self.defaults
            .get(key)
            .cloned()
            .ok_or_else(|| GetError::NotFound {
                key: key.to_string(),
            })
    }

    /// Stored value for `key`, else its default
    ///
    /// # Errors
    ///
    /// Returns `GetError::NotFound` if there is neither, and any other
    /// `get` failure unchanged.
    pub fn get_or_default(&self, key: &str) -> Result<Value, GetError> {
        match self.get(key) {
            Err(GetError::NotFound { .. }) => self.get_default(key),
            other => other,
        }
    }

    /// Whether `key` currently resolves to its default
    ///
    /// True when the key has a default and no stored value shadows it.
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator fails.
    pub fn is_default(&self, key: &str) -> Result<bool, Error> {
        if !self.defaults.contains_key(key) {
            return Ok(false);
        }
        Ok(!self.contains_key(key)?)
    }

    /// Drop the stored value so the default applies again
    ///
    /// Succeeds whether or not a value was stored.
    ///
    /// # Errors
    ///
    /// Returns `RemoveError::NotFound` if the key has no default.
    pub fn reset_key(&self, key: &str) -> Result<(), RemoveError> {
        if !self.defaults.contains_key(key) {
            return Err(RemoveError::NotFound {
                key: key.to_string(),
            });
        }

        let _bulk = self.bulk.read();
        let removed = self
            .locks
            .with_lock(key.as_bytes(), || self.persistence.remove(key.as_bytes()))?;
        info!(key, removed, "Reset key to default");
        Ok(())
    }

    /// Drop every stored value so each key resolves to its default again
    ///
    /// Returns how many stored values were dropped. Keys without a default
    /// are gone afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator fails; nothing is dropped then.
    pub fn reset_all_keys(&self) -> Result<usize, Error> {
        let _bulk = self.bulk.write();
        let removed = self.persistence.clear()?;
        info!(removed, "Reset all keys to defaults");
        Ok(removed)
    }

    // ========== Snapshots ==========

    /// Generations kept on disk, current file included
    ///
    /// Zero for stores without a file backend.
    pub fn snapshot_max_count(&self) -> usize {
        self.files.as_ref().map_or(0, |files| files.snapshot_max_count())
    }

    /// Generations currently on disk, current file included
    pub fn snapshot_count(&self) -> usize {
        self.files.as_ref().map_or(0, |files| files.snapshot_count())
    }

    /// Bring back generation `snapshot_id`
    ///
    /// Snapshot ids start at 1 (the most recent earlier state). The state
    /// being replaced becomes snapshot 1 in turn.
    ///
    /// # Errors
    ///
    /// - `SnapshotError::InvalidSnapshotId` if `snapshot_id` is 0 or not on
    ///   disk
    /// - `SnapshotError::Storage` if the snapshot fails its checksum or the
    ///   write fails
    pub fn snapshot_restore(&self, snapshot_id: usize) -> Result<(), SnapshotError> {
        let _bulk = self.bulk.write();
        let count = self.snapshot_count();
        let files = match &self.files {
            Some(files) if snapshot_id >= 1 && snapshot_id < count => files,
            _ => {
                debug!(snapshot_id, count, "Snapshot restore rejected");
                return Err(SnapshotError::InvalidSnapshotId {
                    id: snapshot_id,
                    count,
                });
            }
        };
        files.restore_snapshot(snapshot_id)?;
        Ok(())
    }

    /// Data file of generation `snapshot_id` (0 is current)
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::FileNotFound` if that generation has no file.
    pub fn kvs_filename(&self, snapshot_id: usize) -> Result<PathBuf, SnapshotError> {
        self.existing_file(snapshot_id, FileBackend::snapshot_kvs_path)
    }

    /// Checksum file of generation `snapshot_id` (0 is current)
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::FileNotFound` if that generation has no file.
    pub fn hash_filename(&self, snapshot_id: usize) -> Result<PathBuf, SnapshotError> {
        self.existing_file(snapshot_id, FileBackend::snapshot_hash_path)
    }

    fn existing_file(
        &self,
        snapshot_id: usize,
        path_of: fn(&FileBackend, usize) -> PathBuf,
    ) -> Result<PathBuf, SnapshotError> {
        self.files
            .as_deref()
            .map(|files| path_of(files, snapshot_id))
            .filter(|path| path.exists())
            .ok_or(SnapshotError::FileNotFound { snapshot_id })
    }
}
