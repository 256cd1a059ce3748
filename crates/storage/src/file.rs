//! File-backed persistence
//!
//! Each store instance owns a family of files in its directory:
//!
//! - `kvs_<instance_id>_<n>.json`: generation `n` of the key map, each key
//!   mapped to its tagged value embedded verbatim. Generation `0` is the
//!   current file, `1..` are snapshots of earlier states, newest first.
//! - `kvs_<instance_id>_<n>.hash`: CRC32 of the matching JSON file, 4 bytes
//!   big-endian
//! - `kvs_<instance_id>_default.json`: default values, never written by the
//!   backend. A `kvs_<instance_id>_default.hash` beside it is verified when
//!   present.
//!
//! The full map is kept in memory. A mutation writes both temp files, shifts
//! the snapshots, then renames the data and checksum into place. If the
//! checksum rename fails after the data rename, the previous data file is
//! written back so the pair on disk still matches. A failed write leaves the
//! in-memory map unchanged.

use parking_lot::RwLock;
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tagkv_core::{Error, Persistence, Result};
use tracing::{debug, info, warn};

type Entries = BTreeMap<String, Box<RawValue>>;

/// Default number of generations kept on disk, current file included
pub const DEFAULT_SNAPSHOT_MAX_COUNT: usize = 3;

/// How an optional input file is treated at open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Never read the file, even if it exists
    Ignored,
    /// Read the file if it exists
    #[default]
    Optional,
    /// Fail to open if the file is missing
    Required,
}

impl LoadMode {
    /// Name used in config files
    pub fn as_str(self) -> &'static str {
        match self {
            LoadMode::Ignored => "ignored",
            LoadMode::Optional => "optional",
            LoadMode::Required => "required",
        }
    }

    /// Parse a config name
    pub fn from_name(name: &str) -> Option<LoadMode> {
        match name {
            "ignored" => Some(LoadMode::Ignored),
            "optional" => Some(LoadMode::Optional),
            "required" => Some(LoadMode::Required),
            _ => None,
        }
    }
}

/// Open-time settings of a [`FileBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOptions {
    /// Treatment of an existing data file
    pub kvs_load: LoadMode,
    /// Generations kept on disk, current file included (at least 1)
    pub snapshot_max_count: usize,
}

impl Default for FileOptions {
    fn default() -> Self {
        FileOptions {
            kvs_load: LoadMode::default(),
            snapshot_max_count: DEFAULT_SNAPSHOT_MAX_COUNT,
        }
    }
}

impl FileOptions {
    /// Set the treatment of an existing data file
    pub fn with_kvs_load(mut self, mode: LoadMode) -> Self {
        self.kvs_load = mode;
        self
    }

    /// Set the number of generations kept
    pub fn with_snapshot_max_count(mut self, count: usize) -> Self {
        self.snapshot_max_count = count;
        self
    }
}

#[derive(Debug)]
struct State {
    entries: Entries,
    /// Bytes of the current data file as last written or found at open
    committed: Option<Vec<u8>>,
}

/// Directory-backed persistence for one store instance
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
    instance_id: u64,
    snapshot_max_count: usize,
    state: RwLock<State>,
}

impl FileBackend {
    /// Open (or create) the files for `instance_id` inside `dir`
    ///
    /// # Errors
    ///
    /// Returns `Error::Corruption` if the stored checksum does not match the
    /// data file, or if the data file exists without its checksum.
    pub fn open(dir: &Path, instance_id: u64) -> Result<Self> {
        Self::open_with_options(dir, instance_id, &FileOptions::default())
    }

    /// Open with explicit load and snapshot settings
    ///
    /// # Errors
    ///
    /// As [`FileBackend::open`], plus `Error::IoError` (`NotFound`) when the
    /// data file is missing under `LoadMode::Required`, and
    /// `Error::StorageError` when `snapshot_max_count` is zero.
    pub fn open_with_options(dir: &Path, instance_id: u64, options: &FileOptions) -> Result<Self> {
        if options.snapshot_max_count == 0 {
            return Err(Error::StorageError(
                "snapshot_max_count must be at least 1".to_string(),
            ));
        }
        fs::create_dir_all(dir)?;
        let kvs_path = Self::kvs_filename(dir, instance_id);
        let hash_path = Self::hash_filename(dir, instance_id);

        let committed = read_if_exists(&kvs_path)?;
        let entries = match (&committed, options.kvs_load) {
            (_, LoadMode::Ignored) | (None, LoadMode::Optional) => Entries::new(),
            (Some(data), _) => parse_verified(data, &kvs_path, &hash_path)?,
            (None, LoadMode::Required) => {
                return Err(Error::IoError(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("required kvs file '{}' does not exist", kvs_path.display()),
                )))
            }
        };

        info!(
            path = %kvs_path.display(),
            instance_id,
            entries = entries.len(),
            kvs_load = options.kvs_load.as_str(),
            snapshot_max_count = options.snapshot_max_count,
            "Opened file backend"
        );

        Ok(FileBackend {
            dir: dir.to_path_buf(),
            instance_id,
            snapshot_max_count: options.snapshot_max_count,
            state: RwLock::new(State { entries, committed }),
        })
    }

    /// Current data file path for an instance
    pub fn kvs_filename(dir: &Path, instance_id: u64) -> PathBuf {
        Self::snapshot_kvs_filename(dir, instance_id, 0)
    }

    /// Current checksum file path for an instance
    pub fn hash_filename(dir: &Path, instance_id: u64) -> PathBuf {
        Self::snapshot_hash_filename(dir, instance_id, 0)
    }

    /// Data file path of generation `snapshot_id` (0 is current)
    pub fn snapshot_kvs_filename(dir: &Path, instance_id: u64, snapshot_id: usize) -> PathBuf {
        dir.join(format!("kvs_{}_{}.json", instance_id, snapshot_id))
    }

    /// Checksum file path of generation `snapshot_id` (0 is current)
    pub fn snapshot_hash_filename(dir: &Path, instance_id: u64, snapshot_id: usize) -> PathBuf {
        dir.join(format!("kvs_{}_{}.hash", instance_id, snapshot_id))
    }

    /// Defaults file path for an instance
    pub fn defaults_filename(dir: &Path, instance_id: u64) -> PathBuf {
        dir.join(format!("kvs_{}_default.json", instance_id))
    }

    /// Defaults checksum file path for an instance
    pub fn defaults_hash_filename(dir: &Path, instance_id: u64) -> PathBuf {
        dir.join(format!("kvs_{}_default.hash", instance_id))
    }

    /// Read the defaults file of an instance
    ///
    /// Returns `None` if there is no defaults file. Values are returned as
    /// their stored bytes, undecoded.
    ///
    /// # Errors
    ///
    /// Returns `Error::Corruption` if a checksum file is present and does
    /// not match, and `Error::SerializationError` if the file is not a JSON
    /// object.
    pub fn read_defaults(
        dir: &Path,
        instance_id: u64,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>> {
        let path = Self::defaults_filename(dir, instance_id);
        let Some(data) = read_if_exists(&path)? else {
            return Ok(None);
        };
        let hash_path = Self::defaults_hash_filename(dir, instance_id);
        if hash_path.exists() {
            verify_checksum(&data, &path, &hash_path)?;
        }

        let entries: Entries = serde_json::from_slice(&data)?;
        debug!(path = %path.display(), entries = entries.len(), "Read defaults file");
        Ok(Some(
            entries
                .into_iter()
                .map(|(key, raw)| (key, raw.get().as_bytes().to_vec()))
                .collect(),
        ))
    }

    /// Current data file path of this backend
    pub fn kvs_path(&self) -> PathBuf {
        Self::kvs_filename(&self.dir, self.instance_id)
    }

    /// Current checksum file path of this backend
    pub fn hash_path(&self) -> PathBuf {
        Self::hash_filename(&self.dir, self.instance_id)
    }

    /// Data file path of one of this backend's generations
    pub fn snapshot_kvs_path(&self, snapshot_id: usize) -> PathBuf {
        Self::snapshot_kvs_filename(&self.dir, self.instance_id, snapshot_id)
    }

    /// Checksum file path of one of this backend's generations
    pub fn snapshot_hash_path(&self, snapshot_id: usize) -> PathBuf {
        Self::snapshot_hash_filename(&self.dir, self.instance_id, snapshot_id)
    }

    /// Generations kept on disk, current file included
    pub fn snapshot_max_count(&self) -> usize {
        self.snapshot_max_count
    }

    /// Generations present on disk, current file included
    pub fn snapshot_count(&self) -> usize {
        (0..self.snapshot_max_count)
            .take_while(|&id| self.snapshot_kvs_path(id).exists())
            .count()
    }

    /// Make generation `snapshot_id` the current state
    ///
    /// The restore is itself a mutation: the state being replaced becomes
    /// snapshot 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the generation cannot be read or fails its
    /// checksum, or if the write fails. The current state is then unchanged.
    pub fn restore_snapshot(&self, snapshot_id: usize) -> Result<()> {
        let kvs_path = self.snapshot_kvs_path(snapshot_id);
        let data = fs::read(&kvs_path)?;
        let restored = parse_verified(&data, &kvs_path, &self.snapshot_hash_path(snapshot_id))?;

        let mut state = self.state.write();
        let previous = std::mem::replace(&mut state.entries, restored);
        if let Err(e) = self.flush(&mut state) {
            state.entries = previous;
            return Err(e);
        }
        info!(snapshot_id, entries = state.entries.len(), "Restored snapshot");
        Ok(())
    }

    fn flush(&self, state: &mut State) -> Result<()> {
        let data = serde_json::to_vec(&state.entries)?;
        self.write_files(&mut state.committed, data)
    }

    fn write_files(&self, committed: &mut Option<Vec<u8>>, data: Vec<u8>) -> Result<()> {
        let kvs_path = self.kvs_path();
        let hash_path = self.hash_path();
        let hash = crc32fast::hash(&data).to_be_bytes();

        let kvs_tmp = write_temp(&kvs_path, &data)?;
        let hash_tmp = match write_temp(&hash_path, &hash) {
            Ok(tmp) => tmp,
            Err(e) => {
                discard(&kvs_tmp);
                return Err(e);
            }
        };

        let staged = self
            .rotate_snapshots(committed.as_deref())
            .and_then(|()| fs::rename(&kvs_tmp, &kvs_path).map_err(Error::from));
        if let Err(e) = staged {
            discard(&kvs_tmp);
            discard(&hash_tmp);
            return Err(e);
        }

        if let Err(e) = fs::rename(&hash_tmp, &hash_path) {
            discard(&hash_tmp);
            self.restore_committed(committed.as_deref());
            return Err(e.into());
        }

        debug!(path = %kvs_path.display(), bytes = data.len(), "Wrote kvs file");
        *committed = Some(data);
        Ok(())
    }

    /// Shift generations `1..` up by one and save `previous` as snapshot 1
    fn rotate_snapshots(&self, previous: Option<&[u8]>) -> Result<()> {
        let Some(previous) = previous else {
            return Ok(());
        };
        if self.snapshot_max_count < 2 {
            return Ok(());
        }

        // Oldest first, so nothing is overwritten before it has moved
        for id in (1..self.snapshot_max_count - 1).rev() {
            let kvs_from = self.snapshot_kvs_path(id);
            if kvs_from.exists() {
                fs::rename(&kvs_from, self.snapshot_kvs_path(id + 1))?;
            }
            let hash_from = self.snapshot_hash_path(id);
            if hash_from.exists() {
                fs::rename(&hash_from, self.snapshot_hash_path(id + 1))?;
            }
        }

        write_atomic(&self.snapshot_kvs_path(1), previous)?;
        write_atomic(
            &self.snapshot_hash_path(1),
            &crc32fast::hash(previous).to_be_bytes(),
        )?;
        Ok(())
    }

    /// Put the last committed data file back after a failed checksum rename
    fn restore_committed(&self, committed: Option<&[u8]>) {
        let kvs_path = self.kvs_path();
        let result = match committed {
            Some(previous) => write_atomic(&kvs_path, previous),
            None => fs::remove_file(&kvs_path).map_err(Error::from),
        };
        if let Err(e) = result {
            warn!(path = %kvs_path.display(), error = %e, "Could not restore previous kvs file");
        }
    }
}

fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn verify_checksum(data: &[u8], kvs_path: &Path, hash_path: &Path) -> Result<()> {
    let stored = match fs::read(hash_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::Corruption(format!(
                "checksum file '{}' is missing",
                hash_path.display()
            )))
        }
        Err(e) => return Err(e.into()),
    };
    let stored: [u8; 4] = stored.as_slice().try_into().map_err(|_| {
        Error::Corruption(format!(
            "checksum file '{}' has {} bytes, expected 4",
            hash_path.display(),
            stored.len()
        ))
    })?;

    let expected = u32::from_be_bytes(stored);
    let actual = crc32fast::hash(data);
    if expected != actual {
        return Err(Error::Corruption(format!(
            "checksum mismatch for '{}': stored {:08x}, computed {:08x}",
            kvs_path.display(),
            expected,
            actual
        )));
    }
    Ok(())
}

fn parse_verified(data: &[u8], kvs_path: &Path, hash_path: &Path) -> Result<Entries> {
    verify_checksum(data, kvs_path, hash_path)?;
    Ok(serde_json::from_slice(data)?)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    PathBuf::from(tmp_path)
}

/// Write and fsync `<path>.tmp`, returning its path
fn write_temp(path: &Path, data: &[u8]) -> Result<PathBuf> {
    let tmp_path = temp_path(path);
    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(data)?;
        file.sync_all()
    });
    if let Err(e) = written {
        discard(&tmp_path);
        return Err(e.into());
    }
    Ok(tmp_path)
}

/// Write a file atomically (temp + fsync + rename)
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = write_temp(path, data)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        discard(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

fn discard(tmp_path: &Path) {
    if let Err(e) = fs::remove_file(tmp_path) {
        if e.kind() != io::ErrorKind::NotFound {
            debug!(path = %tmp_path.display(), error = %e, "Could not remove temp file");
        }
    }
}

fn key_str(key: &[u8]) -> Result<&str> {
    std::str::from_utf8(key)
        .map_err(|e| Error::SerializationError(format!("key is not UTF-8: {}", e)))
}

impl Persistence for FileBackend {
    fn persist(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let key = key_str(key)?.to_string();
        let text = String::from_utf8(value.to_vec())
            .map_err(|e| Error::SerializationError(format!("value is not UTF-8: {}", e)))?;
        let raw = RawValue::from_string(text)?;

        let mut state = self.state.write();
        let previous = state.entries.insert(key.clone(), raw);
        if let Err(e) = self.flush(&mut state) {
            match previous {
                Some(old) => state.entries.insert(key, old),
                None => state.entries.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn retrieve(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let key = key_str(key)?;
        Ok(self
            .state
            .read()
            .entries
            .get(key)
            .map(|raw| raw.get().as_bytes().to_vec()))
    }

    fn remove(&self, key: &[u8]) -> Result<bool> {
        let key = key_str(key)?;
        let mut state = self.state.write();
        let Some(old) = state.entries.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.flush(&mut state) {
            state.entries.insert(key.to_string(), old);
            return Err(e);
        }
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .state
            .read()
            .entries
            .keys()
            .map(|k| k.as_bytes().to_vec())
            .collect())
    }

    fn contains(&self, key: &[u8]) -> Result<bool> {
        let key = key_str(key)?;
        Ok(self.state.read().entries.contains_key(key))
    }

    fn clear(&self) -> Result<usize> {
        let mut state = self.state.write();
        if state.entries.is_empty() {
            return Ok(0);
        }
        let cleared = std::mem::take(&mut state.entries);
        if let Err(e) = self.flush(&mut state) {
            state.entries = cleared;
            return Err(e);
        }
        Ok(cleared.len())
    }
}
