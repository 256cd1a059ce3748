//! Store configuration via `tagkv.toml`
//!
//! On first open, a default `tagkv.toml` is created in the data directory.
//! To change settings, edit the file and reopen the store. An existing file
//! is never overwritten.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tagkv_core::{Limits, DEFAULT_MAX_KEY_BYTES, DEFAULT_MAX_VALUE_BYTES};
use tagkv_storage::{FileOptions, LoadMode, DEFAULT_SNAPSHOT_MAX_COUNT};
use thiserror::Error;

/// Config file name placed in the store data directory.
pub const CONFIG_FILE_NAME: &str = "tagkv.toml";

/// What `put` does when the key already holds a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UniquenessPolicy {
    /// Fail with `PutError::DuplicateKey`; the stored value is untouched
    #[default]
    Reject,
    /// Replace the stored value
    Overwrite,
}

impl UniquenessPolicy {
    /// Name used in `tagkv.toml`
    pub fn as_str(self) -> &'static str {
        match self {
            UniquenessPolicy::Reject => "reject",
            UniquenessPolicy::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for UniquenessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UniquenessPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(UniquenessPolicy::Reject),
            "overwrite" => Ok(UniquenessPolicy::Overwrite),
            other => Err(ConfigError::Invalid {
                field: "uniqueness",
                reason: format!("'{}', expected \"reject\" or \"overwrite\"", other),
            }),
        }
    }
}

fn parse_load_mode(field: &'static str, value: &str) -> Result<LoadMode, ConfigError> {
    LoadMode::from_name(value).ok_or_else(|| ConfigError::Invalid {
        field,
        reason: format!(
            "'{}', expected \"ignored\", \"optional\" or \"required\"",
            value
        ),
    })
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The config file could not be written
    #[error("Failed to write config file '{}': {source}", .path.display())]
    Write {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The config file is not valid TOML for `StoreConfig`
    #[error("Failed to parse config file '{}': {message}", .path.display())]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A setting parsed but has an unusable value
    #[error("Invalid {field} in tagkv.toml: {reason}")]
    Invalid {
        /// Offending setting
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

/// Store configuration loaded from `tagkv.toml`.
///
/// # Example
///
/// ```toml
/// # "reject" (default) or "overwrite"
/// uniqueness = "reject"
/// instance_id = 0
/// max_key_bytes = 32
/// max_value_bytes = 1024
/// snapshot_max_count = 3
/// defaults = "optional"
/// kvs_load = "optional"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Uniqueness policy: `"reject"` or `"overwrite"`.
    #[serde(default = "default_uniqueness_str")]
    pub uniqueness: String,
    /// Selects the backing files `kvs_<instance_id>_<n>.json` / `.hash`.
    #[serde(default)]
    pub instance_id: u64,
    /// Maximum key length in bytes.
    #[serde(default = "default_max_key_bytes")]
    pub max_key_bytes: usize,
    /// Maximum value length in bytes.
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,
    /// Generations kept on disk, current file included.
    #[serde(default = "default_snapshot_max_count")]
    pub snapshot_max_count: usize,
    /// Defaults file: `"ignored"`, `"optional"` or `"required"`.
    #[serde(default = "default_load_mode_str")]
    pub defaults: String,
    /// Existing data file: `"ignored"`, `"optional"` or `"required"`.
    #[serde(default = "default_load_mode_str")]
    pub kvs_load: String,
}

fn default_uniqueness_str() -> String {
    UniquenessPolicy::default().as_str().to_string()
}

fn default_max_key_bytes() -> usize {
    DEFAULT_MAX_KEY_BYTES
}

fn default_max_value_bytes() -> usize {
    DEFAULT_MAX_VALUE_BYTES
}

fn default_snapshot_max_count() -> usize {
    DEFAULT_SNAPSHOT_MAX_COUNT
}

fn default_load_mode_str() -> String {
    LoadMode::default().as_str().to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uniqueness: default_uniqueness_str(),
            instance_id: 0,
            max_key_bytes: default_max_key_bytes(),
            max_value_bytes: default_max_value_bytes(),
            snapshot_max_count: default_snapshot_max_count(),
            defaults: default_load_mode_str(),
            kvs_load: default_load_mode_str(),
        }
    }
}

impl StoreConfig {
    /// Set the uniqueness policy
    pub fn with_uniqueness(mut self, policy: UniquenessPolicy) -> Self {
        self.uniqueness = policy.as_str().to_string();
        self
    }

    /// Set the instance id
    pub fn with_instance_id(mut self, instance_id: u64) -> Self {
        self.instance_id = instance_id;
        self
    }

    /// Set the key and value bounds
    pub fn with_limits(mut self, limits: &Limits) -> Self {
        self.max_key_bytes = limits.max_key_bytes;
        self.max_value_bytes = limits.max_value_bytes;
        self
    }

    /// Set the number of generations kept on disk
    pub fn with_snapshot_max_count(mut self, count: usize) -> Self {
        self.snapshot_max_count = count;
        self
    }

    /// Set how the defaults file is treated
    pub fn with_defaults_mode(mut self, mode: LoadMode) -> Self {
        self.defaults = mode.as_str().to_string();
        self
    }

    /// Set how an existing data file is treated
    pub fn with_kvs_load(mut self, mode: LoadMode) -> Self {
        self.kvs_load = mode.as_str().to_string();
        self
    }

    /// Parse the uniqueness string into a `UniquenessPolicy`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"reject"` or `"overwrite"`.
    pub fn uniqueness_policy(&self) -> Result<UniquenessPolicy, ConfigError> {
        self.uniqueness.parse()
    }

    /// Parse the `defaults` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a load mode name.
    pub fn defaults_mode(&self) -> Result<LoadMode, ConfigError> {
        parse_load_mode("defaults", &self.defaults)
    }

    /// Parse the `kvs_load` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a load mode name.
    pub fn kvs_load_mode(&self) -> Result<LoadMode, ConfigError> {
        parse_load_mode("kvs_load", &self.kvs_load)
    }

    /// Open-time settings for the file backend
    ///
    /// # Errors
    ///
    /// Returns an error if `kvs_load` is not a load mode name.
    pub fn file_options(&self) -> Result<FileOptions, ConfigError> {
        Ok(FileOptions::default()
            .with_kvs_load(self.kvs_load_mode()?)
            .with_snapshot_max_count(self.snapshot_max_count))
    }

    /// Key and value bounds as `Limits`
    pub fn limits(&self) -> Limits {
        Limits {
            max_key_bytes: self.max_key_bytes,
            max_value_bytes: self.max_value_bytes,
        }
    }

    /// Check every setting.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first unusable setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.uniqueness_policy()?;
        if self.max_key_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_key_bytes",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_value_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_value_bytes",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.snapshot_max_count == 0 {
            return Err(ConfigError::Invalid {
                field: "snapshot_max_count",
                reason: "must be at least 1 (the current file)".to_string(),
            });
        }
        self.defaults_mode()?;
        self.kvs_load_mode()?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# tagkv store configuration
#
# Uniqueness policy for put on an existing key: "reject" (default) or "overwrite"
#   "reject"    = put fails with DuplicateKey, stored value is kept
#   "overwrite" = put replaces the stored value
uniqueness = "reject"

# Instance id: selects kvs_<instance_id>_<n>.json and kvs_<instance_id>_<n>.hash,
# so several stores can share one directory (default: 0)
instance_id = 0

# Maximum key length in bytes (default: 32)
max_key_bytes = 32

# Maximum value length in bytes (default: 1024)
# Strings are measured by their UTF-8 bytes, everything else by the
# compact JSON of its payload.
max_value_bytes = 1024

# Generations of the data file kept on disk, the current one included
# (default: 3). Every write shifts the older generations up by one.
snapshot_max_count = 3

# Defaults file kvs_<instance_id>_default.json (default: "optional")
#   "ignored"  = never read
#   "optional" = read if present
#   "required" = opening fails without it
defaults = "optional"

# Existing data file, same choices as defaults (default: "optional")
kvs_load = "optional"
"#
    }

    /// Parse config from TOML text and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or a value is unusable.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a
    /// setting is invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
