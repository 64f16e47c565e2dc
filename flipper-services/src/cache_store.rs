//! Durable JSON cache on the local filesystem
//!
//! One file per domain under `cache/`, an append-only history log for the
//! bazaar, and timestamped raw dumps under `cache/debug/` for payloads that
//! failed to parse. Knows nothing about the domains themselves.

use chrono::Utc;
use flipper_core::FlipperConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Errors from cache store operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
    debug_dir: PathBuf,
    log_dir: PathBuf,
}

impl CacheStore {
    /// Store rooted at `data_dir` (`cache/`, `cache/debug/`, `logs/`)
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        let cache_dir = data_dir.join("cache");
        Self {
            debug_dir: cache_dir.join("debug"),
            cache_dir,
            log_dir: data_dir.join("logs"),
        }
    }

    pub fn from_config(config: &FlipperConfig) -> Self {
        Self {
            cache_dir: config.cache_dir(),
            debug_dir: config.cache_dir().join("debug"),
            log_dir: config.log_dir(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn debug_dir(&self) -> &Path {
        &self.debug_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    /// Create the cache, debug and log directories if missing
    pub fn ensure_structure(&self) -> Result<(), CacheError> {
        for dir in [&self.cache_dir, &self.debug_dir, &self.log_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Parsed JSON object stored under `name`
    ///
    /// Missing, unreadable and corrupt files all read as `None`; the latter
    /// two are logged.
    pub fn read_object(&self, name: &str) -> Option<Value> {
        let path = self.path(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("[Cache] No cache record at {}", path.display());
                return None;
            }
            Err(e) => {
                warn!("[Cache] Failed to read {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) if value.is_object() => Some(value),
            Ok(_) => {
                warn!("[Cache] {} does not hold a JSON object, ignoring", path.display());
                None
            }
            Err(e) => {
                warn!("[Cache] Corrupt cache record {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Overwrite `name` atomically: write a sibling temp file, fsync, rename
    pub fn write_object(&self, name: &str, value: &Value) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir)?;
        let path = self.path(name);
        let tmp_path = self.path(&format!("{}.tmp", name));

        let body = serde_json::to_vec_pretty(value)?;
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Append one JSON line to the history log `name`
    pub fn append_history(&self, name: &str, value: &Value) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir)?;
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(name))?;
        file.write_all(&line)?;
        Ok(())
    }

    /// Persist a raw payload as `debug/{epoch_ms}_{label}.txt`
    pub fn write_debug_dump(&self, label: &str, content: &str) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.debug_dir)?;
        let label: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let path = self
            .debug_dir
            .join(format!("{}_{}.txt", Utc::now().timestamp_millis(), label));
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Typed read; a record that no longer matches `T` is logged and ignored
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.read_object(name)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("[Cache] Unexpected shape in {}: {}", name, e);
                None
            }
        }
    }

    pub fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), CacheError> {
        let value = serde_json::to_value(value)?;
        self.write_object(name, &value)
    }
}
