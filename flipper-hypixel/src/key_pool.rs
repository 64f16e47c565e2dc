//! Rotating pool of Hypixel API keys
//!
//! Keys are handed out round-robin from an atomic cursor. The pool is loaded
//! from a small JSON credential file which is created empty on first run.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Default requests-per-minute budget written to a fresh credential file
pub const DEFAULT_MAX_PER_MINUTE: u32 = 110;

/// On-disk credential file layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialFile {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default = "default_max_per_minute")]
    pub max_per_minute: u32,
}

fn default_max_per_minute() -> u32 {
    DEFAULT_MAX_PER_MINUTE
}

impl Default for CredentialFile {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            max_per_minute: DEFAULT_MAX_PER_MINUTE,
        }
    }
}

#[derive(Debug)]
struct PoolState {
    keys: Vec<String>,
    max_per_minute: u32,
    loaded_at: Option<Instant>,
}

/// Round-robin API key rotation
#[derive(Debug)]
pub struct KeyPool {
    state: RwLock<PoolState>,
    cursor: AtomicUsize,
}

impl Default for KeyPool {
    fn default() -> Self {
        Self::from_keys(Vec::new(), DEFAULT_MAX_PER_MINUTE)
    }
}

impl KeyPool {
    /// Build a pool directly from a key list; blank entries are ignored
    pub fn from_keys(keys: Vec<String>, max_per_minute: u32) -> Self {
        Self {
            state: RwLock::new(PoolState {
                keys: sanitize(keys),
                max_per_minute,
                loaded_at: Some(Instant::now()),
            }),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Replace the pool contents from the credential file at `path`
    ///
    /// A missing file is created with an empty key list. An unreadable or
    /// malformed file is logged and leaves the pool empty. Returns the number
    /// of keys now in the pool.
    pub fn load(&self, path: &Path) -> usize {
        let credentials = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<CredentialFile>(&raw) {
                Ok(file) => file,
                Err(e) => {
                    error!("[KeyPool] Malformed credential file {}: {}", path.display(), e);
                    CredentialFile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                create_default(path);
                CredentialFile::default()
            }
            Err(e) => {
                error!("[KeyPool] Failed to read credential file {}: {}", path.display(), e);
                CredentialFile::default()
            }
        };

        let keys = sanitize(credentials.keys);
        let count = keys.len();
        {
            let mut state = self.state.write();
            state.keys = keys;
            state.max_per_minute = credentials.max_per_minute;
            state.loaded_at = Some(Instant::now());
        }
        self.cursor.store(0, Ordering::Relaxed);

        if count == 0 {
            warn!("[KeyPool] No API keys configured, requests will be unauthenticated");
        } else {
            info!(
                "[KeyPool] Loaded {} API key(s), budget {} req/min",
                count, credentials.max_per_minute
            );
        }
        count
    }

    /// Append a key unless it is blank or already present
    pub fn add_key(&self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return false;
        }
        let mut state = self.state.write();
        if state.keys.iter().any(|k| k == key) {
            return false;
        }
        state.keys.push(key.to_string());
        true
    }

    /// Next key in rotation, or `None` when the pool is empty
    pub fn next(&self) -> Option<String> {
        let state = self.state.read();
        if state.keys.is_empty() {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % state.keys.len();
        Some(state.keys[idx].clone())
    }

    pub fn count(&self) -> usize {
        self.state.read().keys.len()
    }

    pub fn has_keys(&self) -> bool {
        !self.state.read().keys.is_empty()
    }

    pub fn max_per_minute(&self) -> u32 {
        self.state.read().max_per_minute
    }

    /// Time since the pool contents were last replaced
    pub fn last_loaded_ago(&self) -> Option<Duration> {
        self.state.read().loaded_at.map(|t| t.elapsed())
    }
}

fn sanitize(keys: Vec<String>) -> Vec<String> {
    keys.into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

fn create_default(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            error!("[KeyPool] Failed to create {}: {}", parent.display(), e);
            return;
        }
    }
    let body = match serde_json::to_string_pretty(&CredentialFile::default()) {
        Ok(body) => body,
        Err(e) => {
            error!("[KeyPool] Failed to serialize default credentials: {}", e);
            return;
        }
    };
    match fs::write(path, body) {
        Ok(()) => info!("[KeyPool] Created empty credential file at {}", path.display()),
        Err(e) => error!("[KeyPool] Failed to create {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("key-{}", i)).collect()
    }

    #[test]
    fn test_rotation_visits_each_key_once_per_cycle() {
        for n in 1..=5 {
            let pool = KeyPool::from_keys(keys(n), DEFAULT_MAX_PER_MINUTE);
            let first: Vec<String> = (0..n).filter_map(|_| pool.next()).collect();
            let second: Vec<String> = (0..n).filter_map(|_| pool.next()).collect();

            assert_eq!(first, keys(n));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_empty_pool_returns_none() {
        let pool = KeyPool::default();
        assert!(!pool.has_keys());
        assert_eq!(pool.next(), None);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("api_keys.json");

        let pool = KeyPool::default();
        assert_eq!(pool.load(&path), 0);
        assert!(path.exists());

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["keys"], serde_json::json!([]));
        assert_eq!(written["maxPerMinute"], 110);
    }

    #[test]
    fn test_load_reads_keys_and_budget() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_keys.json");
        fs::write(&path, r#"{"keys": ["a", " ", "b"], "maxPerMinute": 60}"#).unwrap();

        let pool = KeyPool::default();
        assert_eq!(pool.load(&path), 2);
        assert_eq!(pool.max_per_minute(), 60);
        assert_eq!(pool.next().as_deref(), Some("a"));
        assert_eq!(pool.next().as_deref(), Some("b"));
        assert!(pool.last_loaded_ago().is_some());
    }

    #[test]
    fn test_malformed_file_leaves_pool_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_keys.json");
        fs::write(&path, "{not json").unwrap();

        let pool = KeyPool::from_keys(keys(2), 10);
        assert_eq!(pool.load(&path), 0);
        assert!(!pool.has_keys());
    }

    #[test]
    fn test_add_key_skips_duplicates() {
        let pool = KeyPool::from_keys(vec!["a".to_string()], 10);
        assert!(!pool.add_key("a"));
        assert!(!pool.add_key("  "));
        assert!(pool.add_key("b"));
        assert_eq!(pool.count(), 2);
    }
}
