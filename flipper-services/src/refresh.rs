//! Shared pieces of the refresh cycle

use crate::cache_store::CacheStore;
use flipper_hypixel::FetchError;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// What a refresh ended up publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// A new snapshot built from a successful fetch
    Fresh,
    /// The last durable cache record
    Cached,
    /// The in-memory snapshot was newer than anything on disk and was kept
    Kept,
    /// Nothing to fall back to; an empty snapshot was published
    Empty,
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RefreshOutcome::Fresh => "fresh",
            RefreshOutcome::Cached => "cached",
            RefreshOutcome::Kept => "kept",
            RefreshOutcome::Empty => "empty",
        };
        f.write_str(s)
    }
}

/// Keep the raw body of an unusable response for later inspection
pub(crate) fn dump_unusable_body(store: &CacheStore, label: &str, err: &FetchError) {
    let Some(body) = err.raw_body() else {
        return;
    };
    match store.write_debug_dump(label, body) {
        Ok(path) => debug!("[Cache] Raw {} payload saved to {}", label, path.display()),
        Err(e) => warn!("[Cache] Failed to save raw {} payload: {}", label, e),
    }
}
