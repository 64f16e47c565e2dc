//! Bazaar Service
//!
//! Polls the single-page bazaar endpoint, publishes an immutable snapshot
//! and keeps the durable cache record and history log up to date.

use chrono::Utc;
use flipper_core::{BazaarSnapshot, Domain, Product};
use flipper_hypixel::types::{is_success, BazaarEntry, BAZAAR_PATH};
use flipper_hypixel::{HypixelClient, KeyMode};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache_store::CacheStore;
use crate::refresh::{dump_unusable_body, RefreshOutcome};
use crate::scheduler::PeriodicTask;

pub struct BazaarService {
    client: Arc<HypixelClient>,
    store: Arc<CacheStore>,
    interval: Duration,
    snapshot_tx: watch::Sender<Option<Arc<BazaarSnapshot>>>,
    task: Mutex<Option<PeriodicTask>>,
}

impl BazaarService {
    pub fn new(client: Arc<HypixelClient>, store: Arc<CacheStore>, interval: Duration) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            client,
            store,
            interval,
            snapshot_tx,
            task: Mutex::new(None),
        }
    }

    /// The most recently published snapshot; `None` only before the first refresh
    pub fn current_snapshot(&self) -> Option<Arc<BazaarSnapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn product(&self, product_id: &str) -> Option<Product> {
        self.current_snapshot()?.get(product_id).cloned()
    }

    fn publish(&self, snapshot: Arc<BazaarSnapshot>) {
        self.snapshot_tx.send_replace(Some(snapshot));
    }

    /// Fetch, parse and publish one snapshot, falling back to the cache
    pub async fn refresh(&self) -> RefreshOutcome {
        let payload = match self.client.fetch(BAZAAR_PATH, &[], KeyMode::Header).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("[Bazaar] Fetch failed, using cache: {}", e);
                dump_unusable_body(&self.store, "bazaar", &e);
                return self.fall_back();
            }
        };

        let Some(products) = parse_products(&payload) else {
            warn!("[Bazaar] Payload missing success flag or products, using cache");
            return self.fall_back();
        };

        let snapshot = Arc::new(BazaarSnapshot::new(Utc::now(), products));
        self.publish(Arc::clone(&snapshot));
        self.persist(&snapshot);

        info!("[Bazaar] Snapshot fetched ({} products)", snapshot.len());
        RefreshOutcome::Fresh
    }

    fn persist(&self, snapshot: &BazaarSnapshot) {
        let value = match serde_json::to_value(snapshot) {
            Ok(value) => value,
            Err(e) => {
                warn!("[Bazaar] Failed to serialize snapshot: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.write_object(Domain::Bazaar.cache_file(), &value) {
            warn!("[Bazaar] Failed to write cache record: {}", e);
        }
        if let Some(history) = Domain::Bazaar.history_file() {
            if let Err(e) = self.store.append_history(history, &value) {
                warn!("[Bazaar] Failed to append history: {}", e);
            }
        }
    }

    fn fall_back(&self) -> RefreshOutcome {
        let current = self.current_snapshot();
        match self.store.read::<BazaarSnapshot>(Domain::Bazaar.cache_file()) {
            Some(cached)
                if current
                    .as_ref()
                    .map_or(true, |c| cached.fetched_at >= c.fetched_at) =>
            {
                debug!("[Bazaar] Serving cached snapshot from {}", cached.fetched_at);
                self.publish(Arc::new(cached));
                RefreshOutcome::Cached
            }
            _ if current.is_some() => RefreshOutcome::Kept,
            _ => {
                self.publish(Arc::new(BazaarSnapshot::empty()));
                RefreshOutcome::Empty
            }
        }
    }

    /// Register the recurring refresh; fires once immediately
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.is_some() {
            debug!("[Bazaar] Refresh schedule already running");
            return;
        }

        let service = Arc::downgrade(self);
        *task = Some(PeriodicTask::spawn(
            "bazaar",
            Duration::ZERO,
            self.interval,
            move || {
                let service = service.clone();
                async move {
                    if let Some(service) = service.upgrade() {
                        service.refresh().await;
                    }
                }
            },
        ));
        info!("[Bazaar] Refresh scheduled every {:?}", self.interval);
    }

    /// Stop the schedule and wait for an in-flight refresh to finish
    pub async fn shutdown(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.shutdown().await;
        }
    }
}

/// Products from a successful payload, or `None` if the envelope is unusable
///
/// Entries without a `quick_status` object are skipped.
pub fn parse_products(payload: &Value) -> Option<BTreeMap<String, Product>> {
    if !is_success(payload) {
        return None;
    }
    let entries = payload.get("products")?.as_object()?;

    let mut products = BTreeMap::new();
    let mut skipped = 0usize;
    for (id, entry) in entries {
        match BazaarEntry::deserialize(entry).ok().and_then(|e| e.quick_status) {
            Some(status) => {
                products.insert(id.clone(), status.into_product(id));
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("[Bazaar] Skipped {} entries without quick_status", skipped);
    }
    Some(products)
}
