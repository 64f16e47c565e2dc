//! Auction House Service
//!
//! Walks every page of the auctions endpoint and publishes the aggregate.
//! A failed page is skipped; only a failed first page aborts the refresh.

use chrono::Utc;
use flipper_core::{AuctionItem, AuctionSnapshot, Domain};
use flipper_hypixel::types::{is_success, parse_entries, RawAuction, AUCTIONS_PATH};
use flipper_hypixel::{FetchError, HypixelClient, KeyMode};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache_store::CacheStore;
use crate::refresh::{dump_unusable_body, RefreshOutcome};
use crate::scheduler::PeriodicTask;

/// Configuration for the auction house service
#[derive(Debug, Clone)]
pub struct AuctionHouseConfig {
    /// How often to rebuild the snapshot
    pub interval: Duration,
    /// Pause between consecutive page requests
    pub page_delay: Duration,
}

impl Default for AuctionHouseConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            page_delay: Duration::from_millis(250),
        }
    }
}

pub struct AuctionHouseService {
    client: Arc<HypixelClient>,
    store: Arc<CacheStore>,
    config: AuctionHouseConfig,
    snapshot_tx: watch::Sender<Option<Arc<AuctionSnapshot>>>,
    task: Mutex<Option<PeriodicTask>>,
}

impl AuctionHouseService {
    pub fn new(client: Arc<HypixelClient>, store: Arc<CacheStore>, config: AuctionHouseConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            client,
            store,
            config,
            snapshot_tx,
            task: Mutex::new(None),
        }
    }

    pub fn current_snapshot(&self) -> Option<Arc<AuctionSnapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    fn publish(&self, snapshot: Arc<AuctionSnapshot>) {
        self.snapshot_tx.send_replace(Some(snapshot));
    }

    async fn fetch_page(&self, page: u32) -> Result<Value, FetchError> {
        self.client
            .fetch(AUCTIONS_PATH, &[("page", page.to_string())], KeyMode::Query)
            .await
    }

    /// Fetch every page and publish the aggregate, falling back to the cache
    pub async fn refresh(&self) -> RefreshOutcome {
        let first = match self.fetch_page(0).await {
            Ok(first) if is_success(&first) => first,
            Ok(_) => {
                warn!("[AuctionHouse] First page reported failure, using cache");
                return self.fall_back();
            }
            Err(e) => {
                warn!("[AuctionHouse] First page fetch failed, using cache: {}", e);
                dump_unusable_body(&self.store, "auctions_page_0", &e);
                return self.fall_back();
            }
        };

        let total_pages = page_count(&first);

        let mut auctions = parse_page(&first);
        let mut failed_pages = 0u32;

        for page in 1..total_pages {
            if !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }
            match self.fetch_page(page).await {
                Ok(payload) if is_success(&payload) => auctions.extend(parse_page(&payload)),
                Ok(_) => {
                    failed_pages += 1;
                    warn!("[AuctionHouse] Page {} reported failure, skipping", page);
                }
                Err(e) => {
                    failed_pages += 1;
                    warn!("[AuctionHouse] Page {} failed, skipping: {}", page, e);
                    dump_unusable_body(&self.store, &format!("auctions_page_{}", page), &e);
                }
            }
        }

        let snapshot = Arc::new(AuctionSnapshot::new(Utc::now(), total_pages, auctions));
        self.publish(Arc::clone(&snapshot));

        if let Err(e) = self.store.write(Domain::AuctionHouse.cache_file(), snapshot.as_ref()) {
            warn!("[AuctionHouse] Failed to write cache record: {}", e);
        }

        info!(
            "[AuctionHouse] Snapshot fetched: {} auctions ({} pages, {} skipped)",
            snapshot.total_auctions, total_pages, failed_pages
        );
        RefreshOutcome::Fresh
    }

    fn fall_back(&self) -> RefreshOutcome {
        let current = self.current_snapshot();
        match self.store.read::<AuctionSnapshot>(Domain::AuctionHouse.cache_file()) {
            Some(cached)
                if current
                    .as_ref()
                    .map_or(true, |c| cached.fetched_at >= c.fetched_at) =>
            {
                debug!("[AuctionHouse] Serving cached snapshot from {}", cached.fetched_at);
                self.publish(Arc::new(cached));
                RefreshOutcome::Cached
            }
            _ if current.is_some() => RefreshOutcome::Kept,
            _ => {
                self.publish(Arc::new(AuctionSnapshot::empty()));
                RefreshOutcome::Empty
            }
        }
    }

    /// Register the recurring refresh; fires once immediately
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.is_some() {
            debug!("[AuctionHouse] Refresh schedule already running");
            return;
        }

        let service = Arc::downgrade(self);
        *task = Some(PeriodicTask::spawn(
            "auction_house",
            Duration::ZERO,
            self.config.interval,
            move || {
                let service = service.clone();
                async move {
                    if let Some(service) = service.upgrade() {
                        service.refresh().await;
                    }
                }
            },
        ));
        info!("[AuctionHouse] Refresh scheduled every {:?}", self.config.interval);
    }

    pub async fn shutdown(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.shutdown().await;
        }
    }
}

/// Upper bound on pages walked per refresh; the live house has well under 100
pub const MAX_AUCTION_PAGES: u32 = 500;

/// Declared page count, clamped to [`MAX_AUCTION_PAGES`]
pub fn page_count(first: &Value) -> u32 {
    let declared = first.get("totalPages").and_then(Value::as_u64).unwrap_or(0);
    if declared > u64::from(MAX_AUCTION_PAGES) {
        warn!(
            "[AuctionHouse] Payload declares {} pages, walking only {}",
            declared, MAX_AUCTION_PAGES
        );
        return MAX_AUCTION_PAGES;
    }
    declared as u32
}

/// Listings on one page; entries without an item name are dropped
pub fn parse_page(payload: &Value) -> Vec<AuctionItem> {
    parse_entries::<RawAuction>(payload.get("auctions"))
        .into_iter()
        .filter_map(RawAuction::into_auction_item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page_drops_nameless_entries() {
        let payload = json!({
            "success": true,
            "auctions": [
                { "uuid": "1", "item_name": "Livid Dagger", "tier": "LEGENDARY", "bin": true, "starting_bid": 5000000 },
                { "uuid": "2", "tier": "RARE" },
                { "uuid": "3", "item_name": "Enchanted Book", "category": "consumables", "highest_bid_amount": 1200 }
            ]
        });
        let items = parse_page(&payload);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].starting_bid, 5_000_000.0);
        assert_eq!(items[1].category, "consumables");
        assert_eq!(items[1].highest_bid, 1200.0);
    }

    #[test]
    fn test_parse_page_without_auctions_is_empty() {
        assert!(parse_page(&json!({ "success": true })).is_empty());
    }

    #[test]
    fn test_page_count_is_clamped() {
        assert_eq!(page_count(&json!({ "totalPages": 3 })), 3);
        assert_eq!(page_count(&json!({ "success": true })), 0);
        assert_eq!(page_count(&json!({ "totalPages": 4_000_000_000u64 })), MAX_AUCTION_PAGES);
        assert_eq!(page_count(&json!({ "totalPages": u64::MAX })), MAX_AUCTION_PAGES);
    }
}
