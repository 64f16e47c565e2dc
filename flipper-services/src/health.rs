//! Health Monitor
//!
//! Samples snapshot ages and runtime counters on a fixed interval and emits
//! one status line per sample. Read-only with respect to every service.

use chrono::{DateTime, Utc};
use flipper_hypixel::{HypixelClient, KeyPool, Throttle, ThrottleStats};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::auctions::AuctionHouseService;
use crate::bazaar::BazaarService;
use crate::scheduler::PeriodicTask;

/// Age and size of one published snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotHealth {
    pub published: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    pub age_secs: Option<i64>,
    pub size: usize,
}

impl SnapshotHealth {
    fn missing() -> Self {
        Self {
            published: false,
            fetched_at: None,
            age_secs: None,
            size: 0,
        }
    }

    fn describe(&self) -> String {
        match self.age_secs {
            Some(age) => format!("{} entries ({}s old)", self.size, age),
            None => "not published".to_string(),
        }
    }
}

/// One health sample
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub worker_threads: usize,
    /// Tasks currently alive on the runtime
    pub alive_tasks: usize,
    pub has_api_keys: bool,
    pub api_key_count: usize,
    pub api_key_budget_per_minute: u32,
    pub keys_loaded_secs_ago: Option<u64>,
    pub bazaar: SnapshotHealth,
    pub auction_house: SnapshotHealth,
    pub throttle: ThrottleStats,
    /// Whether the API answered; only set on scheduled samples
    pub api_reachable: Option<bool>,
    /// True once a bazaar snapshot has been published
    pub healthy: bool,
}

/// Configuration for the health monitor
#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(15),
            interval: Duration::from_secs(60),
        }
    }
}

pub struct HealthMonitor {
    started_at: Instant,
    client: Arc<HypixelClient>,
    keys: Arc<KeyPool>,
    throttle: Arc<Throttle>,
    bazaar: Arc<BazaarService>,
    auctions: Arc<AuctionHouseService>,
    config: HealthConfig,
    task: Mutex<Option<PeriodicTask>>,
}

impl HealthMonitor {
    pub fn new(
        client: Arc<HypixelClient>,
        keys: Arc<KeyPool>,
        throttle: Arc<Throttle>,
        bazaar: Arc<BazaarService>,
        auctions: Arc<AuctionHouseService>,
        config: HealthConfig,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            client,
            keys,
            throttle,
            bazaar,
            auctions,
            config,
            task: Mutex::new(None),
        }
    }

    /// Take a sample without logging it
    pub fn sample(&self) -> HealthReport {
        let now = Utc::now();

        let bazaar = self
            .bazaar
            .current_snapshot()
            .map(|s| SnapshotHealth {
                published: true,
                fetched_at: Some(s.fetched_at),
                age_secs: Some(s.age_secs(now)),
                size: s.len(),
            })
            .unwrap_or_else(SnapshotHealth::missing);

        let auction_house = self
            .auctions
            .current_snapshot()
            .map(|s| SnapshotHealth {
                published: true,
                fetched_at: Some(s.fetched_at),
                age_secs: Some(s.age_secs(now)),
                size: s.len(),
            })
            .unwrap_or_else(SnapshotHealth::missing);

        let (worker_threads, alive_tasks) = tokio::runtime::Handle::try_current()
            .map(|handle| {
                let metrics = handle.metrics();
                (metrics.num_workers(), metrics.num_alive_tasks())
            })
            .unwrap_or((0, 0));

        HealthReport {
            timestamp: now,
            uptime_secs: self.started_at.elapsed().as_secs(),
            worker_threads,
            alive_tasks,
            has_api_keys: self.keys.has_keys(),
            api_key_count: self.keys.count(),
            api_key_budget_per_minute: self.keys.max_per_minute(),
            keys_loaded_secs_ago: self.keys.last_loaded_ago().map(|d| d.as_secs()),
            healthy: bazaar.published,
            bazaar,
            auction_house,
            throttle: self.throttle.stats(),
            api_reachable: None,
        }
    }

    /// Check the API, then sample and emit one status line
    pub async fn log_sample(&self) -> HealthReport {
        let api_reachable = self.client.is_healthy().await;
        let mut report = self.sample();
        report.api_reachable = Some(api_reachable);
        info!(
            "[Health] api={} uptime={}s workers={} tasks={} keys={} bazaar={} auctions={} requests={} (waited {}, in flight {})",
            if api_reachable { "up" } else { "down" },
            report.uptime_secs,
            report.worker_threads,
            report.alive_tasks,
            report.api_key_count,
            report.bazaar.describe(),
            report.auction_house.describe(),
            report.throttle.total_dispatches,
            report.throttle.waited_dispatches,
            report.throttle.in_flight,
        );
        report
    }

    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.is_some() {
            debug!("[Health] Monitor already running");
            return;
        }

        let monitor = Arc::downgrade(self);
        *task = Some(PeriodicTask::spawn(
            "health",
            self.config.initial_delay,
            self.config.interval,
            move || {
                let monitor = monitor.clone();
                async move {
                    if let Some(monitor) = monitor.upgrade() {
                        monitor.log_sample().await;
                    }
                }
            },
        ));
        info!(
            "[Health] Monitor started (first sample in {:?}, then every {:?})",
            self.config.initial_delay, self.config.interval
        );
    }

    pub async fn shutdown(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auctions::AuctionHouseConfig;
    use crate::cache_store::CacheStore;
    use flipper_hypixel::HypixelClient;

    fn monitor(dir: &std::path::Path) -> HealthMonitor {
        let keys = Arc::new(KeyPool::from_keys(vec!["k".to_string()], 110));
        let throttle = Arc::new(Throttle::new(2, Duration::ZERO));
        let client = Arc::new(
            HypixelClient::with_timeouts(
                "http://127.0.0.1:9",
                Duration::from_secs(1),
                Duration::from_secs(1),
                Arc::clone(&keys),
                Arc::clone(&throttle),
            )
            .unwrap(),
        );
        let store = Arc::new(CacheStore::new(dir));
        let bazaar = Arc::new(BazaarService::new(
            Arc::clone(&client),
            Arc::clone(&store),
            Duration::from_secs(10),
        ));
        let auctions = Arc::new(AuctionHouseService::new(
            Arc::clone(&client),
            store,
            AuctionHouseConfig::default(),
        ));
        HealthMonitor::new(client, keys, throttle, bazaar, auctions, HealthConfig::default())
    }

    #[tokio::test]
    async fn test_sample_before_first_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let report = monitor(dir.path()).sample();

        assert!(!report.healthy);
        assert!(report.has_api_keys);
        assert!(!report.bazaar.published);
        assert_eq!(report.auction_house.size, 0);
        assert_eq!(report.throttle.max_concurrent, 2);
        assert_eq!(report.api_key_budget_per_minute, 110);
        assert_eq!(report.keys_loaded_secs_ago, Some(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sample_counts_runtime_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let parked = tokio::spawn(async move {
            let _ = stop_rx.await;
        });

        let report = monitor(dir.path()).sample();
        assert_eq!(report.worker_threads, 2);
        assert!(report.alive_tasks >= 1);

        let _ = stop_tx.send(());
        parked.await.unwrap();
    }

    #[tokio::test]
    async fn test_scheduled_sample_records_unreachable_api() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor(dir.path());
        assert_eq!(monitor.sample().api_reachable, None);

        // Nothing listens on the discard port
        let report = monitor.log_sample().await;
        assert_eq!(report.api_reachable, Some(false));
        assert_eq!(report.throttle.total_dispatches, 1);
    }

    #[tokio::test]
    async fn test_report_serializes_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let json = serde_json::to_value(monitor(dir.path()).sample()).unwrap();
        assert!(json.get("auctionHouse").is_some());
        assert!(json["throttle"].get("totalDispatches").is_some());
    }
}
