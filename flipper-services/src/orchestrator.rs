//! Startup Orchestrator
//!
//! Builds every service from one [`FlipperConfig`] and runs the one-time
//! initialization sequence. A second successful call is a no-op.

use flipper_core::{FlipperConfig, FlipperError, FlipperResult};
use flipper_hypixel::{HypixelClient, KeyPool, Throttle};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::auctions::{AuctionHouseConfig, AuctionHouseService};
use crate::bazaar::BazaarService;
use crate::cache_store::CacheStore;
use crate::health::{HealthConfig, HealthMonitor};
use crate::reference::{BitsShopStore, CalendarStore, EconomyStore, ItemStore, MayorService};

/// Everything assembled by a successful initialization
pub struct Services {
    pub client: Arc<HypixelClient>,
    pub bazaar: Arc<BazaarService>,
    pub auctions: Arc<AuctionHouseService>,
    pub items: Arc<ItemStore>,
    pub bits_shop: Arc<BitsShopStore>,
    pub calendar: Arc<CalendarStore>,
    pub mayor: Arc<MayorService>,
    pub economy: Arc<EconomyStore>,
    pub health: Arc<HealthMonitor>,
}

pub struct Orchestrator {
    config: FlipperConfig,
    store: Arc<CacheStore>,
    keys: Arc<KeyPool>,
    throttle: Arc<Throttle>,
    services: RwLock<Option<Arc<Services>>>,
    init_lock: tokio::sync::Mutex<()>,
}

impl Orchestrator {
    pub fn new(config: FlipperConfig) -> Self {
        let store = Arc::new(CacheStore::from_config(&config));
        let throttle = Arc::new(Throttle::new(
            config.max_concurrent_requests,
            config.request_cooldown,
        ));
        Self {
            config,
            store,
            keys: Arc::new(KeyPool::default()),
            throttle,
            services: RwLock::new(None),
            init_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &FlipperConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn keys(&self) -> &Arc<KeyPool> {
        &self.keys
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }

    /// Services from the last successful initialization
    pub fn services(&self) -> Option<Arc<Services>> {
        self.services.read().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.services.read().is_some()
    }

    /// Run the startup sequence once; later calls return the prior result
    ///
    /// Failures are logged and reported as `false`. Nothing is rolled back,
    /// and a later call retries the whole sequence.
    pub async fn initialize_all(&self) -> bool {
        let _guard = self.init_lock.lock().await;
        if self.is_initialized() {
            debug!("[Orchestrator] Already initialized");
            return true;
        }

        info!("[Orchestrator] Initializing services");
        match self.initialize().await {
            Ok(services) => {
                *self.services.write() = Some(Arc::new(services));
                info!("[Orchestrator] All services initialized");
                true
            }
            Err(e) => {
                error!("[Orchestrator] Initialization failed: {}", e);
                false
            }
        }
    }

    async fn initialize(&self) -> FlipperResult<Services> {
        self.store
            .ensure_structure()
            .map_err(|e| FlipperError::io(format!("Failed to create cache structure: {}", e)))?;

        self.keys.load(&self.config.credentials_path());
        if let Some(key) = self.config.api_key.as_deref() {
            if self.keys.add_key(key) {
                info!("[Orchestrator] Added API key from settings");
            }
        }

        let client = Arc::new(
            HypixelClient::new(&self.config, Arc::clone(&self.keys), Arc::clone(&self.throttle))
                .map_err(|e| FlipperError::config(e.to_string()))?,
        );
        let max_age = self.config.reference_max_age;

        let economy = Arc::new(EconomyStore::new(Arc::clone(&self.store)));
        economy.load();

        let items = Arc::new(ItemStore::new(Arc::clone(&client), Arc::clone(&self.store), max_age));
        items.load(false).await;

        let bits_shop = Arc::new(BitsShopStore::new(
            Arc::clone(&client),
            Arc::clone(&self.store),
            max_age,
        ));
        bits_shop.load(false).await;

        let mayor = Arc::new(MayorService::new(
            Arc::clone(&client),
            Arc::clone(&self.store),
            max_age,
            Arc::clone(&economy),
        ));
        mayor.load(false).await;

        let calendar = Arc::new(CalendarStore::new(
            Arc::clone(&client),
            Arc::clone(&self.store),
            max_age,
        ));
        calendar.load(false).await;

        let bazaar = Arc::new(BazaarService::new(
            Arc::clone(&client),
            Arc::clone(&self.store),
            self.config.bazaar_interval,
        ));
        let outcome = bazaar.refresh().await;
        debug!("[Orchestrator] Initial bazaar refresh: {}", outcome);
        bazaar.start();

        let auctions = Arc::new(AuctionHouseService::new(
            Arc::clone(&client),
            Arc::clone(&self.store),
            AuctionHouseConfig {
                interval: self.config.auction_interval,
                page_delay: self.config.auction_page_delay,
            },
        ));
        let outcome = auctions.refresh().await;
        debug!("[Orchestrator] Initial auction house refresh: {}", outcome);
        auctions.start();

        let health = Arc::new(HealthMonitor::new(
            Arc::clone(&client),
            Arc::clone(&self.keys),
            Arc::clone(&self.throttle),
            Arc::clone(&bazaar),
            Arc::clone(&auctions),
            HealthConfig {
                initial_delay: self.config.health_initial_delay,
                interval: self.config.health_interval,
            },
        ));
        health.start();

        Ok(Services {
            client,
            bazaar,
            auctions,
            items,
            bits_shop,
            calendar,
            mayor,
            economy,
            health,
        })
    }

    /// Stop every periodic task and wait for them to exit
    ///
    /// Closes the shared throttle first; an initialization still in progress
    /// fails its remaining requests immediately. No outbound call succeeds
    /// afterwards.
    pub async fn shutdown(&self) {
        self.throttle.close();
        let _guard = self.init_lock.lock().await;
        let services = self.services.write().take();
        let Some(services) = services else {
            return;
        };

        services.health.shutdown().await;
        services.auctions.shutdown().await;
        services.bazaar.shutdown().await;
        info!("[Orchestrator] All services stopped");
    }
}
