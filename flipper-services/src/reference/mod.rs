//! Slow-moving reference datasets
//!
//! Each dataset is loaded on demand: memory first, then a cache record
//! younger than the max age, then the network. A failed fetch falls back to
//! the cache record whatever its age.

pub mod bits_shop;
pub mod calendar;
pub mod economy;
pub mod items;
pub mod mayor;

use chrono::{DateTime, Utc};
use flipper_core::{Domain, ReferenceRecord};
use flipper_hypixel::{HypixelClient, KeyMode};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache_store::CacheStore;
use crate::refresh::dump_unusable_body;

pub use bits_shop::{BitsShopDomain, BitsShopStore};
pub use calendar::{CalendarDomain, CalendarStore};
pub use economy::EconomyStore;
pub use items::{ItemStore, ItemsDomain};
pub use mayor::{MayorDomain, MayorService};

/// A dataset served from one public resources endpoint
pub trait ReferenceDomain: Send + Sync + 'static {
    type Data: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    const DOMAIN: Domain;
    const PATH: &'static str;

    /// Build the dataset from a raw payload; `None` if the payload is unusable
    fn parse(payload: &Value, now: DateTime<Utc>) -> Option<Self::Data>;

    /// Entry count for log lines
    fn size(data: &Self::Data) -> usize;
}

/// Where a load got its record from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Memory,
    Cache,
    Remote,
    /// Cache record past its max age, used because the fetch failed
    StaleCache,
}

pub type Record<D> = Arc<ReferenceRecord<<D as ReferenceDomain>::Data>>;

pub struct ReferenceStore<D: ReferenceDomain> {
    client: Arc<HypixelClient>,
    store: Arc<CacheStore>,
    max_age: chrono::Duration,
    current: RwLock<Option<Record<D>>>,
    load_lock: tokio::sync::Mutex<()>,
    _domain: PhantomData<D>,
}

impl<D: ReferenceDomain> ReferenceStore<D> {
    pub fn new(client: Arc<HypixelClient>, store: Arc<CacheStore>, max_age: Duration) -> Self {
        Self {
            client,
            store,
            max_age: chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::hours(24)),
            current: RwLock::new(None),
            load_lock: tokio::sync::Mutex::new(()),
            _domain: PhantomData,
        }
    }

    /// The loaded record, without touching disk or network
    pub fn current(&self) -> Option<Record<D>> {
        self.current.read().clone()
    }

    /// Load the dataset, honouring the staleness policy unless `force` is set
    pub async fn load(&self, force: bool) -> Option<Record<D>> {
        self.load_with_source(force).await.map(|(record, _)| record)
    }

    pub async fn load_with_source(&self, force: bool) -> Option<(Record<D>, LoadSource)> {
        let name = D::DOMAIN.display_name();
        if !force {
            if let Some(record) = self.current() {
                return Some((record, LoadSource::Memory));
            }
        }

        let _guard = self.load_lock.lock().await;
        if !force {
            // Another caller may have finished loading while we waited
            if let Some(record) = self.current() {
                return Some((record, LoadSource::Memory));
            }
        }

        let cached = self.store.read::<ReferenceRecord<D::Data>>(D::DOMAIN.cache_file());
        let now = Utc::now();

        if !force {
            if let Some(record) = cached.as_ref().filter(|r| r.is_fresh(self.max_age, now)) {
                debug!(
                    "[{}] Using cache from {} ({} entries)",
                    name,
                    record.last_updated,
                    D::size(&record.data)
                );
                return Some((self.set(record.clone()), LoadSource::Cache));
            }
        }

        match self.fetch(now).await {
            Some(data) => {
                let record = ReferenceRecord::new(now, data);
                if let Err(e) = self.store.write(D::DOMAIN.cache_file(), &record) {
                    warn!("[{}] Failed to write cache record: {}", name, e);
                }
                info!("[{}] Fetched {} entries", name, D::size(&record.data));
                Some((self.set(record), LoadSource::Remote))
            }
            None => match cached {
                Some(record) => {
                    warn!("[{}] Fetch failed, using cache from {}", name, record.last_updated);
                    Some((self.set(record), LoadSource::StaleCache))
                }
                None => {
                    warn!("[{}] Fetch failed and no cache record exists", name);
                    self.current().map(|record| (record, LoadSource::Memory))
                }
            },
        }
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Option<D::Data> {
        let name = D::DOMAIN.display_name();
        let payload = match self.client.fetch(D::PATH, &[], KeyMode::None).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("[{}] Fetch failed: {}", name, e);
                dump_unusable_body(&self.store, &D::DOMAIN.to_string().to_lowercase(), &e);
                return None;
            }
        };
        let parsed = D::parse(&payload, now);
        if parsed.is_none() {
            warn!("[{}] Payload had an unexpected shape", name);
        }
        parsed
    }

    fn set(&self, record: ReferenceRecord<D::Data>) -> Record<D> {
        let record = Arc::new(record);
        *self.current.write() = Some(Arc::clone(&record));
        record
    }
}
