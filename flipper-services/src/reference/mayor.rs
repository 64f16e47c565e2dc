//! Current mayor and perks
//!
//! Every time a mayor record is read from the network or the cache, its
//! perks are pushed into the economy constants.

use chrono::{DateTime, Utc};
use flipper_core::{Domain, MayorInfo};
use flipper_hypixel::types::{ElectionResponse, ELECTION_PATH};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{EconomyStore, LoadSource, Record, ReferenceDomain, ReferenceStore};
use crate::cache_store::CacheStore;
use flipper_hypixel::HypixelClient;

pub struct MayorDomain;

impl ReferenceDomain for MayorDomain {
    type Data = MayorInfo;

    const DOMAIN: Domain = Domain::Mayor;
    const PATH: &'static str = ELECTION_PATH;

    fn parse(payload: &Value, _now: DateTime<Utc>) -> Option<MayorInfo> {
        let election = ElectionResponse::deserialize(payload).ok()?;
        Some(election.mayor?.into_mayor_info())
    }

    fn size(data: &MayorInfo) -> usize {
        data.perks.len()
    }
}

pub struct MayorService {
    records: ReferenceStore<MayorDomain>,
    economy: Arc<EconomyStore>,
}

impl MayorService {
    pub fn new(
        client: Arc<HypixelClient>,
        store: Arc<CacheStore>,
        max_age: Duration,
        economy: Arc<EconomyStore>,
    ) -> Self {
        Self {
            records: ReferenceStore::new(client, store, max_age),
            economy,
        }
    }

    /// Load the mayor record and re-derive economy constants from its perks
    pub async fn load(&self, force: bool) -> Option<Record<MayorDomain>> {
        let (record, source) = self.records.load_with_source(force).await?;
        if source != LoadSource::Memory {
            let applied = self.economy.apply_mayor_perks(&record.data.perks);
            debug!(
                "[Mayor] {} with {} economy perk(s) from {:?}",
                record.data.mayor_name,
                applied.len(),
                source
            );
        }
        Some(record)
    }

    pub fn current(&self) -> Option<Record<MayorDomain>> {
        self.records.current()
    }

    pub fn economy(&self) -> &Arc<EconomyStore> {
        &self.economy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_election() {
        let payload = json!({
            "success": true,
            "mayor": { "key": "economist", "name": "Diaz", "perks": [{ "name": "Volume Trading", "description": "..." }] },
            "current": {}
        });
        let info = MayorDomain::parse(&payload, Utc::now()).unwrap();
        assert_eq!(info.mayor_name, "Diaz");
        assert_eq!(info.perks.len(), 1);
    }

    #[test]
    fn test_missing_mayor_is_unusable() {
        assert!(MayorDomain::parse(&json!({ "success": true }), Utc::now()).is_none());
    }
}
