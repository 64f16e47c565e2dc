//! Shared economy constants record
//!
//! Read-modify-write of `economy_constants.json` is serialized by a mutex so
//! perk updates never race each other or the initial load.

use flipper_core::{Domain, EconomyConstants, KnownPerk, MayorPerk};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache_store::CacheStore;

pub struct EconomyStore {
    store: Arc<CacheStore>,
    current: RwLock<EconomyConstants>,
    write_lock: Mutex<()>,
}

impl EconomyStore {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self {
            store,
            current: RwLock::new(EconomyConstants::default()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> EconomyConstants {
        self.current.read().clone()
    }

    /// Load the stored record, writing defaults if it is absent or corrupt
    pub fn load(&self) -> EconomyConstants {
        let _guard = self.write_lock.lock();
        let constants = match self.store.read::<EconomyConstants>(Domain::Economy.cache_file()) {
            Some(constants) => constants,
            None => {
                let defaults = EconomyConstants::default();
                self.persist(&defaults);
                info!("[Economy] Initialized default economy constants");
                defaults
            }
        };
        *self.current.write() = constants.clone();
        constants
    }

    /// Re-derive the perk-affected constants for the given mayor perks
    pub fn apply_mayor_perks(&self, perks: &[MayorPerk]) -> Vec<KnownPerk> {
        let _guard = self.write_lock.lock();
        let base = self
            .store
            .read::<EconomyConstants>(Domain::Economy.cache_file())
            .unwrap_or_else(|| self.current());

        let (adjusted, applied) = base.with_mayor_perks(perks);
        for perk in &applied {
            info!("[Economy] Applied perk: {}", perk.describe());
        }
        self.persist(&adjusted);
        *self.current.write() = adjusted;
        applied
    }

    fn persist(&self, constants: &EconomyConstants) {
        if let Err(e) = self.store.write(Domain::Economy.cache_file(), constants) {
            warn!("[Economy] Failed to write economy constants: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipper_core::economy::{DEFAULT_AH_TAX, DEFAULT_BAZAAR_TAX};
    use std::fs;

    fn perk(name: &str) -> MayorPerk {
        MayorPerk {
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_load_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CacheStore::new(dir.path()));
        let economy = EconomyStore::new(Arc::clone(&store));

        let constants = economy.load();
        assert_eq!(constants.bazaar_tax, DEFAULT_BAZAAR_TAX);
        assert!(store.cache_dir().join("economy_constants.json").exists());
    }

    #[test]
    fn test_corrupt_record_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CacheStore::new(dir.path()));
        store.ensure_structure().unwrap();
        fs::write(store.cache_dir().join("economy_constants.json"), "garbage").unwrap();

        let economy = EconomyStore::new(store);
        assert_eq!(economy.load().ah_tax, DEFAULT_AH_TAX);
    }

    #[test]
    fn test_perks_persist_without_compounding() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CacheStore::new(dir.path()));
        let economy = EconomyStore::new(Arc::clone(&store));
        economy.load();

        let perks = [perk("Financial Aid")];
        economy.apply_mayor_perks(&perks);
        economy.apply_mayor_perks(&perks);

        let stored: EconomyConstants = store.read("economy_constants.json").unwrap();
        assert!((stored.bazaar_tax - DEFAULT_BAZAAR_TAX * 0.75).abs() < 1e-12);
        assert_eq!(economy.current().bazaar_tax, stored.bazaar_tax);
    }
}
