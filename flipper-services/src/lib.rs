//! Market services for the SkyBlock feed
//!
//! This crate owns the durable cache, the per-domain refresh schedules,
//! the health monitor and the startup orchestrator that wires them up.

pub mod auctions;
pub mod bazaar;
pub mod cache_store;
pub mod health;
pub mod orchestrator;
pub mod reference;
pub mod refresh;
pub mod scheduler;

pub use auctions::{AuctionHouseConfig, AuctionHouseService};
pub use bazaar::BazaarService;
pub use cache_store::{CacheError, CacheStore};
pub use health::{HealthConfig, HealthMonitor, HealthReport, SnapshotHealth};
pub use orchestrator::{Orchestrator, Services};
pub use reference::{
    BitsShopStore, CalendarStore, EconomyStore, ItemStore, LoadSource, MayorService,
    ReferenceDomain, ReferenceStore,
};
pub use refresh::RefreshOutcome;
pub use scheduler::PeriodicTask;
