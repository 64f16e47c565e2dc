//! Core types for the SkyBlock market feed
//!
//! This crate defines the shared data structures used across the feed,
//! including market snapshots, reference datasets, economy constants and
//! the runtime configuration.

pub mod config;
pub mod domain;
pub mod economy;
pub mod error;
pub mod market;
pub mod reference;

pub use config::FlipperConfig;
pub use domain::Domain;
pub use economy::{EconomyConstants, KnownPerk};
pub use error::{FlipperError, FlipperResult};
pub use market::{AuctionItem, AuctionSnapshot, BazaarSnapshot, Product, Tier};
pub use reference::{
    BitsItem, BitsShop, Calendar, CalendarEvent, ItemCatalog, ItemInfo, MayorInfo, MayorPerk,
    ReferenceRecord,
};
