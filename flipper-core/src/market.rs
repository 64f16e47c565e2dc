//! Market snapshot structures for the bazaar and auction house

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Item rarity tier as reported by the API
///
/// Serialized as the API's SCREAMING_SNAKE_CASE string. Tiers added to the
/// game later are kept verbatim in `Other` so they survive a cache round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tier {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
    Divine,
    Special,
    VerySpecial,
    Ultimate,
    Admin,
    Other(String),
}

impl Tier {
    pub fn as_str(&self) -> &str {
        match self {
            Tier::Common => "COMMON",
            Tier::Uncommon => "UNCOMMON",
            Tier::Rare => "RARE",
            Tier::Epic => "EPIC",
            Tier::Legendary => "LEGENDARY",
            Tier::Mythic => "MYTHIC",
            Tier::Divine => "DIVINE",
            Tier::Special => "SPECIAL",
            Tier::VerySpecial => "VERY_SPECIAL",
            Tier::Ultimate => "ULTIMATE",
            Tier::Admin => "ADMIN",
            Tier::Other(raw) => raw,
        }
    }
}

impl From<String> for Tier {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "COMMON" => Tier::Common,
            "UNCOMMON" => Tier::Uncommon,
            "RARE" => Tier::Rare,
            "EPIC" => Tier::Epic,
            "LEGENDARY" => Tier::Legendary,
            "MYTHIC" => Tier::Mythic,
            "DIVINE" => Tier::Divine,
            "SPECIAL" => Tier::Special,
            "VERY_SPECIAL" => Tier::VerySpecial,
            "ULTIMATE" => Tier::Ultimate,
            "ADMIN" => Tier::Admin,
            _ => Tier::Other(raw),
        }
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single bazaar product quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sell_price: f64,
    pub buy_price: f64,
    pub sell_volume: u64,
    pub buy_volume: u64,
}

impl Product {
    /// Build a product, clamping negative or non-finite prices to zero
    pub fn new(
        id: impl Into<String>,
        sell_price: f64,
        buy_price: f64,
        sell_volume: u64,
        buy_volume: u64,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            sell_price: non_negative(sell_price),
            buy_price: non_negative(buy_price),
            sell_volume,
            buy_volume,
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Immutable view of the whole bazaar as of one fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BazaarSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub products: BTreeMap<String, Product>,
}

impl BazaarSnapshot {
    pub fn new(fetched_at: DateTime<Utc>, products: BTreeMap<String, Product>) -> Self {
        Self {
            fetched_at,
            products,
        }
    }

    /// An empty snapshot stamped with the current time
    pub fn empty() -> Self {
        Self::new(Utc::now(), BTreeMap::new())
    }

    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Seconds elapsed between `fetched_at` and `now`
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.fetched_at).num_seconds()
    }
}

/// A single auction house listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionItem {
    pub uuid: String,
    pub item_name: String,
    pub tier: Tier,
    pub bin: bool,
    pub starting_bid: f64,
    pub highest_bid: f64,
    pub end: DateTime<Utc>,
    pub category: String,
    pub seller: Option<String>,
}

/// Immutable view of the auction house aggregated over all fetched pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub total_pages: u32,
    pub total_auctions: usize,
    pub auctions: Vec<AuctionItem>,
}

impl AuctionSnapshot {
    /// Build a snapshot; `total_auctions` always mirrors the aggregated list
    pub fn new(fetched_at: DateTime<Utc>, total_pages: u32, auctions: Vec<AuctionItem>) -> Self {
        Self {
            fetched_at,
            total_pages,
            total_auctions: auctions.len(),
            auctions,
        }
    }

    pub fn empty() -> Self {
        Self::new(Utc::now(), 0, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.auctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auctions.is_empty()
    }

    pub fn bin_listings(&self) -> impl Iterator<Item = &AuctionItem> {
        self.auctions.iter().filter(|a| a.bin)
    }

    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.fetched_at).num_seconds()
    }
}
