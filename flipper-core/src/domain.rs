//! Data domains served by the feed

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every dataset the feed maintains, each backed by its own cache record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Live bazaar quotes, refreshed every few seconds
    Bazaar,
    /// Paginated auction house listings
    AuctionHouse,
    /// Item metadata (names, tiers, NPC prices)
    Items,
    /// Bits shop catalogue
    BitsShop,
    /// SkyBlock calendar events
    Calendar,
    /// Active mayor and perks
    Mayor,
    /// Derived tax and fee parameters
    Economy,
}

impl Domain {
    pub const ALL: [Domain; 7] = [
        Domain::Bazaar,
        Domain::AuctionHouse,
        Domain::Items,
        Domain::BitsShop,
        Domain::Calendar,
        Domain::Mayor,
        Domain::Economy,
    ];

    /// File name of the domain's cache record
    pub fn cache_file(&self) -> &'static str {
        match self {
            Domain::Bazaar => "bazaar_snapshot.json",
            Domain::AuctionHouse => "auction_house_snapshot.json",
            Domain::Items => "items_info.json",
            Domain::BitsShop => "bits_shop.json",
            Domain::Calendar => "calendar_events.json",
            Domain::Mayor => "mayor_perks.json",
            Domain::Economy => "economy_constants.json",
        }
    }

    /// File name of the append-only history log, if the domain keeps one
    pub fn history_file(&self) -> Option<&'static str> {
        match self {
            Domain::Bazaar => Some("bazaar_history.jsonl"),
            _ => None,
        }
    }

    /// Get the full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::Bazaar => "Bazaar",
            Domain::AuctionHouse => "AuctionHouse",
            Domain::Items => "ItemInfo",
            Domain::BitsShop => "BitsShop",
            Domain::Calendar => "Calendar",
            Domain::Mayor => "Mayor",
            Domain::Economy => "Economy",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_cache_files_are_disjoint() {
        let names: HashSet<&str> = Domain::ALL.iter().map(|d| d.cache_file()).collect();
        assert_eq!(names.len(), Domain::ALL.len());

        for domain in Domain::ALL {
            if let Some(history) = domain.history_file() {
                assert!(!names.contains(history));
            }
        }
    }
}
