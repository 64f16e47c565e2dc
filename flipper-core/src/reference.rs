//! Slow-moving reference datasets: item metadata, bits shop, calendar, mayor

use crate::market::Tier;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cached reference dataset stamped with the time it was fetched
///
/// Serializes as the dataset's own fields plus a top-level `lastUpdated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord<T> {
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ReferenceRecord<T> {
    pub fn new(last_updated: DateTime<Utc>, data: T) -> Self {
        Self { last_updated, data }
    }

    /// True while the record is younger than `max_age`
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_updated) < max_age
    }
}

/// Item metadata from the resources API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInfo {
    pub id: String,
    pub display_name: String,
    pub tier: Tier,
    pub texture_url: Option<String>,
    pub npc_sell_price: f64,
}

/// Item metadata keyed by item id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub items: BTreeMap<String, ItemInfo>,
}

impl FromIterator<ItemInfo> for ItemCatalog {
    fn from_iter<I: IntoIterator<Item = ItemInfo>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(|item| (item.id.clone(), item)).collect(),
        }
    }
}

impl ItemCatalog {
    pub fn get(&self, id: &str) -> Option<&ItemInfo> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitsItem {
    pub id: String,
    pub name: String,
    pub bits_cost: u32,
    pub category: String,
    pub description: Option<String>,
    pub rarity: Option<Tier>,
    #[serde(default)]
    pub discount: f64,
}

/// Bits shop offers keyed by item id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BitsShop {
    pub items: BTreeMap<String, BitsItem>,
}

impl FromIterator<BitsItem> for BitsShop {
    fn from_iter<I: IntoIterator<Item = BitsItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(|item| (item.id.clone(), item)).collect(),
        }
    }
}

impl BitsShop {
    pub fn get(&self, id: &str) -> Option<&BitsItem> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: Option<String>,
    #[serde(default)]
    pub repeatable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub events: Vec<CalendarEvent>,
}

impl Calendar {
    /// Events running at `now` (exclusive on both ends)
    pub fn active_events(&self, now: DateTime<Utc>) -> Vec<&CalendarEvent> {
        self.events
            .iter()
            .filter(|e| e.start < now && now < e.end)
            .collect()
    }

    /// Events that have not started yet, soonest first
    pub fn upcoming_events(&self, now: DateTime<Utc>) -> Vec<&CalendarEvent> {
        let mut upcoming: Vec<&CalendarEvent> =
            self.events.iter().filter(|e| e.start > now).collect();
        upcoming.sort_by_key(|e| e.start);
        upcoming
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MayorPerk {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The currently elected mayor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MayorInfo {
    pub mayor_name: String,
    pub perks: Vec<MayorPerk>,
}
