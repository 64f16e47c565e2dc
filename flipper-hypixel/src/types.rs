//! Raw Hypixel API payload types
//!
//! Every field is optional so one malformed entry never sinks a whole page.
//! Conversions into the core types apply the documented defaults.

use chrono::{DateTime, TimeZone, Utc};
use flipper_core::{
    AuctionItem, BitsItem, CalendarEvent, ItemInfo, MayorInfo, MayorPerk, Product, Tier,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub const BAZAAR_PATH: &str = "/v2/skyblock/bazaar";
pub const AUCTIONS_PATH: &str = "/v2/skyblock/auctions";
pub const ITEMS_PATH: &str = "/v2/resources/skyblock/items";
pub const ELECTION_PATH: &str = "/v2/resources/skyblock/election";
pub const BITS_SHOP_PATH: &str = "/v2/resources/skyblock/bits_shop";
pub const CALENDAR_PATH: &str = "/v2/resources/skyblock/calendar";

/// Deserialize each element of a JSON array on its own, skipping failures
pub fn parse_entries<T: DeserializeOwned>(array: Option<&Value>) -> Vec<T> {
    array
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| T::deserialize(entry).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// `success == true` as reported by the API envelope
pub fn is_success(payload: &Value) -> bool {
    payload.get("success").and_then(Value::as_bool) == Some(true)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStatus {
    pub sell_price: Option<f64>,
    pub buy_price: Option<f64>,
    pub sell_volume: Option<f64>,
    pub buy_volume: Option<f64>,
}

impl QuickStatus {
    pub fn into_product(self, id: &str) -> Product {
        Product::new(
            id,
            self.sell_price.unwrap_or(0.0),
            self.buy_price.unwrap_or(0.0),
            volume(self.sell_volume),
            volume(self.buy_volume),
        )
    }
}

fn volume(raw: Option<f64>) -> u64 {
    match raw {
        Some(v) if v.is_finite() && v > 0.0 => v as u64,
        _ => 0,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BazaarEntry {
    pub quick_status: Option<QuickStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAuction {
    pub uuid: Option<String>,
    pub auctioneer: Option<String>,
    pub item_name: Option<String>,
    pub tier: Option<Tier>,
    pub bin: Option<bool>,
    pub starting_bid: Option<f64>,
    pub highest_bid_amount: Option<f64>,
    /// Epoch milliseconds
    pub end: Option<i64>,
    pub category: Option<String>,
}

impl RawAuction {
    /// Convert to a listing; entries without an item name are dropped
    pub fn into_auction_item(self) -> Option<AuctionItem> {
        let item_name = self.item_name?;
        Some(AuctionItem {
            uuid: self.uuid.unwrap_or_else(|| "unknown".to_string()),
            item_name,
            tier: self.tier.unwrap_or_default(),
            bin: self.bin.unwrap_or(false),
            starting_bid: self.starting_bid.unwrap_or(0.0),
            highest_bid: self.highest_bid_amount.unwrap_or(0.0),
            end: epoch_millis(self.end.unwrap_or(0)),
            category: self.category.unwrap_or_else(|| "misc".to_string()),
            seller: self.auctioneer,
        })
    }
}

fn epoch_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub tier: Option<Tier>,
    pub texture: Option<String>,
    pub npc_sell_price: Option<f64>,
}

impl RawItem {
    pub fn into_item_info(self) -> Option<ItemInfo> {
        let id = self.id?;
        Some(ItemInfo {
            display_name: self.name.unwrap_or_else(|| id.clone()),
            id,
            tier: self.tier.unwrap_or_default(),
            texture_url: self.texture,
            npc_sell_price: self.npc_sell_price.unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBitsItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub cost: Option<u32>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub tier: Option<Tier>,
}

impl RawBitsItem {
    pub fn into_bits_item(self) -> Option<BitsItem> {
        let id = self.id?;
        Some(BitsItem {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            bits_cost: self.cost.unwrap_or(0),
            category: self.category.unwrap_or_else(|| "misc".to_string()),
            description: self.description,
            rarity: self.tier,
            discount: 0.0,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCalendarEvent {
    pub id: Option<String>,
    pub name: Option<String>,
    pub start: Option<Value>,
    pub end: Option<Value>,
    pub description: Option<String>,
    pub repeatable: Option<bool>,
}

impl RawCalendarEvent {
    /// Timestamps may be RFC 3339 strings or epoch milliseconds; anything
    /// else is taken as `now`
    pub fn into_event(self, now: DateTime<Utc>) -> Option<CalendarEvent> {
        let id = self.id?;
        Some(CalendarEvent {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            start: timestamp(self.start.as_ref()).unwrap_or(now),
            end: timestamp(self.end.as_ref()).unwrap_or(now),
            description: self.description,
            repeatable: self.repeatable.unwrap_or(false),
        })
    }
}

fn timestamp(raw: Option<&Value>) -> Option<DateTime<Utc>> {
    match raw? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElectionResponse {
    pub mayor: Option<RawMayor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMayor {
    pub name: Option<String>,
    #[serde(default)]
    pub perks: Vec<RawPerk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPerk {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl RawMayor {
    pub fn into_mayor_info(self) -> MayorInfo {
        MayorInfo {
            mayor_name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            perks: self
                .perks
                .into_iter()
                .filter_map(|p| {
                    Some(MayorPerk {
                        name: p.name?,
                        description: p.description.unwrap_or_default(),
                    })
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auction_defaults() {
        let raw: RawAuction = serde_json::from_value(json!({ "item_name": "Dirt" })).unwrap();
        let item = raw.into_auction_item().unwrap();

        assert_eq!(item.uuid, "unknown");
        assert_eq!(item.tier, Tier::Common);
        assert!(!item.bin);
        assert_eq!(item.starting_bid, 0.0);
        assert_eq!(item.end, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(item.category, "misc");
        assert_eq!(item.seller, None);
    }

    #[test]
    fn test_auction_without_name_is_dropped() {
        let raw: RawAuction = serde_json::from_value(json!({ "uuid": "x", "bin": true })).unwrap();
        assert!(raw.into_auction_item().is_none());
    }

    #[test]
    fn test_parse_entries_skips_bad_elements() {
        let page = json!({
            "auctions": [
                { "item_name": "Stone", "auctioneer": "abc", "end": 1_700_000_000_000i64 },
                "not an object",
                { "item_name": "Sand", "bin": "maybe" }
            ]
        });
        let raw: Vec<RawAuction> = parse_entries(page.get("auctions"));
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].auctioneer.as_deref(), Some("abc"));
    }

    #[test]
    fn test_quick_status_clamps() {
        let status: QuickStatus = serde_json::from_value(json!({
            "sellPrice": -1.0,
            "buyPrice": 4.5,
            "sellVolume": 12
        }))
        .unwrap();
        let product = status.into_product("COBBLESTONE");
        assert_eq!(product.sell_price, 0.0);
        assert_eq!(product.buy_price, 4.5);
        assert_eq!(product.sell_volume, 12);
        assert_eq!(product.buy_volume, 0);
    }

    #[test]
    fn test_calendar_timestamps() {
        let now = Utc.timestamp_opt(1_000, 0).unwrap();
        let raw: RawCalendarEvent = serde_json::from_value(json!({
            "id": "spooky",
            "start": "2024-10-31T00:00:00Z",
            "end": 1_730_419_200_000i64
        }))
        .unwrap();
        let event = raw.into_event(now).unwrap();
        assert_eq!(event.name, "spooky");
        assert_eq!(event.start.timestamp(), 1_730_332_800);
        assert_eq!(event.end.timestamp(), 1_730_419_200);

        let raw: RawCalendarEvent =
            serde_json::from_value(json!({ "id": "broken", "start": true })).unwrap();
        assert_eq!(raw.into_event(now).unwrap().start, now);
    }

    #[test]
    fn test_mayor_conversion() {
        let election: ElectionResponse = serde_json::from_value(json!({
            "success": true,
            "mayor": {
                "name": "Diana",
                "perks": [{ "name": "Mythological Ritual", "description": "..." }, { "description": "nameless" }]
            }
        }))
        .unwrap();
        let info = election.mayor.unwrap().into_mayor_info();
        assert_eq!(info.mayor_name, "Diana");
        assert_eq!(info.perks.len(), 1);
    }
}
