//! Item metadata (display names, tiers, NPC sell prices)

use chrono::{DateTime, Utc};
use flipper_core::{Domain, ItemCatalog, ItemInfo};
use flipper_hypixel::types::{parse_entries, RawItem, ITEMS_PATH};
use serde_json::Value;

use super::{ReferenceDomain, ReferenceStore};

pub struct ItemsDomain;

impl ReferenceDomain for ItemsDomain {
    type Data = ItemCatalog;

    const DOMAIN: Domain = Domain::Items;
    const PATH: &'static str = ITEMS_PATH;

    fn parse(payload: &Value, _now: DateTime<Utc>) -> Option<ItemCatalog> {
        let entries = payload.get("items").filter(|v| v.is_array())?;
        Some(
            parse_entries::<RawItem>(Some(entries))
                .into_iter()
                .filter_map(RawItem::into_item_info)
                .collect(),
        )
    }

    fn size(data: &ItemCatalog) -> usize {
        data.len()
    }
}

pub type ItemStore = ReferenceStore<ItemsDomain>;

impl ReferenceStore<ItemsDomain> {
    /// Metadata for one item id, if the catalogue is loaded
    pub fn get(&self, id: &str) -> Option<ItemInfo> {
        self.current()?.data.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipper_core::Tier;
    use serde_json::json;

    #[test]
    fn test_parse_items() {
        let payload = json!({
            "success": true,
            "items": [
                { "id": "ASPECT_OF_THE_END", "name": "Aspect of the End", "tier": "RARE", "npc_sell_price": 56000 },
                { "name": "No id" },
                { "id": "ROTTEN_FLESH" }
            ]
        });
        let catalog = ItemsDomain::parse(&payload, Utc::now()).unwrap();
        assert_eq!(catalog.len(), 2);

        let aote = catalog.get("ASPECT_OF_THE_END").unwrap();
        assert_eq!(aote.tier, Tier::Rare);
        assert_eq!(aote.npc_sell_price, 56000.0);

        let flesh = catalog.get("ROTTEN_FLESH").unwrap();
        assert_eq!(flesh.display_name, "ROTTEN_FLESH");
        assert_eq!(flesh.texture_url, None);
    }

    #[test]
    fn test_missing_items_array_is_unusable() {
        assert!(ItemsDomain::parse(&json!({ "success": true }), Utc::now()).is_none());
    }
}
