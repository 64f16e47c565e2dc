//! Bits shop catalogue

use chrono::{DateTime, Utc};
use flipper_core::{BitsItem, BitsShop, Domain};
use flipper_hypixel::types::{parse_entries, RawBitsItem, BITS_SHOP_PATH};
use serde_json::Value;

use super::{ReferenceDomain, ReferenceStore};

pub struct BitsShopDomain;

impl ReferenceDomain for BitsShopDomain {
    type Data = BitsShop;

    const DOMAIN: Domain = Domain::BitsShop;
    const PATH: &'static str = BITS_SHOP_PATH;

    fn parse(payload: &Value, _now: DateTime<Utc>) -> Option<BitsShop> {
        let entries = payload.get("shop_items").filter(|v| v.is_array())?;
        Some(
            parse_entries::<RawBitsItem>(Some(entries))
                .into_iter()
                .filter_map(RawBitsItem::into_bits_item)
                .collect(),
        )
    }

    fn size(data: &BitsShop) -> usize {
        data.len()
    }
}

pub type BitsShopStore = ReferenceStore<BitsShopDomain>;

impl ReferenceStore<BitsShopDomain> {
    pub fn get(&self, id: &str) -> Option<BitsItem> {
        self.current()?.data.get(id).cloned()
    }
}
