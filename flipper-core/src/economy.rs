//! Tax and fee parameters used by downstream profit calculations

use crate::reference::MayorPerk;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_BAZAAR_TAX: f64 = 0.0125;
pub const DEFAULT_AH_TAX: f64 = 0.01;
pub const DEFAULT_COOKIE_BOOST_COIN_MULTIPLIER: f64 = 1.0;

/// Mayor perks with a known effect on the economy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownPerk {
    /// -25% bazaar tax
    FinancialAid,
    /// -10% auction house tax
    ExtraordinarySavings,
    /// +20% bits output
    BoostedBits,
}

impl KnownPerk {
    /// Match a perk by name, ignoring case and surrounding whitespace
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "financial aid" => Some(KnownPerk::FinancialAid),
            "extraordinary savings" => Some(KnownPerk::ExtraordinarySavings),
            "boosted bits" => Some(KnownPerk::BoostedBits),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            KnownPerk::FinancialAid => "Financial Aid (-25% Bazaar tax)",
            KnownPerk::ExtraordinarySavings => "Extraordinary Savings (-10% AH tax)",
            KnownPerk::BoostedBits => "Boosted Bits (+20% Bits output)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EconomyConstants {
    pub bazaar_tax: f64,
    pub ah_tax: f64,
    /// Listing fee multiplier keyed by auction duration in hours
    pub ah_listing_fee_multipliers: BTreeMap<u32, f64>,
    pub ah_max_duration_hours: u32,
    pub npc_sell_tax_reduction: f64,
    pub cookie_boost_coin_multiplier: f64,
    pub last_updated: DateTime<Utc>,
}

impl Default for EconomyConstants {
    fn default() -> Self {
        Self {
            bazaar_tax: DEFAULT_BAZAAR_TAX,
            ah_tax: DEFAULT_AH_TAX,
            ah_listing_fee_multipliers: BTreeMap::from([(6, 0.01), (12, 0.02), (24, 0.03), (48, 0.04)]),
            ah_max_duration_hours: 48,
            npc_sell_tax_reduction: 0.0,
            cookie_boost_coin_multiplier: DEFAULT_COOKIE_BOOST_COIN_MULTIPLIER,
            last_updated: Utc::now(),
        }
    }
}

impl EconomyConstants {
    /// Derive constants for the given mayor perks.
    ///
    /// Perk-affected fields start from the defaults, so applying the same
    /// perks repeatedly always gives the same result. Everything else is
    /// carried over from `self`.
    pub fn with_mayor_perks(&self, perks: &[MayorPerk]) -> (Self, Vec<KnownPerk>) {
        let mut adjusted = Self {
            bazaar_tax: DEFAULT_BAZAAR_TAX,
            ah_tax: DEFAULT_AH_TAX,
            cookie_boost_coin_multiplier: DEFAULT_COOKIE_BOOST_COIN_MULTIPLIER,
            last_updated: Utc::now(),
            ..self.clone()
        };

        let mut applied = Vec::new();
        for perk in perks {
            let Some(known) = KnownPerk::from_name(&perk.name) else {
                continue;
            };
            match known {
                KnownPerk::FinancialAid => adjusted.bazaar_tax = DEFAULT_BAZAAR_TAX * 0.75,
                KnownPerk::ExtraordinarySavings => adjusted.ah_tax = DEFAULT_AH_TAX * 0.9,
                KnownPerk::BoostedBits => {
                    adjusted.cookie_boost_coin_multiplier =
                        DEFAULT_COOKIE_BOOST_COIN_MULTIPLIER * 1.2
                }
            }
            applied.push(known);
        }

        (adjusted, applied)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn perk(name: &str) -> MayorPerk {
        MayorPerk {
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_perks_adjust_taxes() {
        let base = EconomyConstants::default();
        let (adjusted, applied) =
            base.with_mayor_perks(&[perk("Financial Aid"), perk("EXTRAORDINARY SAVINGS"), perk("Pathfinder")]);

        assert_eq!(applied, vec![KnownPerk::FinancialAid, KnownPerk::ExtraordinarySavings]);
        assert!((adjusted.bazaar_tax - 0.009375).abs() < 1e-12);
        assert!((adjusted.ah_tax - 0.009).abs() < 1e-12);
        assert_eq!(adjusted.cookie_boost_coin_multiplier, 1.0);
    }

    #[test]
    fn test_perks_do_not_compound() {
        let base = EconomyConstants::default();
        let perks = [perk("financial aid"), perk("boosted bits")];
        let (once, _) = base.with_mayor_perks(&perks);
        let (twice, _) = once.with_mayor_perks(&perks);

        assert_eq!(once.bazaar_tax, twice.bazaar_tax);
        assert_eq!(once.cookie_boost_coin_multiplier, twice.cookie_boost_coin_multiplier);
    }

    #[test]
    fn test_perks_reset_when_mayor_changes() {
        let (with_aid, _) = EconomyConstants::default().with_mayor_perks(&[perk("Financial Aid")]);
        let (without, applied) = with_aid.with_mayor_perks(&[perk("Sharing is Caring")]);
        assert!(applied.is_empty());
        assert_eq!(without.bazaar_tax, DEFAULT_BAZAAR_TAX);
    }


    #[test]
    fn test_round_trips_with_string_keys() {
        let constants = EconomyConstants::default();
        let json = serde_json::to_value(&constants).unwrap();
        assert_eq!(json["ahListingFeeMultipliers"]["24"], 0.03);

        let parsed: EconomyConstants = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, constants);
    }
}
