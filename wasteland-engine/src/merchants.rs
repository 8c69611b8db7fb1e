//! Traveling merchants with seed-reproducible inventories.
use std::hash::Hasher;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::constants::{
    MERCHANT_BASE_PULLS, MERCHANT_FACTION_PULLS, MERCHANT_LEGENDARY_ROLL,
    MERCHANT_PERSONALITY_PULLS, MERCHANT_RARE_ROLL, MERCHANT_UNCOMMON_ROLL,
};
use crate::faction::{DEFAULT_GREETING, Faction, FactionCatalog};
use crate::loot::Rarity;
use crate::region::{Personality, Region};
use crate::state::WorldState;
use crate::weighted::pick_uniform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantEncounter {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,
    /// Regenerating with this seed reproduces `inventory`.
    pub inventory_seed: u64,
    pub greeting: String,
    pub discount: f64,
    pub inventory: Vec<String>,
}

fn stock_rarity(roll: f64) -> Rarity {
    if roll > MERCHANT_LEGENDARY_ROLL {
        Rarity::Legendary
    } else if roll > MERCHANT_RARE_ROLL {
        Rarity::Rare
    } else if roll > MERCHANT_UNCOMMON_ROLL {
        Rarity::Uncommon
    } else {
        Rarity::Common
    }
}

fn pull(items: &mut Vec<String>, pool: &[&str], times: usize, rng: &mut ChaCha20Rng) {
    for _ in 0..times {
        if let Some(item) = pick_uniform(pool, rng)
            && !items.iter().any(|existing| existing == item)
        {
            items.push((*item).to_string());
        }
    }
}

/// Deterministic stock for a merchant of `faction` in a region of `personality`.
#[must_use]
pub fn generate_inventory(
    faction: Option<&Faction>,
    personality: Personality,
    seed: u64,
) -> Vec<String> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let rarity = stock_rarity(rng.r#gen::<f64>());

    let mut items = Vec::new();
    pull(&mut items, rarity.pool(), MERCHANT_BASE_PULLS, &mut rng);
    if let Some(bias) = faction.and_then(|f| f.loot_bias) {
        pull(&mut items, bias.pool(), MERCHANT_FACTION_PULLS, &mut rng);
    }
    if let Some(pool) = personality.loot_pool() {
        pull(&mut items, pool, MERCHANT_PERSONALITY_PULLS, &mut rng);
    }
    items
}

fn merchant_digest(faction: &str, region: &str, seed: u64) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(faction.as_bytes());
    hasher.write(region.as_bytes());
    hasher.write_u64(seed);
    hasher.finish()
}

/// Merchant from the faction controlling `region`, or an unaffiliated trader.
///
/// Draws exactly once from `rng`, for the inventory seed.
pub fn roll_merchant<R>(
    state: &WorldState,
    region: &Region,
    factions: &FactionCatalog,
    rng: &mut R,
) -> MerchantEncounter
where
    R: Rng + ?Sized,
{
    let faction = state
        .faction_control(&region.id)
        .and_then(|id| factions.get(id));
    let inventory_seed = rng.r#gen::<u64>();
    let faction_id = faction.map_or("neutral", |f| f.id.as_str());
    let digest = merchant_digest(faction_id, &region.id, inventory_seed);

    let merchant = MerchantEncounter {
        id: format!("merchant_{faction_id}_{}_{digest:016x}", region.id),
        faction: faction.map(|f| f.id.clone()),
        inventory_seed,
        greeting: faction.map_or(DEFAULT_GREETING, Faction::greeting).to_string(),
        discount: faction.map_or(0.0, |f| factions.merchant_discount(state, &f.id)),
        inventory: generate_inventory(faction, region.personality, inventory_seed),
    };
    log::debug!(
        "merchant {} stocks {} items at {:.2} discount",
        merchant.id,
        merchant.inventory.len(),
        merchant.discount
    );
    merchant
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalogs;
    use rand::rngs::mock::StepRng;

    #[test]
    fn stock_rarity_thresholds_are_exclusive() {
        assert_eq!(stock_rarity(0.85), Rarity::Common);
        assert_eq!(stock_rarity(0.86), Rarity::Uncommon);
        assert_eq!(stock_rarity(0.951), Rarity::Rare);
        assert_eq!(stock_rarity(0.995), Rarity::Legendary);
    }

    #[test]
    fn inventory_is_reproducible_from_seed() {
        let catalogs = Catalogs::default_catalogs();
        let circuit = catalogs.factions.get("the_circuit");
        for seed in [0, 7, 42, u64::MAX] {
            let first = generate_inventory(circuit, Personality::Mysterious, seed);
            let second = generate_inventory(circuit, Personality::Mysterious, seed);
            assert_eq!(first, second);
            assert!(!first.is_empty());
            assert!(first.len() <= 7);
            let mut sorted = first.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), first.len(), "duplicates in {first:?}");
        }
    }

    #[test]
    fn unaffiliated_merchant_uses_default_greeting() {
        let catalogs = Catalogs::default_catalogs();
        let state = WorldState::default();
        let belt = catalogs.regions.get("scav_market_belt").unwrap();
        let merchant = roll_merchant(&state, belt, &catalogs.factions, &mut StepRng::new(9, 0));
        assert_eq!(merchant.inventory_seed, 9);
        assert!(merchant.faction.is_none());
        assert_eq!(merchant.greeting, DEFAULT_GREETING);
        assert!(merchant.discount.abs() < f64::EPSILON);
        assert!(merchant.id.starts_with("merchant_neutral_scav_market_belt_"));
        assert_eq!(
            merchant.inventory,
            generate_inventory(None, belt.personality, 9)
        );
    }

    #[test]
    fn faction_merchant_discount_tracks_reputation() {
        let catalogs = Catalogs::default_catalogs();
        let mut state = WorldState::seeded(&catalogs.regions, &catalogs.factions);
        let belt = catalogs.regions.get("scav_market_belt").unwrap();
        let neutral = roll_merchant(&state, belt, &catalogs.factions, &mut StepRng::new(1, 0));
        assert_eq!(neutral.faction.as_deref(), Some("free_scavs"));
        assert!((neutral.discount - 0.1).abs() < 1e-9);

        state.set_reputation("free_scavs", 80);
        let friend = roll_merchant(&state, belt, &catalogs.factions, &mut StepRng::new(1, 0));
        assert!(friend.discount > neutral.discount);
        assert_eq!(friend.inventory, neutral.inventory);
        assert_eq!(friend.id, neutral.id);
    }
}
