//! Loot generation: rarity roll, pool assembly, and deduplication.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    LOOT_ECHO_CHANCE, LOOT_ECHO_ITEM, LOOT_RAD_STORM_THRESHOLD, LOOT_WHITEOUT_ITEM,
    RARITY_ANOMALY_FACTOR, RARITY_WEIGHT_COMMON, RARITY_WEIGHT_LEGENDARY, RARITY_WEIGHT_RARE,
    RARITY_WEIGHT_UNCOMMON,
};
use crate::faction::{FactionCatalog, LootBias};
use crate::npc::{Npc, TraitId};
use crate::numbers::floor_f64_to_usize;
use crate::region::{Personality, Region};
use crate::state::WorldState;
use crate::weather::WeatherKind;
use crate::weighted::{WeightTable, pick_uniform};

/// Rarity tier of a loot roll. `Anomaly` sits beside the ordered base tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
    Anomaly,
}

impl Rarity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Legendary => "legendary",
            Self::Anomaly => "anomaly",
        }
    }

    /// Item ids in the base pool for this tier.
    #[must_use]
    pub const fn pool(self) -> &'static [&'static str] {
        match self {
            Self::Common => &["scrap_metal", "cloth_rags", "dirty_water", "old_batteries"],
            Self::Uncommon => &["ammo_pack", "medkit", "toolkit", "prewar_food"],
            Self::Rare => &["energy_cell", "advanced_toolkit", "stim_injector"],
            Self::Legendary => &["prototype_core", "artifact_relic", "relic_weapon"],
            Self::Anomaly => &["glitch_fragment", "unstable_core", "echo_shard"],
        }
    }
}

impl LootBias {
    /// Item ids in the faction pool for this bias.
    #[must_use]
    pub const fn pool(self) -> &'static [&'static str] {
        match self {
            Self::Tech => &["fizzco_prototype", "energy_pack", "corporate_datapad"],
            Self::Electronics => &["ai_fragment", "servo_core", "circuit_relic"],
            Self::Ritual => &["ritual_mask", "bone_talisman", "occult_components"],
            Self::Scrap => &["raider_armor", "spiked_bat", "junk_parts"],
            Self::Military => &["combat_armor", "ammo_crate", "military_rifle"],
            Self::Bio => &["mutant_claw", "acid_gland", "bio_sample"],
            Self::Mixed => &["salvaged_gear", "patchwork_armor", "random_parts"],
        }
    }
}

impl Personality {
    /// Region-personality loot pool, if this personality has one.
    #[must_use]
    pub const fn loot_pool(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Unstable => Some(&["unstable_core", "glitch_fragment"]),
            Self::Dusty => Some(&["water_ration", "sunscorched_armor"]),
            Self::Mysterious => Some(&["encrypted_chip", "strange_relic"]),
            Self::Neutral | Self::Harsh | Self::Bustling => None,
        }
    }
}

/// Rarity nudge a trait contributes, once per distinct trait present.
const fn trait_rarity_nudge(id: TraitId) -> Option<(Rarity, f64)> {
    match id {
        TraitId::Greedy => Some((Rarity::Uncommon, 0.2)),
        TraitId::Elite => Some((Rarity::Rare, 0.2)),
        TraitId::AnomalyTouched => Some((Rarity::Anomaly, 0.3)),
        _ => None,
    }
}

/// Distinct traits across a group, in table order.
#[must_use]
pub fn distinct_traits(npcs: &[Npc]) -> Vec<TraitId> {
    TraitId::ALL
        .into_iter()
        .filter(|id| npcs.iter().any(|npc| npc.traits.contains(id)))
        .collect()
}

/// Rarity weights before the draw.
#[must_use]
pub fn rarity_table(region: &Region, anomaly_level: f64, traits: &[TraitId]) -> WeightTable<Rarity> {
    let mut table = WeightTable::from_pairs([
        (Rarity::Common, RARITY_WEIGHT_COMMON),
        (Rarity::Uncommon, RARITY_WEIGHT_UNCOMMON),
        (Rarity::Rare, RARITY_WEIGHT_RARE),
        (Rarity::Legendary, RARITY_WEIGHT_LEGENDARY),
        (Rarity::Anomaly, anomaly_level * RARITY_ANOMALY_FACTOR),
    ]);
    for id in TraitId::ALL.into_iter().filter(|id| traits.contains(id)) {
        if let Some((rarity, nudge)) = trait_rarity_nudge(id) {
            table.add(rarity, nudge);
        }
    }
    table.scale(&Rarity::Rare, region.rarity_multiplier);
    table.scale(&Rarity::Legendary, region.rarity_multiplier);
    table
}

pub fn roll_rarity<R>(region: &Region, anomaly_level: f64, traits: &[TraitId], rng: &mut R) -> Rarity
where
    R: Rng + ?Sized,
{
    rarity_table(region, anomaly_level, traits)
        .pick(rng)
        .unwrap_or(Rarity::Common)
}

fn push_pick<R>(loot: &mut Vec<String>, pool: &[&str], rng: &mut R)
where
    R: Rng + ?Sized,
{
    if let Some(item) = pick_uniform(pool, rng) {
        loot.push((*item).to_string());
    }
}

/// Generate a deduplicated loot list for a fight or reward in `region`.
///
/// Quantity scaling repeats a prefix of the list before deduplication, so it
/// can only ever add items that were not already present.
pub fn generate_loot<R>(
    state: &WorldState,
    region: &Region,
    factions: &FactionCatalog,
    traits: &[TraitId],
    rng: &mut R,
) -> Vec<String>
where
    R: Rng + ?Sized,
{
    let anomaly_level = state.anomaly_level(&region.id);
    let weather = state.weather().map(|w| w.kind);
    let rarity = roll_rarity(region, anomaly_level, traits, rng);

    let mut loot = Vec::new();
    push_pick(&mut loot, rarity.pool(), rng);

    if let Some(pool) = region.personality.loot_pool() {
        push_pick(&mut loot, pool, rng);
    }

    if let Some(bias) = state
        .faction_control(&region.id)
        .and_then(|id| factions.loot_bias(id))
    {
        push_pick(&mut loot, bias.pool(), rng);
    }

    if weather == Some(WeatherKind::RadStorm) && anomaly_level > LOOT_RAD_STORM_THRESHOLD {
        push_pick(&mut loot, Rarity::Anomaly.pool(), rng);
    }

    if weather == Some(WeatherKind::Whiteout) {
        loot.push(LOOT_WHITEOUT_ITEM.to_string());
    }

    if state.is_region_unstable(&region.id) && rng.r#gen::<f64>() < LOOT_ECHO_CHANCE {
        loot.push(LOOT_ECHO_ITEM.to_string());
    }

    if region.quantity_multiplier > 1.0 {
        let extra = floor_f64_to_usize(region.quantity_multiplier - 1.0).min(loot.len());
        let prefix: Vec<String> = loot[..extra].to_vec();
        loot.extend(prefix);
    }

    let mut unique: Vec<String> = Vec::with_capacity(loot.len());
    for item in loot {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    log::debug!(
        "loot in {} rolled {} tier: {:?}",
        region.id,
        rarity.as_str(),
        unique
    );
    unique
}
