//! Region catalog, encounter tables, and per-region generators.
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, check_probability, check_weight};
use crate::constants::{ENEMY_LEVEL_SCALE, TRAVELER_LEVEL_SCALE};
use crate::numbers::floor_f64_to_u32;
use crate::state::WorldState;
use crate::weighted::WeightTable;
use crate::weather::WeatherKind;

const DEFAULT_REGION_DATA: &str = include_str!("../assets/data/regions.json");
const FIZZCO_FACTION: &str = "fizzco_remnants";

/// Personality tag driving distortion bonuses and loot pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    #[default]
    Neutral,
    Dusty,
    Unstable,
    Mysterious,
    Harsh,
    Bustling,
}

/// Encounter families a region's weighted table can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    Raiders,
    Mutants,
    Scavengers,
    Wildlife,
    Travelers,
    Merchant,
    Anomaly,
    Event,
}

impl EncounterKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raiders => "raiders",
            Self::Mutants => "mutants",
            Self::Scavengers => "scavengers",
            Self::Wildlife => "wildlife",
            Self::Travelers => "travelers",
            Self::Merchant => "merchant",
            Self::Anomaly => "anomaly",
            Self::Event => "event",
        }
    }

    /// Kinds resolved as a fight.
    #[must_use]
    pub const fn is_combat(self) -> bool {
        matches!(
            self,
            Self::Raiders | Self::Mutants | Self::Scavengers | Self::Wildlife
        )
    }
}

const fn default_multiplier() -> f64 {
    1.0
}

/// Static per-region configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub personality: Personality,
    pub threat: f64,
    #[serde(default)]
    pub anomaly_baseline: f64,
    #[serde(default)]
    pub quest_chance: f64,
    #[serde(default = "default_multiplier")]
    pub rarity_multiplier: f64,
    #[serde(default = "default_multiplier")]
    pub quantity_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_bias: Option<WeatherKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_faction: Option<String>,
    #[serde(default)]
    pub encounters: WeightTable<EncounterKind>,
}

impl Region {
    fn validate(&self) -> Result<(), CatalogError> {
        check_probability(&self.id, "threat", self.threat)?;
        check_probability(&self.id, "anomalyBaseline", self.anomaly_baseline)?;
        check_probability(&self.id, "questChance", self.quest_chance)?;
        for (field, value) in [
            ("rarityMultiplier", self.rarity_multiplier),
            ("quantityMultiplier", self.quantity_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CatalogError::InvalidMultiplier {
                    id: self.id.clone(),
                    field,
                    value,
                });
            }
        }
        for (kind, weight) in self.encounters.iter() {
            check_weight(&self.id, kind.as_str(), weight)?;
        }
        Ok(())
    }

    /// Base enemy level, `floor(threat * 10)`.
    #[must_use]
    pub fn enemy_level(&self) -> u32 {
        floor_f64_to_u32(self.threat * ENEMY_LEVEL_SCALE)
    }
}

/// Enemy template chosen for a fight, before traits are rolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub id: String,
    pub level: u32,
}

impl EnemySpawn {
    fn new(id: &str, level: u32) -> Self {
        Self {
            id: id.to_string(),
            level,
        }
    }
}

/// Non-hostile traveler met on the road.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traveler {
    pub id: String,
    pub name: String,
    pub level: u32,
}

/// Flavor event rolled from a region's `event` encounter weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEvent {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,
}

/// Enemies for an encounter family in `region`.
#[must_use]
pub fn pick_enemies(region: &Region, kind: EncounterKind) -> Vec<EnemySpawn> {
    let base = region.enemy_level();
    match kind {
        EncounterKind::Raiders => vec![
            EnemySpawn::new("raider_gunman", base),
            EnemySpawn::new("raider_bruiser", base + 1),
        ],
        EncounterKind::Mutants => vec![
            EnemySpawn::new("mutant_brute", base + 1),
            EnemySpawn::new("mutant_howler", base + 2),
        ],
        EncounterKind::Scavengers => vec![
            EnemySpawn::new("scav_looter", base),
            EnemySpawn::new("scav_guard", base + 1),
        ],
        EncounterKind::Wildlife => vec![
            EnemySpawn::new("rad_wolf", base),
            EnemySpawn::new("rad_stag", base + 1),
        ],
        _ => vec![EnemySpawn::new("wastelander", base)],
    }
}

#[must_use]
pub fn pick_traveler(region: &Region) -> Traveler {
    Traveler {
        id: "traveler_generic".to_string(),
        name: "Weary Traveler".to_string(),
        level: floor_f64_to_u32(region.threat * TRAVELER_LEVEL_SCALE),
    }
}

/// Regional flavor event shaped by who controls the region and the sky.
#[must_use]
pub fn pick_region_event(state: &WorldState, region: &Region) -> RegionEvent {
    let faction = state.faction_control(&region.id).map(str::to_string);
    if faction.as_deref() == Some(FIZZCO_FACTION) {
        return RegionEvent {
            id: "strange_broadcast".to_string(),
            description: "A garbled pre-war FizzCo broadcast cuts through the static, offering 'limited-time' salvation.".to_string(),
            faction,
        };
    }
    if state.weather().is_some_and(|weather| weather.kind.is_storm()) {
        return RegionEvent {
            id: "silent_sky".to_string(),
            description: "The sky feels heavier here, the silence stretching just a few seconds too long.".to_string(),
            faction,
        };
    }
    RegionEvent {
        id: "regional_event".to_string(),
        description: format!("Something unusual is happening in {}.", region.name),
        faction,
    }
}

/// Kinds of points of interest inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Boss,
    Vault,
    Megastructure,
    Settlement,
    Wilderness,
}

/// A point of interest the player can visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub kind: LocationKind,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,
    pub region_id: String,
}

/// Read-only registry of regions, in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    /// Build a catalog, validating every region.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate ids, out-of-range probabilities,
    /// non-positive multipliers, or invalid encounter weights.
    pub fn new(regions: Vec<Region>) -> Result<Self, CatalogError> {
        for (idx, region) in regions.iter().enumerate() {
            if regions[..idx].iter().any(|other| other.id == region.id) {
                return Err(CatalogError::DuplicateId {
                    catalog: "region",
                    id: region.id.clone(),
                });
            }
            region.validate()?;
        }
        Ok(Self { regions })
    }

    /// Parse a JSON array of regions.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a region is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let regions: Vec<Region> =
            serde_json::from_str(json).map_err(|source| CatalogError::Parse {
                catalog: "region",
                source,
            })?;
        Self::new(regions)
    }

    /// Regions embedded in the crate.
    #[must_use]
    pub fn default_catalog() -> Self {
        Self::from_json(DEFAULT_REGION_DATA).unwrap_or_else(|err| {
            log::error!("embedded region catalog is invalid: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|region| region.id.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::Weather;

    fn catalog() -> RegionCatalog {
        RegionCatalog::default_catalog()
    }

    #[test]
    fn default_catalog_loads_every_region() {
        let regions = catalog();
        let ids: Vec<_> = regions.ids().collect();
        assert_eq!(
            ids,
            vec![
                "mojave_core",
                "fizzco_basin",
                "circuit_sprawl",
                "dustwalker_range",
                "deepwatch_frontier",
                "hollow_choir_rift",
                "brood_nest",
                "scav_market_belt",
            ]
        );
        let mojave = regions.get("mojave_core").unwrap();
        let kinds: Vec<_> = mojave.encounters.keys().copied().collect();
        assert_eq!(
            kinds,
            vec![
                EncounterKind::Raiders,
                EncounterKind::Wildlife,
                EncounterKind::Scavengers,
                EncounterKind::Travelers,
                EncounterKind::Merchant,
            ]
        );
        assert!(regions.get("atlantis").is_none());
    }

    #[test]
    fn enemy_levels_scale_with_threat() {
        let regions = catalog();
        let brood = regions.get("brood_nest").unwrap();
        let mutants = pick_enemies(brood, EncounterKind::Mutants);
        assert_eq!(mutants[0], EnemySpawn::new("mutant_brute", 9));
        assert_eq!(mutants[1].level, 10);
        let fallback = pick_enemies(brood, EncounterKind::Event);
        assert_eq!(fallback, vec![EnemySpawn::new("wastelander", 8)]);
        assert_eq!(pick_traveler(brood).level, 6);
    }

    #[test]
    fn region_events_follow_control_and_sky() {
        let regions = catalog();
        let basin = regions.get("fizzco_basin").unwrap();
        let mut state = WorldState::default();
        assert_eq!(pick_region_event(&state, basin).id, "regional_event");
        state.set_weather(Weather {
            kind: WeatherKind::Storm,
            intensity: None,
            region_id: basin.id.clone(),
            faction_id: None,
            anomaly: 0.0,
            timestamp: 0,
        });
        assert_eq!(pick_region_event(&state, basin).id, "silent_sky");
        state.set_faction_control("fizzco_basin", "fizzco_remnants");
        let event = pick_region_event(&state, basin);
        assert_eq!(event.id, "strange_broadcast");
        assert_eq!(event.faction.as_deref(), Some("fizzco_remnants"));
    }

    #[test]
    fn invalid_regions_are_rejected() {
        let bad_threat = r#"[{"id":"a","name":"A","threat":1.5,"encounters":{}}]"#;
        assert!(matches!(
            RegionCatalog::from_json(bad_threat),
            Err(CatalogError::ProbabilityOutOfRange { field: "threat", .. })
        ));
        let negative = r#"[{"id":"a","name":"A","threat":0.5,"encounters":{"raiders":-1}}]"#;
        assert!(matches!(
            RegionCatalog::from_json(negative),
            Err(CatalogError::InvalidWeight { .. })
        ));
        let dup = r#"[{"id":"a","name":"A","threat":0.5},{"id":"a","name":"B","threat":0.1}]"#;
        assert!(matches!(
            RegionCatalog::from_json(dup),
            Err(CatalogError::DuplicateId { .. })
        ));
        assert!(matches!(
            RegionCatalog::from_json("{"),
            Err(CatalogError::Parse { .. })
        ));
    }
}
