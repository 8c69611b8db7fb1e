//! Faction definitions, reputation tiers, and faction-driven rolls.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, check_probability, check_weight};
use crate::constants::{
    AMBUSH_FACTORS_NEGATIVE, AMBUSH_FACTORS_POSITIVE, BACKUP_FACTORS_NEGATIVE,
    BACKUP_FACTORS_POSITIVE, DEFAULT_BASE_AMBUSH, DEFAULT_BASE_BACKUP, DISCOUNT_FACTORS_NEGATIVE,
    DISCOUNT_FACTORS_POSITIVE, REPUTATION_THRESHOLDS, STANDING_BANDS,
};
use crate::state::WorldState;
use crate::weather::WeatherKind;
use crate::weighted::WeightTable;

const DEFAULT_FACTION_DATA: &str = include_str!("../assets/data/factions.json");
const EVERYONE: &str = "everyone";
pub(crate) const DEFAULT_GREETING: &str = "Let's trade while the world still spins.";
const REPUTATION_LABEL_COUNT: usize = 7;

/// Seven ordered reputation tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationTier {
    Hostile,
    Unfriendly,
    Wary,
    Neutral,
    Accepted,
    Friendly,
    Ally,
}

impl ReputationTier {
    const ORDER: [Self; 7] = [
        Self::Hostile,
        Self::Unfriendly,
        Self::Wary,
        Self::Neutral,
        Self::Accepted,
        Self::Friendly,
        Self::Ally,
    ];

    /// Tier for a score. Each threshold is the inclusive lower bound of the next tier.
    #[must_use]
    pub fn from_score(score: i32) -> Self {
        let idx = REPUTATION_THRESHOLDS
            .iter()
            .filter(|threshold| score >= **threshold)
            .count();
        Self::ORDER[idx.min(Self::ORDER.len() - 1)]
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Generic label used when a faction has no custom labels.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hostile => "HOSTILE",
            Self::Unfriendly => "UNFRIENDLY",
            Self::Wary => "WARY",
            Self::Neutral => "NEUTRAL",
            Self::Accepted => "ACCEPTED",
            Self::Friendly => "FRIENDLY",
            Self::Ally => "ALLY",
        }
    }
}

/// Loot pool a faction biases drops toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootBias {
    Tech,
    Electronics,
    Ritual,
    Scrap,
    Military,
    Bio,
    Mixed,
}

const fn default_base_ambush() -> f64 {
    DEFAULT_BASE_AMBUSH
}

const fn default_base_backup() -> f64 {
    DEFAULT_BASE_BACKUP
}

/// Static faction definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faction {
    pub id: String,
    pub name: String,
    /// Faction ids this faction attacks on sight, or `"everyone"`.
    #[serde(default)]
    pub enemies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loot_bias: Option<LootBias>,
    #[serde(default)]
    pub weather_influence: WeightTable<WeatherKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patrol_chance: Option<f64>,
    #[serde(default)]
    pub base_discount: f64,
    #[serde(default = "default_base_ambush")]
    pub base_ambush_chance: f64,
    #[serde(default = "default_base_backup")]
    pub base_backup_chance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation_levels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

/// Ambush and backup chances adjusted for standing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncounterBias {
    pub ambush_chance: f64,
    pub backup_chance: f64,
}

/// Patrol sighted on region entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatrolSighting {
    pub faction: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Standing {
    Neutral,
    Positive(usize),
    Negative(usize),
}

fn standing(score: i32) -> Standing {
    let magnitude = score.unsigned_abs();
    let band = STANDING_BANDS
        .iter()
        .rposition(|threshold| magnitude >= threshold.unsigned_abs());
    match band {
        Some(idx) if score > 0 => Standing::Positive(idx),
        Some(idx) => Standing::Negative(idx),
        None => Standing::Neutral,
    }
}

impl Faction {
    fn validate(&self) -> Result<(), CatalogError> {
        if let Some(chance) = self.patrol_chance {
            check_probability(&self.id, "patrolChance", chance)?;
        }
        check_probability(&self.id, "baseDiscount", self.base_discount)?;
        check_probability(&self.id, "baseAmbushChance", self.base_ambush_chance)?;
        check_probability(&self.id, "baseBackupChance", self.base_backup_chance)?;
        for (kind, weight) in self.weather_influence.iter() {
            check_weight(&self.id, kind.as_str(), weight)?;
        }
        if let Some(levels) = &self.reputation_levels
            && levels.len() != REPUTATION_LABEL_COUNT
        {
            return Err(CatalogError::ReputationLabels {
                id: self.id.clone(),
                count: levels.len(),
            });
        }
        Ok(())
    }

    /// Label for `score`, using custom labels when the faction defines them.
    #[must_use]
    pub fn reputation_label(&self, score: i32) -> &str {
        let tier = ReputationTier::from_score(score);
        self.reputation_levels
            .as_ref()
            .and_then(|levels| levels.get(tier.index()))
            .map_or(tier.label(), String::as_str)
    }

    /// True if this faction attacks `other`. Not symmetric.
    #[must_use]
    pub fn is_hostile_to(&self, other: &str) -> bool {
        self.enemies
            .iter()
            .any(|enemy| enemy == EVERYONE || enemy == other)
    }

    /// Merchant discount, scaled from `base_discount` by standing band.
    #[must_use]
    pub fn merchant_discount(&self, score: i32) -> f64 {
        let factor = match standing(score) {
            Standing::Neutral => 1.0,
            Standing::Positive(idx) => DISCOUNT_FACTORS_POSITIVE[idx],
            Standing::Negative(idx) => DISCOUNT_FACTORS_NEGATIVE[idx],
        };
        self.base_discount * factor
    }

    /// Ambush/backup chances, scaled from the faction's base chances by standing band.
    #[must_use]
    pub fn encounter_bias(&self, score: i32) -> EncounterBias {
        let (ambush, backup) = match standing(score) {
            Standing::Neutral => (1.0, 1.0),
            Standing::Positive(idx) => (AMBUSH_FACTORS_POSITIVE[idx], BACKUP_FACTORS_POSITIVE[idx]),
            Standing::Negative(idx) => (AMBUSH_FACTORS_NEGATIVE[idx], BACKUP_FACTORS_NEGATIVE[idx]),
        };
        EncounterBias {
            ambush_chance: self.base_ambush_chance * ambush,
            backup_chance: self.base_backup_chance * backup,
        }
    }

    #[must_use]
    pub fn greeting(&self) -> &str {
        self.greeting.as_deref().unwrap_or(DEFAULT_GREETING)
    }
}

/// Read-only registry of factions, in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactionCatalog {
    factions: Vec<Faction>,
}

impl FactionCatalog {
    /// Build a catalog, validating every faction.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate ids, out-of-range chances, invalid
    /// weather weights, or a label list that is not exactly seven entries.
    pub fn new(factions: Vec<Faction>) -> Result<Self, CatalogError> {
        for (idx, faction) in factions.iter().enumerate() {
            if factions[..idx].iter().any(|other| other.id == faction.id) {
                return Err(CatalogError::DuplicateId {
                    catalog: "faction",
                    id: faction.id.clone(),
                });
            }
            faction.validate()?;
        }
        Ok(Self { factions })
    }

    /// Parse a JSON array of factions.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a faction is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let factions: Vec<Faction> =
            serde_json::from_str(json).map_err(|source| CatalogError::Parse {
                catalog: "faction",
                source,
            })?;
        Self::new(factions)
    }

    /// Factions embedded in the crate.
    #[must_use]
    pub fn default_catalog() -> Self {
        Self::from_json(DEFAULT_FACTION_DATA).unwrap_or_else(|err| {
            log::error!("embedded faction catalog is invalid: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Faction> {
        self.factions.iter().find(|faction| faction.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Faction> {
        self.factions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }

    /// Label for `score` with `faction_id`; unknown factions use generic labels.
    #[must_use]
    pub fn reputation_label(&self, score: i32, faction_id: &str) -> &str {
        self.get(faction_id).map_or_else(
            || ReputationTier::from_score(score).label(),
            |faction| faction.reputation_label(score),
        )
    }

    /// True if `a` lists `"everyone"` or `b` among its enemies.
    #[must_use]
    pub fn is_hostile(&self, a: &str, b: &str) -> bool {
        self.get(a).is_some_and(|faction| faction.is_hostile_to(b))
    }

    #[must_use]
    pub fn loot_bias(&self, faction_id: &str) -> Option<LootBias> {
        self.get(faction_id).and_then(|faction| faction.loot_bias)
    }

    #[must_use]
    pub fn weather_influence(&self, faction_id: &str) -> Option<&WeightTable<WeatherKind>> {
        self.get(faction_id)
            .map(|faction| &faction.weather_influence)
            .filter(|table| !table.is_empty())
    }

    /// Discount for the player's current standing; zero for unknown factions.
    #[must_use]
    pub fn merchant_discount(&self, state: &WorldState, faction_id: &str) -> f64 {
        self.get(faction_id).map_or(0.0, |faction| {
            faction.merchant_discount(state.reputation(faction_id))
        })
    }

    /// Encounter bias for the player's current standing; zero for unknown factions.
    #[must_use]
    pub fn encounter_bias(&self, state: &WorldState, faction_id: &str) -> EncounterBias {
        self.get(faction_id).map_or(
            EncounterBias {
                ambush_chance: 0.0,
                backup_chance: 0.0,
            },
            |faction| faction.encounter_bias(state.reputation(faction_id)),
        )
    }

    /// Roll for a patrol of the faction controlling `region_id`.
    ///
    /// Draws once only when the controlling faction has a patrol chance.
    pub fn roll_patrol<R>(
        &self,
        state: &WorldState,
        region_id: &str,
        rng: &mut R,
    ) -> Option<PatrolSighting>
    where
        R: Rng + ?Sized,
    {
        let faction = self.get(state.faction_control(region_id)?)?;
        let chance = faction.patrol_chance.filter(|chance| *chance > 0.0)?;
        if rng.r#gen::<f64>() < chance {
            log::debug!("{} patrol sighted in {region_id}", faction.id);
            Some(PatrolSighting {
                faction: faction.id.clone(),
                message: format!("{} patrol spotted in the area.", faction.name),
            })
        } else {
            None
        }
    }
}
