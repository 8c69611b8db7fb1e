//! Discriminated encounter results returned to the host.
use serde::{Deserialize, Serialize};

use crate::anomaly::AnomalyField;
use crate::boss::{BossAbsence, BossDescriptor};
use crate::merchants::MerchantEncounter;
use crate::microquest::Microquest;
use crate::npc::Npc;
use crate::region::{EncounterKind, RegionEvent, Traveler};
use crate::timeline::TimelineEcho;

/// Why a fight broke out outside the region's ordinary encounter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatModifier {
    HostileFaction,
    GlitchMob,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEncounter {
    pub enemies: Vec<Npc>,
    pub loot: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<CombatModifier>,
    /// Encounter family that produced the fight, when drawn from a table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EncounterKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Non-mechanical flavor text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientEncounter {
    pub description: String,
    /// Set for the anomaly engine's fallback hum.
    #[serde(default)]
    pub anomaly: bool,
}

/// Friendly patrol of an allied faction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllyPatrol {
    pub faction: String,
    pub message: String,
    pub backup_chance: f64,
}

/// Exactly one outcome of an encounter roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncounterResult {
    None,
    Ambient(AmbientEncounter),
    Combat(CombatEncounter),
    Merchant(MerchantEncounter),
    Traveler(Traveler),
    AllyPatrol(AllyPatrol),
    Microquest(Microquest),
    AnomalyField(AnomalyField),
    TimelineEcho(TimelineEcho),
    Boss(BossDescriptor),
    BossAbsent(BossAbsence),
    Event(RegionEvent),
}

impl EncounterResult {
    /// Stable tag matching the serialized `type` field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ambient(_) => "ambient",
            Self::Combat(_) => "combat",
            Self::Merchant(_) => "merchant",
            Self::Traveler(_) => "traveler",
            Self::AllyPatrol(_) => "ally_patrol",
            Self::Microquest(_) => "microquest",
            Self::AnomalyField(_) => "anomaly_field",
            Self::TimelineEcho(_) => "timeline_echo",
            Self::Boss(_) => "boss",
            Self::BossAbsent(_) => "boss_absent",
            Self::Event(_) => "event",
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Loot carried by the result, if any.
    #[must_use]
    pub fn loot(&self) -> &[String] {
        match self {
            Self::Combat(combat) => &combat.loot,
            _ => &[],
        }
    }
}
