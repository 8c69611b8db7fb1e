//! Anomaly events gated by a region's anomaly level.
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::{
    ANOMALY_STORM_INSTABILITY_STEP, ANOMALY_STORM_MAX_INTENSITY, ANOMALY_STORM_THRESHOLD,
    DISTORTION_FIELD_THRESHOLD, ENEMY_LEVEL_SCALE, GLITCH_BEAST_LEVEL_BONUS, GLITCH_MOB_THRESHOLD,
    STATIC_WALKER_LEVEL_BONUS,
};
use crate::events::{Notification, NotificationKind};
use crate::faction::FactionCatalog;
use crate::loot::{distinct_traits, generate_loot};
use crate::npc::spawn_group;
use crate::numbers::round_f64_to_u32;
use crate::region::{EncounterKind, EnemySpawn, Region};
use crate::result::{AmbientEncounter, CombatEncounter, CombatModifier, EncounterResult};
use crate::state::WorldState;
use crate::timeline::{EchoKind, TimelineEcho};

const AMBIENT_ANOMALY: &str = "A faint hum vibrates through the air. Something feels off.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    GlitchMob,
    DistortionField,
    AnomalyStorm,
    EchoGhost,
}

impl AnomalyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GlitchMob => "glitch_mob",
            Self::DistortionField => "distortion_field",
            Self::AnomalyStorm => "anomaly_storm",
            Self::EchoGhost => "echo_ghost",
        }
    }
}

/// Lingering distortion or energy storm in a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyField {
    pub id: AnomalyKind,
    pub effect: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    pub region_id: String,
}

/// Candidate anomalies for `region`, in fixed order.
#[must_use]
pub fn anomaly_pool(state: &WorldState, region: &Region) -> Vec<AnomalyKind> {
    let level = state.anomaly_level(&region.id);
    let mut pool = Vec::with_capacity(4);
    if level > GLITCH_MOB_THRESHOLD {
        pool.push(AnomalyKind::GlitchMob);
    }
    if level > DISTORTION_FIELD_THRESHOLD {
        pool.push(AnomalyKind::DistortionField);
    }
    if level > ANOMALY_STORM_THRESHOLD {
        pool.push(AnomalyKind::AnomalyStorm);
    }
    if state.is_region_unstable(&region.id) {
        pool.push(AnomalyKind::EchoGhost);
    }
    pool
}

fn glitch_mob<R>(
    state: &WorldState,
    region: &Region,
    factions: &FactionCatalog,
    rng: &mut R,
) -> EncounterResult
where
    R: Rng + ?Sized,
{
    let base = round_f64_to_u32(region.threat * ENEMY_LEVEL_SCALE);
    let spawns = [
        EnemySpawn {
            id: "glitch_beast".to_string(),
            level: base + GLITCH_BEAST_LEVEL_BONUS,
        },
        EnemySpawn {
            id: "static_walker".to_string(),
            level: base + STATIC_WALKER_LEVEL_BONUS,
        },
    ];
    let enemies = spawn_group(
        &spawns,
        state.anomaly_level(&region.id),
        state.weather(),
        rng,
    );
    let loot = generate_loot(state, region, factions, &distinct_traits(&enemies), rng);
    EncounterResult::Combat(CombatEncounter {
        enemies,
        loot,
        modifier: Some(CombatModifier::GlitchMob),
        source: Some(EncounterKind::Anomaly),
        description: Some(
            "Reality flickers. Glitch-touched creatures phase into view.".to_string(),
        ),
    })
}

fn anomaly_storm<R>(state: &mut WorldState, region: &Region, rng: &mut R) -> EncounterResult
where
    R: Rng + ?Sized,
{
    let intensity = rng.gen_range(1..=ANOMALY_STORM_MAX_INTENSITY);
    state.mark_region_unstable(&region.id);
    state.set_global_instability(
        state.global_instability() + ANOMALY_STORM_INSTABILITY_STEP * f64::from(intensity),
    );
    EncounterResult::AnomalyField(AnomalyField {
        id: AnomalyKind::AnomalyStorm,
        effect: "instability_surge".to_string(),
        description: "A surge of unstable energy erupts across the region.".to_string(),
        intensity: Some(intensity),
        region_id: region.id.clone(),
    })
}

/// Roll one anomaly for `region`.
///
/// An empty pool yields the ambient hum, never [`EncounterResult::None`].
pub fn roll_anomaly<R>(
    state: &mut WorldState,
    region: &Region,
    factions: &FactionCatalog,
    rng: &mut R,
) -> EncounterResult
where
    R: Rng + ?Sized,
{
    let pool = anomaly_pool(state, region);
    if pool.is_empty() {
        return EncounterResult::Ambient(AmbientEncounter {
            description: AMBIENT_ANOMALY.to_string(),
            anomaly: true,
        });
    }

    let kind = pool[rng.gen_range(0..pool.len())];
    log::debug!("anomaly {} in {}", kind.as_str(), region.id);
    let result = match kind {
        AnomalyKind::GlitchMob => glitch_mob(state, region, factions, rng),
        AnomalyKind::DistortionField => EncounterResult::AnomalyField(AnomalyField {
            id: AnomalyKind::DistortionField,
            effect: "distortion".to_string(),
            description: "A shimmering distortion bends the air. Time feels wrong here."
                .to_string(),
            intensity: None,
            region_id: region.id.clone(),
        }),
        AnomalyKind::AnomalyStorm => anomaly_storm(state, region, rng),
        AnomalyKind::EchoGhost => EncounterResult::TimelineEcho(TimelineEcho {
            kind: EchoKind::EchoGhost,
            description: "A ghostly figure repeats a moment from another timeline.".to_string(),
            reward: Some("echo_shard".to_string()),
            effect: None,
        }),
    };
    state.publish(Notification::new(
        NotificationKind::AnomalyEvent,
        json!({ "id": kind.as_str(), "region_id": region.id }),
    ));
    result
}
