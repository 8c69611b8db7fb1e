//! Boss availability: cooldown after a defeat and weather-boosted rolls.
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::{
    BOSS_RAD_STORM_LEVEL_BOOST, BOSS_RESPAWN_BASE_MS, BOSS_RESPAWN_VARIANCE_MS,
    BOSS_STORM_LEVEL_BOOST,
};
use crate::events::{Notification, NotificationKind};
use crate::numbers::{f64_to_u64, u64_to_f64};
use crate::region::{Location, LocationKind};
use crate::result::EncounterResult;
use crate::state::{BossRecord, WorldState};
use crate::weather::WeatherKind;

const BOSS_ABSENT_MESSAGE: &str = "The boss has been slain recently. Only echoes remain.";

/// Availability of a region's boss at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossStatus {
    pub alive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respawn_at: Option<u64>,
}

/// Live boss ready to fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossDescriptor {
    pub id: String,
    pub name: String,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,
    pub region_id: String,
}

/// Explicit result for a boss location whose boss is on cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossAbsence {
    pub location_id: String,
    pub region_id: String,
    pub respawn_at: u64,
    pub description: String,
}

/// Alive iff there is no record or `now` has reached `respawn_at`.
#[must_use]
pub fn boss_status(state: &WorldState, region_id: &str, now: u64) -> BossStatus {
    state
        .boss_record(region_id)
        .map_or(
            BossStatus {
                alive: true,
                respawn_at: None,
            },
            |record| BossStatus {
                alive: now >= record.respawn_at,
                respawn_at: Some(record.respawn_at),
            },
        )
}

/// Put the location's boss on cooldown and publish `boss_defeated`.
pub fn defeat_boss<R>(state: &mut WorldState, location: &Location, now: u64, rng: &mut R) -> BossRecord
where
    R: Rng + ?Sized,
{
    let variance = f64_to_u64(rng.r#gen::<f64>() * u64_to_f64(BOSS_RESPAWN_VARIANCE_MS));
    let respawn_at = now
        .saturating_add(BOSS_RESPAWN_BASE_MS)
        .saturating_add(variance);
    state.record_boss_defeat(&location.region_id, now, respawn_at);
    let record = state
        .boss_record(&location.region_id)
        .copied()
        .unwrap_or(BossRecord {
            defeated_at: now,
            respawn_at,
            kills: 1,
        });
    log::debug!(
        "boss at {} defeated ({} kills), respawns at {}",
        location.id,
        record.kills,
        record.respawn_at
    );
    state.publish(Notification::new(
        NotificationKind::BossDefeated,
        json!({
            "location_id": location.id,
            "region_id": location.region_id,
            "respawn_at": record.respawn_at,
            "kills": record.kills,
        }),
    ));
    record
}

/// Level boost from the current sky.
#[must_use]
pub const fn weather_level_boost(kind: Option<WeatherKind>) -> u32 {
    match kind {
        Some(WeatherKind::Storm) => BOSS_STORM_LEVEL_BOOST,
        Some(WeatherKind::RadStorm) => BOSS_RAD_STORM_LEVEL_BOOST,
        _ => 0,
    }
}

/// Boss result for a boss location, `None` for any other location kind.
///
/// A boss on cooldown yields [`EncounterResult::BossAbsent`], never a fall-through.
#[must_use]
pub fn roll_boss_encounter(
    state: &WorldState,
    location: &Location,
    now: u64,
) -> Option<EncounterResult> {
    if location.kind != LocationKind::Boss {
        return None;
    }
    let status = boss_status(state, &location.region_id, now);
    if !status.alive {
        return Some(EncounterResult::BossAbsent(BossAbsence {
            location_id: location.id.clone(),
            region_id: location.region_id.clone(),
            respawn_at: status.respawn_at.unwrap_or(now),
            description: BOSS_ABSENT_MESSAGE.to_string(),
        }));
    }
    let boost = weather_level_boost(state.weather().map(|w| w.kind));
    Some(EncounterResult::Boss(BossDescriptor {
        id: location.id.clone(),
        name: location.name.clone(),
        level: location.level.saturating_add(boost),
        faction: location.faction.clone(),
        region_id: location.region_id.clone(),
    }))
}
