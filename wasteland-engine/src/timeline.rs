//! Timeline instability: distortion odds and echo events.
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::{
    DISTORTION_ANOMALY_FACTOR, DISTORTION_GLOBAL_FACTOR, DISTORTION_MYSTERIOUS_BONUS,
    DISTORTION_UNSTABLE_BONUS,
};
use crate::events::{Notification, NotificationKind};
use crate::numbers::clamp01;
use crate::region::{Personality, Region};
use crate::state::WorldState;

/// Kind of replayed moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoKind {
    EchoGhost,
    TimeLoop,
    WeatherFlicker,
}

impl EchoKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EchoGhost => "echo_ghost",
            Self::TimeLoop => "time_loop",
            Self::WeatherFlicker => "weather_flicker",
        }
    }
}

/// A replayed moment from another timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEcho {
    pub kind: EchoKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum EchoTemplate {
    GhostNpc,
    LoopEvent,
    WeatherFlicker,
}

const ECHO_TEMPLATES: [EchoTemplate; 3] = [
    EchoTemplate::GhostNpc,
    EchoTemplate::LoopEvent,
    EchoTemplate::WeatherFlicker,
];

impl EchoTemplate {
    fn generate(self, region: &Region) -> TimelineEcho {
        match self {
            Self::GhostNpc => TimelineEcho {
                kind: EchoKind::EchoGhost,
                description: format!(
                    "A ghostly figure repeats a moment from another timeline in {}.",
                    region.name
                ),
                reward: Some("echo_shard".to_string()),
                effect: None,
            },
            Self::LoopEvent => TimelineEcho {
                kind: EchoKind::TimeLoop,
                description: format!(
                    "A moment repeats itself in {}. You feel deja vu.",
                    region.name
                ),
                reward: None,
                effect: Some("repeat_next_encounter".to_string()),
            },
            Self::WeatherFlicker => TimelineEcho {
                kind: EchoKind::WeatherFlicker,
                description: "The sky flickers between states. Time is unstable here.".to_string(),
                reward: None,
                effect: Some("weather_glitch".to_string()),
            },
        }
    }
}

/// Probability that an echo replaces the next encounter in `region`.
///
/// Pure: never marks the region unstable.
#[must_use]
pub fn distortion_chance(state: &WorldState, region: &Region) -> f64 {
    let personality_bonus = match region.personality {
        Personality::Unstable => DISTORTION_UNSTABLE_BONUS,
        Personality::Mysterious => DISTORTION_MYSTERIOUS_BONUS,
        _ => 0.0,
    };
    clamp01(
        state.global_instability() * DISTORTION_GLOBAL_FACTOR
            + state.anomaly_level(&region.id) * DISTORTION_ANOMALY_FACTOR
            + personality_bonus,
    )
}

/// Uniformly pick one echo template and publish a `timeline_event`.
pub fn roll_echo<R>(state: &mut WorldState, region: &Region, rng: &mut R) -> TimelineEcho
where
    R: Rng + ?Sized,
{
    let template = ECHO_TEMPLATES[rng.gen_range(0..ECHO_TEMPLATES.len())];
    let echo = template.generate(region);
    log::debug!("timeline echo {} in {}", echo.kind.as_str(), region.id);
    state.publish(Notification::new(
        NotificationKind::TimelineEvent,
        json!({ "id": echo.kind.as_str() }),
    ));
    echo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionCatalog;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rand::rngs::mock::StepRng;
    use std::collections::HashSet;

    #[test]
    fn distortion_combines_instability_anomaly_and_personality() {
        let regions = RegionCatalog::default_catalog();
        let basin = regions.get("fizzco_basin").unwrap();
        let mojave = regions.get("mojave_core").unwrap();
        let sprawl = regions.get("circuit_sprawl").unwrap();
        let mut state = WorldState::default();
        state.set_global_instability(0.5);
        state.set_anomaly_level("fizzco_basin", 0.4);
        assert!((distortion_chance(&state, basin) - (0.2 + 0.16 + 0.2)).abs() < 1e-9);
        assert!((distortion_chance(&state, mojave) - 0.2).abs() < 1e-9);
        assert!((distortion_chance(&state, sprawl) - 0.3).abs() < 1e-9);

        state.set_global_instability(1.0);
        state.set_anomaly_level("fizzco_basin", 1.0);
        assert!((distortion_chance(&state, basin) - 1.0).abs() < f64::EPSILON);
        assert!(!state.is_region_unstable("fizzco_basin"));
    }

    #[test]
    fn echoes_cover_all_templates_and_notify() {
        let regions = RegionCatalog::default_catalog();
        let rift = regions.get("hollow_choir_rift").unwrap();
        let mut state = WorldState::default();
        let mut rng = SmallRng::seed_from_u64(5);
        let kinds: HashSet<_> = (0..200)
            .map(|_| roll_echo(&mut state, rift, &mut rng).kind)
            .collect();
        assert_eq!(kinds.len(), 3);
        assert_eq!(state.take_notifications().len(), 200);
    }

    #[test]
    fn lowest_roll_yields_ghost_echo() {
        let regions = RegionCatalog::default_catalog();
        let rift = regions.get("hollow_choir_rift").unwrap();
        let mut state = WorldState::default();
        let echo = roll_echo(&mut state, rift, &mut StepRng::new(0, 0));
        assert_eq!(echo.kind, EchoKind::EchoGhost);
        assert_eq!(echo.reward.as_deref(), Some("echo_shard"));
        assert!(echo.description.contains("Hollow Choir Rift"));
    }
}
