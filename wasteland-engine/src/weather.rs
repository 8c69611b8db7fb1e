//! Weather system: weighted weather rolls per region.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{WEATHER_ANOMALY_THRESHOLD, WEATHER_REGION_BIAS, WEATHER_TIMELINE_BONUS};
use crate::faction::FactionCatalog;
use crate::region::Region;
use crate::state::WorldState;
use crate::weighted::WeightTable;

/// Weather conditions a region can roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherKind {
    #[default]
    Clear,
    Cloudy,
    Storm,
    RadStorm,
    Heatwave,
    ColdSnap,
    Whiteout,
    AnomalySurge,
    DistortionFog,
    StaticHaze,
    GammaLightning,
    EmpStorm,
    RitualFog,
    ChemicalSmog,
}

impl WeatherKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Storm => "storm",
            Self::RadStorm => "rad_storm",
            Self::Heatwave => "heatwave",
            Self::ColdSnap => "cold_snap",
            Self::Whiteout => "whiteout",
            Self::AnomalySurge => "anomaly_surge",
            Self::DistortionFog => "distortion_fog",
            Self::StaticHaze => "static_haze",
            Self::GammaLightning => "gamma_lightning",
            Self::EmpStorm => "emp_storm",
            Self::RitualFog => "ritual_fog",
            Self::ChemicalSmog => "chemical_smog",
        }
    }

    /// Storm-type skies: ordinary, radioactive, and EMP storms.
    #[must_use]
    pub const fn is_storm(self) -> bool {
        matches!(self, Self::Storm | Self::RadStorm | Self::EmpStorm)
    }
}

const BASE_WEATHER: [(WeatherKind, f64); 6] = [
    (WeatherKind::Clear, 1.0),
    (WeatherKind::Cloudy, 1.0),
    (WeatherKind::Storm, 0.5),
    (WeatherKind::RadStorm, 0.1),
    (WeatherKind::Heatwave, 0.3),
    (WeatherKind::ColdSnap, 0.3),
];

const ANOMALY_WEATHER: [(WeatherKind, f64); 4] = [
    (WeatherKind::AnomalySurge, 0.4),
    (WeatherKind::DistortionFog, 0.3),
    (WeatherKind::StaticHaze, 0.2),
    (WeatherKind::GammaLightning, 0.1),
];

/// Weather installed on the world state. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub kind: WeatherKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    pub region_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction_id: Option<String>,
    /// Anomaly level of the region when the weather was rolled.
    #[serde(default)]
    pub anomaly: f64,
    /// Millisecond timestamp supplied by the caller.
    pub timestamp: u64,
}

/// Build the weight table for one weather roll in `region`.
#[must_use]
pub fn weather_table(
    state: &WorldState,
    region: &Region,
    factions: &FactionCatalog,
) -> WeightTable<WeatherKind> {
    let mut table = WeightTable::from_pairs(BASE_WEATHER);

    if let Some(bias) = region.weather_bias {
        table.add(bias, WEATHER_REGION_BIAS);
    }

    let anomaly = state.anomaly_level(&region.id);
    if anomaly > WEATHER_ANOMALY_THRESHOLD {
        for (kind, weight) in ANOMALY_WEATHER {
            table.add(kind, weight * anomaly);
        }
    }

    if let Some(faction) = state
        .faction_control(&region.id)
        .and_then(|id| factions.get(id))
    {
        for (kind, weight) in faction.weather_influence.iter() {
            table.add(*kind, weight);
        }
    }

    if state.is_region_unstable(&region.id) {
        table.add(WeatherKind::DistortionFog, WEATHER_TIMELINE_BONUS);
        table.add(WeatherKind::StaticHaze, WEATHER_TIMELINE_BONUS);
    }

    log::trace!("weather table for {}: {:?}", region.id, table);
    table
}

/// Roll fresh weather for `region` without installing it.
pub fn roll_weather<R>(
    state: &WorldState,
    region: &Region,
    factions: &FactionCatalog,
    now: u64,
    rng: &mut R,
) -> Weather
where
    R: Rng + ?Sized,
{
    let table = weather_table(state, region, factions);
    let kind = table.pick(rng).unwrap_or_default();
    log::debug!("weather in {} rolled {}", region.id, kind.as_str());
    Weather {
        kind,
        intensity: None,
        region_id: region.id.clone(),
        faction_id: state.faction_control(&region.id).map(str::to_string),
        anomaly: state.anomaly_level(&region.id),
        timestamp: now,
    }
}

/// Roll weather for `region` and install it, replacing the previous value.
pub fn update_weather<R>(
    state: &mut WorldState,
    region: &Region,
    factions: &FactionCatalog,
    now: u64,
    rng: &mut R,
) -> Weather
where
    R: Rng + ?Sized,
{
    let weather = roll_weather(state, region, factions, now, rng);
    state.set_weather(weather.clone());
    weather
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalogs;
    use crate::events::NotificationKind;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rand::rngs::mock::StepRng;

    fn fixtures() -> (Catalogs, WorldState) {
        let catalogs = Catalogs::default_catalogs();
        let state = WorldState::seeded(&catalogs.regions, &catalogs.factions);
        (catalogs, state)
    }

    #[test]
    fn base_table_matches_calm_region() {
        let (catalogs, mut state) = fixtures();
        state.clear_faction_control("mojave_core");
        let region = catalogs.regions.get("mojave_core").unwrap();
        let table = weather_table(&state, region, &catalogs.factions);
        assert_eq!(table.len(), 6);
        assert!((table.total() - 3.2).abs() < 1e-9);
    }

    #[test]
    fn anomaly_faction_and_timeline_layers_accumulate() {
        let (catalogs, mut state) = fixtures();
        let region = catalogs.regions.get("circuit_sprawl").unwrap();
        state.set_anomaly_level("circuit_sprawl", 0.5);
        state.set_faction_control("circuit_sprawl", "the_circuit");
        state.mark_region_unstable("circuit_sprawl");
        let table = weather_table(&state, region, &catalogs.factions);

        let haze = table.get(&WeatherKind::StaticHaze).unwrap();
        assert!((haze - (0.2 * 0.5 + 0.3 + 0.5)).abs() < 1e-9);
        let fog = table.get(&WeatherKind::DistortionFog).unwrap();
        assert!((fog - (0.3 * 0.5 + 0.5)).abs() < 1e-9);
        assert!(table.get(&WeatherKind::EmpStorm).is_some());
    }

    #[test]
    fn anomaly_weather_needs_level_above_threshold() {
        let (catalogs, mut state) = fixtures();
        let region = catalogs.regions.get("circuit_sprawl").unwrap();
        state.set_anomaly_level("circuit_sprawl", 0.3);
        state.clear_faction_control("circuit_sprawl");
        let table = weather_table(&state, region, &catalogs.factions);
        assert!(table.get(&WeatherKind::AnomalySurge).is_none());
    }

    #[test]
    fn region_bias_adds_weight() {
        let (catalogs, state) = fixtures();
        let region = catalogs.regions.get("deepwatch_frontier").unwrap();
        let table = weather_table(&state, region, &catalogs.factions);
        let whiteout = table.get(&WeatherKind::Whiteout).unwrap();
        assert!((whiteout - WEATHER_REGION_BIAS).abs() < f64::EPSILON);
    }

    #[test]
    fn update_replaces_weather_and_notifies() {
        let (catalogs, mut state) = fixtures();
        let region = catalogs.regions.get("mojave_core").unwrap();
        let mut low = StepRng::new(0, 0);
        let first = update_weather(&mut state, region, &catalogs.factions, 10, &mut low);
        assert_eq!(first.kind, WeatherKind::Clear);
        let mut rng = SmallRng::seed_from_u64(9);
        let second = update_weather(&mut state, region, &catalogs.factions, 20, &mut rng);
        assert_eq!(state.weather(), Some(&second));
        assert_eq!(state.weather().map(|w| w.timestamp), Some(20));
        let kinds: Vec<_> = state.take_notifications().into_iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::WeatherChange; 2]);
    }
}
