//! Encounter orchestration: fixed-priority branch selection per tick.
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::anomaly::roll_anomaly;
use crate::boss::roll_boss_encounter;
use crate::catalog::Catalogs;
use crate::constants::{
    ALLY_PATROL_CHANCE, AMBIENT_CHANCE, ANOMALY_BRANCH_FACTOR, ANOMALY_BRANCH_THRESHOLD,
    HOSTILE_AMBUSH_FACTOR,
};
use crate::events::{Notification, NotificationKind};
use crate::faction::{Faction, FactionCatalog, PatrolSighting, ReputationTier};
use crate::loot::{distinct_traits, generate_loot};
use crate::merchants::roll_merchant;
use crate::microquest;
use crate::npc::spawn_group;
use crate::region::{
    EncounterKind, EnemySpawn, Location, Region, RegionCatalog, pick_enemies, pick_region_event,
    pick_traveler,
};
use crate::result::{AllyPatrol, AmbientEncounter, CombatEncounter, CombatModifier, EncounterResult};
use crate::state::WorldState;
use crate::timeline::{distortion_chance, roll_echo};
use crate::weather::{Weather, update_weather};

const UNKNOWN_FACTION: &str = "unknown faction";

/// What changed when the player walked into a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntry {
    pub region_id: String,
    pub weather: Weather,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patrol: Option<PatrolSighting>,
}

fn ambient_line(idx: usize, region: &str, faction: &str) -> String {
    match idx {
        0 => format!("You notice fresh tracks and markings left by {faction} in {region}."),
        1 => format!("{region} carries distant echoes of {faction} activity."),
        2 => format!("Discarded gear bearing {faction} colors lies half-buried in {region}."),
        _ => format!("A makeshift cairn marked with {faction} sigils watches over this part of {region}."),
    }
}

const AMBIENT_LINE_COUNT: usize = 4;

/// Single entry point deciding what the player meets on a tick.
///
/// Holds only read-only catalogs; all mutable context comes in through
/// [`WorldState`], so one orchestrator can serve many sessions.
#[derive(Debug, Clone, Copy)]
pub struct EncounterOrchestrator<'a> {
    regions: &'a RegionCatalog,
    factions: &'a FactionCatalog,
}

impl<'a> EncounterOrchestrator<'a> {
    #[must_use]
    pub const fn new(catalogs: &'a Catalogs) -> Self {
        Self {
            regions: &catalogs.regions,
            factions: &catalogs.factions,
        }
    }

    fn controlling_faction(&self, state: &WorldState, region: &Region) -> Option<&'a Faction> {
        state
            .faction_control(&region.id)
            .and_then(|id| self.factions.get(id))
    }

    /// Roll one encounter for the current region.
    ///
    /// Branches are tried in priority order and the first match wins. Each
    /// gate draws at most once, and only when its precondition already holds.
    /// An unset or unknown current region yields [`EncounterResult::None`].
    pub fn roll_encounter<R>(&self, state: &mut WorldState, rng: &mut R) -> EncounterResult
    where
        R: Rng + ?Sized,
    {
        let Some(region) = state.current_region().and_then(|id| self.regions.get(id)) else {
            log::debug!("no encounter: current region unset or unknown");
            return EncounterResult::None;
        };
        let result = self.decide(state, region, rng);
        log::debug!("encounter in {}: {}", region.id, result.kind());
        if !result.is_none() {
            state.publish(Notification::new(
                NotificationKind::Encounter,
                json!({ "type": result.kind(), "region_id": region.id }),
            ));
        }
        result
    }

    fn decide<R>(&self, state: &mut WorldState, region: &Region, rng: &mut R) -> EncounterResult
    where
        R: Rng + ?Sized,
    {
        if state.is_region_unstable(&region.id)
            && rng.r#gen::<f64>() < distortion_chance(state, region)
        {
            return EncounterResult::TimelineEcho(roll_echo(state, region, rng));
        }

        let anomaly_level = state.anomaly_level(&region.id);
        if anomaly_level > ANOMALY_BRANCH_THRESHOLD
            && rng.r#gen::<f64>() < anomaly_level * ANOMALY_BRANCH_FACTOR
        {
            return roll_anomaly(state, region, self.factions, rng);
        }

        if rng.r#gen::<f64>() < region.quest_chance {
            return EncounterResult::Microquest(microquest::generate(
                state,
                region,
                self.factions,
                rng,
            ));
        }

        let faction = self.controlling_faction(state, region);
        let tier = faction.map(|f| ReputationTier::from_score(state.reputation(&f.id)));

        if let Some(faction) = faction
            && tier == Some(ReputationTier::Hostile)
            && rng.r#gen::<f64>() < region.threat * HOSTILE_AMBUSH_FACTOR
        {
            return self.hostile_ambush(state, region, faction, rng);
        }

        if let Some(faction) = faction
            && tier == Some(ReputationTier::Ally)
            && rng.r#gen::<f64>() < ALLY_PATROL_CHANCE
        {
            return EncounterResult::AllyPatrol(AllyPatrol {
                faction: faction.id.clone(),
                message: format!("A {} patrol falls in beside you.", faction.name),
                backup_chance: self.factions.encounter_bias(state, &faction.id).backup_chance,
            });
        }

        if let Some(kind) = region.encounters.pick(rng) {
            return self.dispatch(state, region, kind, rng);
        }

        if rng.r#gen::<f64>() < AMBIENT_CHANCE {
            let faction_name = faction.map_or(UNKNOWN_FACTION, |f| f.name.as_str());
            let line = ambient_line(rng.gen_range(0..AMBIENT_LINE_COUNT), &region.name, faction_name);
            return EncounterResult::Ambient(AmbientEncounter {
                description: line,
                anomaly: false,
            });
        }

        EncounterResult::None
    }

    fn hostile_ambush<R>(
        &self,
        state: &WorldState,
        region: &Region,
        faction: &Faction,
        rng: &mut R,
    ) -> EncounterResult
    where
        R: Rng + ?Sized,
    {
        let base = region.enemy_level();
        let spawns = [
            EnemySpawn {
                id: format!("{}_enforcer", faction.id),
                level: base + 1,
            },
            EnemySpawn {
                id: format!("{}_soldier", faction.id),
                level: base,
            },
        ];
        let enemies = spawn_group(
            &spawns,
            state.anomaly_level(&region.id),
            state.weather(),
            rng,
        );
        let loot = generate_loot(state, region, self.factions, &distinct_traits(&enemies), rng);
        EncounterResult::Combat(CombatEncounter {
            enemies,
            loot,
            modifier: Some(CombatModifier::HostileFaction),
            source: None,
            description: Some(format!("{} fighters move to cut you off.", faction.name)),
        })
    }

    fn dispatch<R>(
        &self,
        state: &mut WorldState,
        region: &Region,
        kind: EncounterKind,
        rng: &mut R,
    ) -> EncounterResult
    where
        R: Rng + ?Sized,
    {
        match kind {
            EncounterKind::Raiders
            | EncounterKind::Mutants
            | EncounterKind::Scavengers
            | EncounterKind::Wildlife => {
                let enemies = spawn_group(
                    &pick_enemies(region, kind),
                    state.anomaly_level(&region.id),
                    state.weather(),
                    rng,
                );
                let loot =
                    generate_loot(state, region, self.factions, &distinct_traits(&enemies), rng);
                EncounterResult::Combat(CombatEncounter {
                    enemies,
                    loot,
                    modifier: None,
                    source: Some(kind),
                    description: None,
                })
            }
            EncounterKind::Travelers => EncounterResult::Traveler(pick_traveler(region)),
            EncounterKind::Merchant => {
                EncounterResult::Merchant(roll_merchant(state, region, self.factions, rng))
            }
            EncounterKind::Anomaly => roll_anomaly(state, region, self.factions, rng),
            EncounterKind::Event => EncounterResult::Event(pick_region_event(state, region)),
        }
    }

    /// Roll at a specific location. Boss locations are decided by boss
    /// availability alone and never fall through to the regular table.
    pub fn roll_at_location<R>(
        &self,
        state: &mut WorldState,
        location: &Location,
        now: u64,
        rng: &mut R,
    ) -> EncounterResult
    where
        R: Rng + ?Sized,
    {
        if let Some(result) = roll_boss_encounter(state, location, now) {
            log::debug!("boss location {}: {}", location.id, result.kind());
            state.publish(Notification::new(
                NotificationKind::Encounter,
                json!({ "type": result.kind(), "region_id": location.region_id }),
            ));
            return result;
        }
        self.roll_encounter(state, rng)
    }

    /// Move the player into `region_id`, roll fresh weather, and check for a patrol.
    ///
    /// Unknown regions leave the state untouched and return `None`.
    pub fn enter_region<R>(
        &self,
        state: &mut WorldState,
        region_id: &str,
        now: u64,
        rng: &mut R,
    ) -> Option<RegionEntry>
    where
        R: Rng + ?Sized,
    {
        let Some(region) = self.regions.get(region_id) else {
            log::warn!("ignoring entry into unknown region {region_id}");
            return None;
        };
        state.set_region(&region.id);
        let weather = update_weather(state, region, self.factions, now, rng);
        let patrol = self.factions.roll_patrol(state, &region.id, rng);
        Some(RegionEntry {
            region_id: region.id.clone(),
            weather,
            patrol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::LocationKind;
    use rand::rngs::SmallRng;
    use rand::rngs::mock::StepRng;
    use rand::{RngCore, SeedableRng};
    use std::collections::VecDeque;

    /// Replays scripted unit-interval rolls, then continues from a seeded stream.
    struct ScriptedRng {
        script: VecDeque<u64>,
        fallback: SmallRng,
    }

    impl ScriptedRng {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        fn new(rolls: &[f64]) -> Self {
            Self {
                script: rolls
                    .iter()
                    .map(|roll| ((roll * (1u64 << 53) as f64) as u64) << 11)
                    .collect(),
                fallback: SmallRng::seed_from_u64(0),
            }
        }
    }

    impl RngCore for ScriptedRng {
        #[allow(clippy::cast_possible_truncation)]
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.script
                .pop_front()
                .unwrap_or_else(|| self.fallback.next_u64())
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(8) {
                let bytes = self.next_u64().to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn setup(region: &str) -> (Catalogs, WorldState) {
        let catalogs = Catalogs::default_catalogs();
        let mut state = WorldState::seeded(&catalogs.regions, &catalogs.factions);
        state.set_region(region);
        state.take_notifications();
        (catalogs, state)
    }

    #[test]
    fn unknown_or_unset_region_yields_none() {
        let catalogs = Catalogs::default_catalogs();
        let orchestrator = EncounterOrchestrator::new(&catalogs);
        let mut state = WorldState::default();
        assert!(orchestrator.roll_encounter(&mut state, &mut StepRng::new(0, 0)).is_none());
        state.set_region("atlantis");
        assert!(orchestrator.roll_encounter(&mut state, &mut StepRng::new(0, 0)).is_none());
    }

    #[test]
    fn unstable_region_with_zero_roll_echoes() {
        let (catalogs, mut state) = setup("fizzco_basin");
        state.mark_region_unstable("fizzco_basin");
        let orchestrator = EncounterOrchestrator::new(&catalogs);
        let result = orchestrator.roll_encounter(&mut state, &mut StepRng::new(0, 0));
        assert!(matches!(result, EncounterResult::TimelineEcho(_)));
    }

    #[test]
    fn anomaly_branch_needs_level_above_threshold() {
        let (catalogs, mut state) = setup("hollow_choir_rift");
        state.set_anomaly_level("hollow_choir_rift", 0.9);
        let orchestrator = EncounterOrchestrator::new(&catalogs);
        let result = orchestrator.roll_encounter(&mut state, &mut StepRng::new(0, 0));
        assert!(matches!(
            result,
            EncounterResult::Combat(CombatEncounter {
                modifier: Some(CombatModifier::GlitchMob),
                ..
            })
        ));
    }

    #[test]
    fn quest_branch_fires_below_quest_chance() {
        let (catalogs, mut state) = setup("mojave_core");
        let orchestrator = EncounterOrchestrator::new(&catalogs);
        let result = orchestrator.roll_encounter(&mut state, &mut StepRng::new(0, 0));
        assert!(matches!(result, EncounterResult::Microquest(_)));
    }

    #[test]
    fn hostile_standing_triggers_ambush() {
        let (catalogs, mut state) = setup("mojave_core");
        state.set_reputation("dustwalkers", -150);
        let orchestrator = EncounterOrchestrator::new(&catalogs);
        // Past the 0.12 quest gate, under the 0.24 ambush gate.
        let mut rng = ScriptedRng::new(&[0.15, 0.15]);
        let result = orchestrator.roll_encounter(&mut state, &mut rng);
        let EncounterResult::Combat(combat) = result else {
            panic!("expected ambush, got {result:?}");
        };
        assert_eq!(combat.modifier, Some(CombatModifier::HostileFaction));
        assert_eq!(combat.enemies[0].id, "dustwalkers_enforcer");
        assert_eq!(combat.enemies[0].base_level, 5);
    }

    #[test]
    fn allied_standing_sends_patrol() {
        let (catalogs, mut state) = setup("mojave_core");
        state.set_reputation("dustwalkers", 120);
        let orchestrator = EncounterOrchestrator::new(&catalogs);
        let mut rng = StepRng::new(2_767_011_611_056_432_742, 0);
        let result = orchestrator.roll_encounter(&mut state, &mut rng);
        let EncounterResult::AllyPatrol(patrol) = result else {
            panic!("expected patrol, got {result:?}");
        };
        assert_eq!(patrol.faction, "dustwalkers");
        assert!(patrol.backup_chance > 0.1);
    }

    #[test]
    fn ambient_needs_an_empty_encounter_table() {
        let mut catalogs = Catalogs::default_catalogs();
        let mut regions: Vec<Region> = catalogs.regions.iter().cloned().collect();
        for region in &mut regions {
            region.encounters = crate::weighted::WeightTable::new();
            region.quest_chance = 0.0;
        }
        catalogs.regions = RegionCatalog::new(regions).unwrap();
        let mut state = WorldState::seeded(&catalogs.regions, &catalogs.factions);
        state.set_region("mojave_core");
        let orchestrator = EncounterOrchestrator::new(&catalogs);

        let result = orchestrator.roll_encounter(&mut state, &mut StepRng::new(0, 0));
        let EncounterResult::Ambient(ambient) = result else {
            panic!("expected ambient, got {result:?}");
        };
        assert!(ambient.description.contains("Dustwalkers"));
        assert!(ambient.description.contains("Mojave Core"));

        let quiet = orchestrator.roll_encounter(&mut state, &mut StepRng::new(1 << 63, 0));
        assert!(quiet.is_none());
    }

    #[test]
    fn encounters_publish_notification() {
        let (catalogs, mut state) = setup("scav_market_belt");
        let orchestrator = EncounterOrchestrator::new(&catalogs);
        let mut rng = SmallRng::seed_from_u64(3);
        let result = orchestrator.roll_encounter(&mut state, &mut rng);
        let notes = state.take_notifications();
        let last = notes.last().unwrap();
        assert_eq!(last.kind, NotificationKind::Encounter);
        assert_eq!(last.payload["type"], result.kind());
    }

    #[test]
    fn boss_locations_never_fall_through() {
        let (catalogs, mut state) = setup("brood_nest");
        let orchestrator = EncounterOrchestrator::new(&catalogs);
        let lair = Location {
            id: "brood_queen_lair".into(),
            name: "Brood Queen".into(),
            kind: LocationKind::Boss,
            level: 12,
            faction: Some("feral_broods".into()),
            region_id: "brood_nest".into(),
        };
        let mut rng = SmallRng::seed_from_u64(8);
        crate::boss::defeat_boss(&mut state, &lair, 0, &mut rng);
        for now in [0, 60_000, 29 * 60 * 1_000] {
            let result = orchestrator.roll_at_location(&mut state, &lair, now, &mut rng);
            assert!(matches!(result, EncounterResult::BossAbsent(_)));
        }
        let later = orchestrator.roll_at_location(&mut state, &lair, 46 * 60 * 1_000, &mut rng);
        assert!(matches!(later, EncounterResult::Boss(_)));

        let mut camp = lair.clone();
        camp.kind = LocationKind::Settlement;
        let regular = orchestrator.roll_at_location(&mut state, &camp, 0, &mut rng);
        assert!(!matches!(
            regular,
            EncounterResult::Boss(_) | EncounterResult::BossAbsent(_)
        ));
    }

    #[test]
    fn entering_a_region_rolls_weather_and_notifies() {
        let catalogs = Catalogs::default_catalogs();
        let mut state = WorldState::seeded(&catalogs.regions, &catalogs.factions);
        let orchestrator = EncounterOrchestrator::new(&catalogs);
        let entry = orchestrator
            .enter_region(&mut state, "deepwatch_frontier", 1_234, &mut StepRng::new(0, 0))
            .unwrap();
        assert_eq!(entry.region_id, "deepwatch_frontier");
        assert_eq!(entry.weather.timestamp, 1_234);
        assert_eq!(state.current_region(), Some("deepwatch_frontier"));
        assert_eq!(state.weather(), Some(&entry.weather));
        let kinds: Vec<_> = state.take_notifications().iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::Location, NotificationKind::WeatherChange]
        );

        assert!(
            orchestrator
                .enter_region(&mut state, "nowhere", 0, &mut StepRng::new(0, 0))
                .is_none()
        );
        assert_eq!(state.current_region(), Some("deepwatch_frontier"));
        assert!(state.pending_notifications().is_empty());
    }
}
