mod common;

use common::{ScriptedRng, catalogs, state_in};
use rand::rngs::mock::StepRng;
use wasteland_engine::{
    CombatModifier, EncounterKind, EncounterOrchestrator, EncounterResult, NotificationKind,
};

#[test]
fn echo_preempts_every_lower_branch() {
    let catalogs = catalogs();
    let orchestrator = EncounterOrchestrator::new(&catalogs);
    for region in catalogs.regions.iter() {
        let mut state = state_in(&catalogs, &region.id);
        state.mark_region_unstable(&region.id);
        state.set_global_instability(0.5);
        // Conditions that would also satisfy branches 2 through 5.
        state.set_anomaly_level(&region.id, 1.0);
        if let Some(faction) = state.faction_control(&region.id).map(str::to_string) {
            state.set_reputation(&faction, -200);
        }
        state.take_notifications();
        let result = orchestrator.roll_encounter(&mut state, &mut StepRng::new(0, 0));
        assert!(
            matches!(result, EncounterResult::TimelineEcho(_)),
            "{}: expected echo, got {}",
            region.id,
            result.kind()
        );
        let kinds: Vec<_> = state.take_notifications().iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::TimelineEvent, NotificationKind::Encounter]
        );
    }
}

#[test]
fn anomaly_preempts_quests_and_reputation() {
    let catalogs = catalogs();
    let orchestrator = EncounterOrchestrator::new(&catalogs);
    let mut state = state_in(&catalogs, "fizzco_basin");
    state.set_reputation("fizzco_remnants", -200);
    let result = orchestrator.roll_encounter(&mut state, &mut StepRng::new(0, 0));
    assert!(matches!(
        result,
        EncounterResult::Combat(ref combat) if combat.modifier == Some(CombatModifier::GlitchMob)
    ));
}

#[test]
fn mojave_midpoint_draws_from_encounter_table() {
    let catalogs = catalogs();
    let orchestrator = EncounterOrchestrator::new(&catalogs);
    let mut state = state_in(&catalogs, "mojave_core");
    let result = orchestrator.roll_encounter(&mut state, &mut StepRng::new(1 << 63, 0));
    let EncounterResult::Combat(combat) = result else {
        panic!("expected combat, got {result:?}");
    };
    // 0.5 lies past raiders' [0, 0.4) slice, inside wildlife's [0.4, 0.7).
    assert_eq!(combat.source, Some(EncounterKind::Wildlife));
    assert!(combat.modifier.is_none());
    assert_eq!(combat.enemies.len(), 2);
    assert!(!combat.loot.is_empty());
}

#[test]
fn mojave_low_table_roll_lands_in_raiders() {
    let catalogs = catalogs();
    let orchestrator = EncounterOrchestrator::new(&catalogs);
    let mut state = state_in(&catalogs, "mojave_core");
    // Quest gate, then the table draw.
    let mut rng = ScriptedRng::new(&[0.5, 0.2]);
    let result = orchestrator.roll_encounter(&mut state, &mut rng);
    let EncounterResult::Combat(combat) = result else {
        panic!("expected combat, got {result:?}");
    };
    assert_eq!(combat.source, Some(EncounterKind::Raiders));
    assert_eq!(combat.enemies[0].id, "raider_gunman");
    assert_eq!(combat.enemies[0].base_level, 4);
    assert!(!combat.loot.is_empty());
}

#[test]
fn table_tail_reaches_merchants() {
    let catalogs = catalogs();
    let orchestrator = EncounterOrchestrator::new(&catalogs);
    let mut state = state_in(&catalogs, "mojave_core");
    let mut rng = ScriptedRng::new(&[0.5, 0.99]);
    let result = orchestrator.roll_encounter(&mut state, &mut rng);
    let EncounterResult::Merchant(merchant) = result else {
        panic!("expected merchant, got {result:?}");
    };
    assert_eq!(merchant.faction.as_deref(), Some("dustwalkers"));
    assert_eq!(merchant.greeting, "Got scrap? Got caps? Let's deal.");
    assert!(!merchant.inventory.is_empty());
}

#[test]
fn neutral_standing_skips_reputation_gates() {
    let catalogs = catalogs();
    let orchestrator = EncounterOrchestrator::new(&catalogs);
    let mut state = state_in(&catalogs, "mojave_core");
    // Hostile and ally gates would consume a roll; at neutral they must not.
    let mut rng = ScriptedRng::new(&[0.5, 0.9]);
    let result = orchestrator.roll_encounter(&mut state, &mut rng);
    assert!(matches!(result, EncounterResult::Traveler(_)));
}
