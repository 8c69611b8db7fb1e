use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use wasteland_engine::{
    Catalogs, EncounterResult, Location, LocationKind, WorldSession, WorldState,
};

const TICK_MS: u64 = 60_000;
const BOSS_VISIT_EVERY: u64 = 10;

/// Aggregated outcome of every seed run in one region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub region: String,
    pub seeds: Vec<u64>,
    pub ticks: u64,
    pub histogram: BTreeMap<String, usize>,
    pub boss_kills: u32,
    pub violations: Vec<String>,
    #[serde(skip)]
    pub duration: Duration,
}

impl RegionReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn total_encounters(&self) -> usize {
        self.histogram.values().sum()
    }
}

fn boss_location(region: &str) -> Location {
    Location {
        id: format!("{region}_boss"),
        name: format!("Warlord of {region}"),
        kind: LocationKind::Boss,
        level: 10,
        faction: None,
        region_id: region.to_string(),
    }
}

fn check_ranges(state: &WorldState, seed: u64, tick: u64, violations: &mut Vec<String>) {
    let instability = state.global_instability();
    if !(0.0..=1.0).contains(&instability) {
        violations.push(format!(
            "seed {seed} tick {tick}: global instability {instability} out of range"
        ));
    }
    for (region, level) in state.anomaly_levels() {
        if !(0.0..=1.0).contains(&level) {
            violations.push(format!(
                "seed {seed} tick {tick}: anomaly level {level} in {region} out of range"
            ));
        }
    }
}

fn check_loot(result: &EncounterResult, seed: u64, tick: u64, violations: &mut Vec<String>) {
    let loot = result.loot();
    let unique: HashSet<&String> = loot.iter().collect();
    if unique.len() != loot.len() {
        violations.push(format!("seed {seed} tick {tick}: duplicate loot {loot:?}"));
    }
}

fn run_seed(
    catalogs: &Arc<Catalogs>,
    region: &str,
    seed: u64,
    ticks: u64,
    report: &mut RegionReport,
    verbose: bool,
) {
    let mut session = WorldSession::new(Arc::clone(catalogs), seed);
    if session.enter_region(region, 0).is_none() {
        report
            .violations
            .push(format!("seed {seed}: region {region} could not be entered"));
        return;
    }
    let lair = boss_location(region);

    for tick in 0..ticks {
        let now = tick * TICK_MS;
        let result = session.tick(now);
        if verbose {
            println!("  [{region} seed {seed}] tick {tick}: {}", result.kind());
        }
        *report.histogram.entry(result.kind().to_string()).or_default() += 1;
        check_loot(&result, seed, tick, &mut report.violations);

        if tick % BOSS_VISIT_EVERY == 0 {
            match session.visit(&lair, now) {
                EncounterResult::Boss(_) => {
                    let record = session.defeat_boss(&lair, now);
                    report.boss_kills += 1;
                    if matches!(session.visit(&lair, now + 1), EncounterResult::Boss(_)) {
                        report.violations.push(format!(
                            "seed {seed} tick {tick}: boss alive before respawn at {}",
                            record.respawn_at
                        ));
                    }
                }
                EncounterResult::BossAbsent(absence) if absence.respawn_at <= now => {
                    report.violations.push(format!(
                        "seed {seed} tick {tick}: boss absent past respawn at {}",
                        absence.respawn_at
                    ));
                }
                _ => {}
            }
        }
        check_ranges(session.state(), seed, tick, &mut report.violations);
    }
    log::debug!(
        "{region} seed {seed}: {} draws over {ticks} ticks",
        session.rng().total_draws()
    );
}

/// Run every seed for `ticks` ticks in each region.
#[must_use]
pub fn run_sweep(
    catalogs: &Arc<Catalogs>,
    regions: &[String],
    seeds: &[u64],
    ticks: u64,
    verbose: bool,
) -> Vec<RegionReport> {
    regions
        .iter()
        .map(|region| {
            let start = Instant::now();
            let mut report = RegionReport {
                region: region.clone(),
                seeds: seeds.to_vec(),
                ticks,
                histogram: BTreeMap::new(),
                boss_kills: 0,
                violations: Vec::new(),
                duration: Duration::ZERO,
            };
            for &seed in seeds {
                run_seed(catalogs, region, seed, ticks, &mut report, verbose);
            }
            report.duration = start.elapsed();
            report
        })
        .collect()
}
