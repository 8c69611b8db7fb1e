//! One player's world: state, shared catalogs, RNG streams, and subscribers.
use std::sync::Arc;

use crate::boss::defeat_boss;
use crate::catalog::Catalogs;
use crate::encounters::{EncounterOrchestrator, RegionEntry};
use crate::events::{Dispatcher, Subscriber};
use crate::region::Location;
use crate::result::EncounterResult;
use crate::rng::RngBundle;
use crate::state::{BossRecord, WorldState};
use crate::weather::update_weather;

/// Session-confined simulation driver.
///
/// Every operation draws from its own RNG stream and flushes pending
/// notifications to subscribers before returning.
#[derive(Debug)]
pub struct WorldSession {
    state: WorldState,
    catalogs: Arc<Catalogs>,
    rng: RngBundle,
    dispatcher: Dispatcher,
}

impl WorldSession {
    /// Fresh session seeded from the catalogs' baselines.
    #[must_use]
    pub fn new(catalogs: Arc<Catalogs>, seed: u64) -> Self {
        let state = WorldState::seeded(&catalogs.regions, &catalogs.factions);
        Self::with_state(catalogs, state, seed)
    }

    /// Resume a session from a previously stored state.
    #[must_use]
    pub fn with_state(catalogs: Arc<Catalogs>, state: WorldState, seed: u64) -> Self {
        Self {
            state,
            catalogs,
            rng: RngBundle::from_user_seed(seed),
            dispatcher: Dispatcher::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        self.dispatcher.subscribe(subscriber);
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Restart every RNG stream from `seed`; the world state is kept.
    pub fn reseed(&mut self, seed: u64) {
        log::debug!("reseeding session {} -> {seed}", self.rng.seed());
        self.rng = RngBundle::from_user_seed(seed);
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub const fn state(&self) -> &WorldState {
        &self.state
    }

    #[must_use]
    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Give up the session, returning its state for storage.
    #[must_use]
    pub fn into_state(mut self) -> WorldState {
        self.flush();
        self.state
    }

    /// Mutate the state directly; resulting notifications are flushed.
    pub fn with_state_mut<T>(&mut self, f: impl FnOnce(&mut WorldState) -> T) -> T {
        let out = f(&mut self.state);
        self.flush();
        out
    }

    fn flush(&mut self) -> usize {
        self.dispatcher.flush(&mut self.state)
    }

    /// Advance one tick in the current region.
    ///
    /// Weather is rolled first if the sky does not belong to the current region.
    pub fn tick(&mut self, now: u64) -> EncounterResult {
        if let Some(region) = self
            .state
            .current_region()
            .and_then(|id| self.catalogs.regions.get(id))
            && self
                .state
                .weather()
                .is_none_or(|weather| weather.region_id != region.id)
        {
            update_weather(
                &mut self.state,
                region,
                &self.catalogs.factions,
                now,
                self.rng.weather(),
            );
        }
        let result =
            EncounterOrchestrator::new(&self.catalogs).roll_encounter(&mut self.state, self.rng.encounter());
        self.flush();
        result
    }

    pub fn enter_region(&mut self, region_id: &str, now: u64) -> Option<RegionEntry> {
        let entry = EncounterOrchestrator::new(&self.catalogs).enter_region(
            &mut self.state,
            region_id,
            now,
            self.rng.weather(),
        );
        self.flush();
        entry
    }

    /// Roll at a specific location, boss rules first.
    pub fn visit(&mut self, location: &Location, now: u64) -> EncounterResult {
        let result = EncounterOrchestrator::new(&self.catalogs).roll_at_location(
            &mut self.state,
            location,
            now,
            self.rng.encounter(),
        );
        self.flush();
        result
    }

    pub fn defeat_boss(&mut self, location: &Location, now: u64) -> BossRecord {
        let record = defeat_boss(&mut self.state, location, now, self.rng.boss());
        self.flush();
        record
    }
}
