//! Wasteland World Engine
//!
//! Platform-agnostic procedural world simulation for the Wasteland GPS game:
//! weather, faction standing, timeline instability, anomalies, NPC traits,
//! loot, bosses, micro-quests, and the encounter orchestrator that ties them
//! together. No I/O besides parsing the embedded JSON catalogs.

pub mod anomaly;
pub mod boss;
pub mod catalog;
pub(crate) mod constants;
pub mod encounters;
pub mod events;
pub mod faction;
pub mod loot;
pub mod merchants;
pub mod microquest;
pub mod npc;
pub mod numbers;
pub mod region;
pub mod result;
pub mod rng;
pub mod session;
pub mod state;
pub mod timeline;
pub mod weather;
pub mod weighted;

use std::sync::Arc;

// Re-export commonly used types
pub use anomaly::{AnomalyField, AnomalyKind, anomaly_pool, roll_anomaly};
pub use boss::{BossAbsence, BossDescriptor, BossStatus, boss_status, defeat_boss, roll_boss_encounter};
pub use catalog::{CatalogError, Catalogs};
pub use encounters::{EncounterOrchestrator, RegionEntry};
pub use events::{Dispatcher, Notification, NotificationKind, Subscriber, WorldEvent};
pub use faction::{
    EncounterBias, Faction, FactionCatalog, LootBias, PatrolSighting, ReputationTier,
};
pub use loot::{Rarity, generate_loot, roll_rarity};
pub use merchants::{MerchantEncounter, generate_inventory, roll_merchant};
pub use microquest::{Microquest, QuestTemplate};
pub use npc::{Npc, TraitId, TraitSet, roll_traits, spawn_npc};
pub use region::{
    EncounterKind, EnemySpawn, Location, LocationKind, Personality, Region, RegionCatalog,
    RegionEvent, Traveler,
};
pub use result::{AllyPatrol, AmbientEncounter, CombatEncounter, CombatModifier, EncounterResult};
pub use rng::{CountingRng, RngBundle};
pub use session::WorldSession;
pub use state::{BossRecord, Player, Timeline, WorldState};
pub use timeline::{EchoKind, TimelineEcho, distortion_chance, roll_echo};
pub use weather::{Weather, WeatherKind, roll_weather, update_weather};
pub use weighted::WeightTable;

/// Trait for abstracting catalog loading.
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the region catalog as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the region data cannot be read.
    fn load_regions_json(&self) -> Result<String, Self::Error>;

    /// Load the faction catalog as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the faction data cannot be read.
    fn load_factions_json(&self) -> Result<String, Self::Error>;
}

/// Loader serving the catalogs embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedLoader;

impl DataLoader for EmbeddedLoader {
    type Error = std::convert::Infallible;

    fn load_regions_json(&self) -> Result<String, Self::Error> {
        Ok(include_str!("../assets/data/regions.json").to_string())
    }

    fn load_factions_json(&self) -> Result<String, Self::Error> {
        Ok(include_str!("../assets/data/factions.json").to_string())
    }
}

/// Trait for abstracting world-state persistence.
/// Platform-specific implementations should provide this
pub trait WorldStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a world state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be saved.
    fn save_state(&self, save_name: &str, state: &WorldState) -> Result<(), Self::Error>;

    /// Load a world state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be loaded.
    fn load_state(&self, save_name: &str) -> Result<Option<WorldState>, Self::Error>;

    /// Delete a saved world state
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_state(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Main engine wiring catalogs and persistence into sessions
pub struct WorldEngine<L, S>
where
    L: DataLoader,
    S: WorldStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> WorldEngine<L, S>
where
    L: DataLoader,
    S: WorldStorage,
{
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Load and cross-validate both catalogs.
    ///
    /// # Errors
    ///
    /// Returns an error if either catalog cannot be loaded or is invalid.
    pub fn load_catalogs(&self) -> Result<Arc<Catalogs>, anyhow::Error> {
        let regions = self.data_loader.load_regions_json()?;
        let factions = self.data_loader.load_factions_json()?;
        let catalogs = Catalogs::from_json(&regions, &factions)?;
        log::debug!(
            "loaded {} regions and {} factions",
            catalogs.regions.len(),
            catalogs.factions.len()
        );
        Ok(Arc::new(catalogs))
    }

    /// Start a fresh session with the given seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogs cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<WorldSession, anyhow::Error> {
        Ok(WorldSession::new(self.load_catalogs()?, seed))
    }

    /// Save a session's world state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be saved.
    pub fn save_state(&self, save_name: &str, state: &WorldState) -> Result<(), S::Error> {
        self.storage.save_state(save_name, state)
    }

    /// Resume a stored session with fresh catalogs and RNG streams from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state or catalogs cannot be loaded.
    pub fn load_session(
        &self,
        save_name: &str,
        seed: u64,
    ) -> Result<Option<WorldSession>, anyhow::Error> {
        let Some(state) = self.storage.load_state(save_name)? else {
            return Ok(None);
        };
        let catalogs = self.load_catalogs()?;
        Ok(Some(WorldSession::with_state(catalogs, state, seed)))
    }

    /// Delete a saved world state
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_state(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_state(save_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, String>>>,
    }

    impl WorldStorage for MemoryStorage {
        type Error = serde_json::Error;

        fn save_state(&self, save_name: &str, state: &WorldState) -> Result<(), Self::Error> {
            let json = serde_json::to_string(state)?;
            self.saves.borrow_mut().insert(save_name.to_string(), json);
            Ok(())
        }

        fn load_state(&self, save_name: &str) -> Result<Option<WorldState>, Self::Error> {
            self.saves
                .borrow()
                .get(save_name)
                .map(|json| serde_json::from_str(json))
                .transpose()
        }

        fn delete_state(&self, save_name: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(save_name);
            Ok(())
        }
    }

    struct BrokenLoader;

    impl DataLoader for BrokenLoader {
        type Error = Infallible;

        fn load_regions_json(&self) -> Result<String, Self::Error> {
            Ok(r#"[{"id":"void","name":"Void","threat":0.5,"defaultFaction":"ghosts_of_nothing"}]"#
                .to_string())
        }

        fn load_factions_json(&self) -> Result<String, Self::Error> {
            Ok("[]".to_string())
        }
    }

    #[test]
    fn engine_creates_seeded_sessions() {
        let engine = WorldEngine::new(EmbeddedLoader, MemoryStorage::default());
        let session = engine.create_session(7).unwrap();
        assert_eq!(session.seed(), 7);
        assert_eq!(session.catalogs().regions.len(), 8);
        assert_eq!(session.catalogs().factions.len(), 10);
        assert_eq!(session.state().faction_control("mojave_core"), Some("dustwalkers"));
    }

    #[test]
    fn saved_state_round_trips_through_storage() {
        let storage = MemoryStorage::default();
        let engine = WorldEngine::new(EmbeddedLoader, storage);
        let mut session = engine.create_session(1).unwrap();
        session.enter_region("hollow_choir_rift", 10);
        session.with_state_mut(|state| {
            state.adjust_reputation("hollow_choir", 45);
            state.mark_region_unstable("hollow_choir_rift");
        });
        engine.save_state("slot", session.state()).unwrap();

        let restored = engine.load_session("slot", 2).unwrap().unwrap();
        assert_eq!(restored.state().current_region(), Some("hollow_choir_rift"));
        assert_eq!(restored.state().reputation("hollow_choir"), 45);
        assert!(restored.state().is_region_unstable("hollow_choir_rift"));
        assert_eq!(restored.seed(), 2);

        engine.delete_state("slot").unwrap();
        assert!(engine.load_session("slot", 2).unwrap().is_none());
    }

    #[test]
    fn dangling_faction_reference_is_rejected() {
        let engine = WorldEngine::new(BrokenLoader, MemoryStorage::default());
        let err = engine.create_session(0).unwrap_err();
        assert!(err.to_string().contains("ghosts_of_nothing"));
    }
}
