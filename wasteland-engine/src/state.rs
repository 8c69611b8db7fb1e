//! Mutable world state for one play session.
//!
//! Every engine reads from and writes to a [`WorldState`] passed in by the
//! caller. Probability-like fields are clamped on every write, and player
//! mutations push notifications onto an in-memory outbox that a
//! [`Dispatcher`](crate::events::Dispatcher) drains.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::{NOTIFICATION_OUTBOX_LIMIT, REPUTATION_MAX, REPUTATION_MIN};
use crate::events::{Notification, NotificationKind, WorldEvent};
use crate::faction::FactionCatalog;
use crate::numbers::clamp01;
use crate::region::RegionCatalog;
use crate::weather::Weather;

const DEFAULT_PLAYER_HP: i32 = 100;

/// Player block tracked alongside the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub hp: i32,
    pub caps: i64,
    pub inventory: Vec<String>,
    pub perks: Vec<String>,
    pub reputation: BTreeMap<String, i32>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            hp: DEFAULT_PLAYER_HP,
            caps: 0,
            inventory: Vec::new(),
            perks: Vec::new(),
            reputation: BTreeMap::new(),
        }
    }
}

/// Timeline instability: explicit unstable-region set plus a global level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeline {
    pub unstable_regions: Vec<String>,
    pub global_instability: f64,
}

/// Cooldown record for a region's boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossRecord {
    /// Millisecond timestamp of the most recent defeat.
    pub defeated_at: u64,
    /// Millisecond timestamp at which the boss is alive again.
    pub respawn_at: u64,
    pub kills: u32,
}

/// Single mutable store of simulation-relevant state.
///
/// Deserialization goes through `StoredWorldState`, so a loaded state obeys
/// the same bounds as one built through the setters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoredWorldState")]
pub struct WorldState {
    current_region: Option<String>,
    current_weather: Option<Weather>,
    faction_control: BTreeMap<String, String>,
    anomaly_levels: BTreeMap<String, f64>,
    timeline: Timeline,
    boss_state: BTreeMap<String, BossRecord>,
    pub player: Player,
    flags: BTreeMap<String, serde_json::Value>,
    event_queue: VecDeque<WorldEvent>,
    next_event_seq: u64,
    #[serde(skip)]
    notifications: Vec<Notification>,
}

/// On-disk shape of [`WorldState`], before bounds are re-applied.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredWorldState {
    current_region: Option<String>,
    current_weather: Option<Weather>,
    faction_control: BTreeMap<String, String>,
    anomaly_levels: BTreeMap<String, f64>,
    timeline: Timeline,
    boss_state: BTreeMap<String, BossRecord>,
    player: Player,
    flags: BTreeMap<String, serde_json::Value>,
    event_queue: VecDeque<WorldEvent>,
    next_event_seq: u64,
}

impl From<StoredWorldState> for WorldState {
    fn from(stored: StoredWorldState) -> Self {
        let next_event_seq = stored
            .event_queue
            .iter()
            .map(|event| event.seq.saturating_add(1))
            .fold(stored.next_event_seq, u64::max);
        let mut state = Self {
            current_region: stored.current_region,
            current_weather: stored.current_weather,
            faction_control: stored.faction_control,
            flags: stored.flags,
            event_queue: stored.event_queue,
            next_event_seq,
            ..Self::default()
        };
        for (region_id, level) in &stored.anomaly_levels {
            state.set_anomaly_level(region_id, *level);
        }
        for region_id in &stored.timeline.unstable_regions {
            state.mark_region_unstable(region_id);
        }
        state.set_global_instability(stored.timeline.global_instability);
        state.boss_state = stored
            .boss_state
            .into_iter()
            .map(|(region_id, record)| {
                let respawn_at = record.respawn_at.max(record.defeated_at.saturating_add(1));
                (region_id, BossRecord { respawn_at, ..record })
            })
            .collect();

        let mut player = stored.player;
        for score in player.reputation.values_mut() {
            *score = (*score).clamp(REPUTATION_MIN, REPUTATION_MAX);
        }
        state.player = player;
        state
    }
}

impl WorldState {
    /// Fresh state with anomaly levels and faction control taken from the catalogs.
    #[must_use]
    pub fn seeded(regions: &RegionCatalog, factions: &FactionCatalog) -> Self {
        let mut state = Self::default();
        for region in regions.iter() {
            state.set_anomaly_level(&region.id, region.anomaly_baseline);
            if let Some(faction_id) = region.default_faction.as_deref()
                && factions.get(faction_id).is_some()
            {
                state.set_faction_control(&region.id, faction_id);
            }
        }
        state
    }

    // Region ---------------------------------------------------------------

    pub fn set_region(&mut self, region_id: &str) {
        self.current_region = Some(region_id.to_string());
        self.publish(Notification::new(
            NotificationKind::Location,
            json!({ "region_id": region_id }),
        ));
    }

    #[must_use]
    pub fn current_region(&self) -> Option<&str> {
        self.current_region.as_deref()
    }

    // Weather --------------------------------------------------------------

    /// Replace the current weather wholesale.
    pub fn set_weather(&mut self, weather: Weather) {
        let payload = json!({ "id": weather.kind.as_str(), "region_id": weather.region_id });
        self.current_weather = Some(weather);
        self.publish(Notification::new(NotificationKind::WeatherChange, payload));
    }

    pub fn clear_weather(&mut self) {
        self.current_weather = None;
    }

    #[must_use]
    pub const fn weather(&self) -> Option<&Weather> {
        self.current_weather.as_ref()
    }

    // Faction control ------------------------------------------------------

    pub fn set_faction_control(&mut self, region_id: &str, faction_id: &str) {
        self.faction_control
            .insert(region_id.to_string(), faction_id.to_string());
    }

    pub fn clear_faction_control(&mut self, region_id: &str) {
        self.faction_control.remove(region_id);
    }

    #[must_use]
    pub fn faction_control(&self, region_id: &str) -> Option<&str> {
        self.faction_control.get(region_id).map(String::as_str)
    }

    // Anomalies ------------------------------------------------------------

    pub fn set_anomaly_level(&mut self, region_id: &str, level: f64) {
        self.anomaly_levels
            .insert(region_id.to_string(), clamp01(level));
    }

    #[must_use]
    pub fn anomaly_level(&self, region_id: &str) -> f64 {
        self.anomaly_levels.get(region_id).copied().unwrap_or(0.0)
    }

    pub fn anomaly_levels(&self) -> impl Iterator<Item = (&str, f64)> {
        self.anomaly_levels
            .iter()
            .map(|(region, level)| (region.as_str(), *level))
    }

    // Timeline -------------------------------------------------------------

    pub fn mark_region_unstable(&mut self, region_id: &str) {
        if !self.is_region_unstable(region_id) {
            self.timeline.unstable_regions.push(region_id.to_string());
        }
    }

    pub fn mark_region_stable(&mut self, region_id: &str) {
        self.timeline
            .unstable_regions
            .retain(|region| region != region_id);
    }

    #[must_use]
    pub fn is_region_unstable(&self, region_id: &str) -> bool {
        self.timeline
            .unstable_regions
            .iter()
            .any(|region| region == region_id)
    }

    #[must_use]
    pub fn unstable_regions(&self) -> &[String] {
        &self.timeline.unstable_regions
    }

    pub fn set_global_instability(&mut self, value: f64) {
        self.timeline.global_instability = clamp01(value);
    }

    #[must_use]
    pub const fn global_instability(&self) -> f64 {
        self.timeline.global_instability
    }

    // Bosses ---------------------------------------------------------------

    #[must_use]
    pub fn boss_record(&self, region_id: &str) -> Option<&BossRecord> {
        self.boss_state.get(region_id)
    }

    /// Record a boss defeat. `respawn_at` is forced strictly after `defeated_at`.
    pub fn record_boss_defeat(&mut self, region_id: &str, defeated_at: u64, respawn_at: u64) {
        let respawn_at = respawn_at.max(defeated_at.saturating_add(1));
        let kills = self
            .boss_state
            .get(region_id)
            .map_or(0, |record| record.kills);
        self.boss_state.insert(
            region_id.to_string(),
            BossRecord {
                defeated_at,
                respawn_at,
                kills: kills.saturating_add(1),
            },
        );
    }

    // Flags ----------------------------------------------------------------

    pub fn set_flag(&mut self, key: &str, value: serde_json::Value) {
        self.flags.insert(key.to_string(), value);
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> Option<&serde_json::Value> {
        self.flags.get(key)
    }

    // Player ---------------------------------------------------------------

    pub const fn set_player_hp(&mut self, hp: i32) {
        self.player.hp = hp;
    }

    pub fn add_caps(&mut self, amount: i64) {
        self.player.caps = self.player.caps.saturating_add(amount);
        let caps = self.player.caps;
        self.publish(Notification::new(
            NotificationKind::Caps,
            json!({ "caps": caps }),
        ));
    }

    pub fn add_inventory_item(&mut self, item_id: &str) {
        self.player.inventory.push(item_id.to_string());
        self.publish(Notification::new(
            NotificationKind::Inventory,
            json!({ "item_id": item_id }),
        ));
    }

    pub fn set_reputation(&mut self, faction_id: &str, value: i32) {
        self.player
            .reputation
            .insert(faction_id.to_string(), value);
        self.publish(Notification::new(
            NotificationKind::Reputation,
            json!({ "faction_id": faction_id, "value": value }),
        ));
    }

    /// Shift reputation by `delta`, clamped to the reputation range.
    pub fn adjust_reputation(&mut self, faction_id: &str, delta: i32) {
        let next = self
            .reputation(faction_id)
            .saturating_add(delta)
            .clamp(REPUTATION_MIN, REPUTATION_MAX);
        self.set_reputation(faction_id, next);
    }

    #[must_use]
    pub fn reputation(&self, faction_id: &str) -> i32 {
        self.player
            .reputation
            .get(faction_id)
            .copied()
            .unwrap_or(0)
    }

    // Event queue ----------------------------------------------------------

    /// Queue a game-level event, returning its sequence number.
    pub fn queue_event(&mut self, kind: &str, payload: serde_json::Value) -> u64 {
        let seq = self.next_event_seq;
        self.next_event_seq = self.next_event_seq.saturating_add(1);
        self.event_queue.push_back(WorldEvent {
            seq,
            kind: kind.to_string(),
            payload,
        });
        seq
    }

    pub fn next_event(&mut self) -> Option<WorldEvent> {
        self.event_queue.pop_front()
    }

    #[must_use]
    pub fn queued_events(&self) -> usize {
        self.event_queue.len()
    }

    // Notifications --------------------------------------------------------

    /// Push a notification onto the outbox. Never fails.
    ///
    /// The outbox is bounded: past `NOTIFICATION_OUTBOX_LIMIT` pending
    /// entries the oldest are dropped. Hosts driving engines directly, without
    /// a [`WorldSession`](crate::session::WorldSession), must drain it with
    /// [`take_notifications`](Self::take_notifications) or a
    /// [`Dispatcher`](crate::events::Dispatcher).
    pub fn publish(&mut self, notification: Notification) {
        if self.notifications.len() >= NOTIFICATION_OUTBOX_LIMIT {
            let overflow = self.notifications.len() + 1 - NOTIFICATION_OUTBOX_LIMIT;
            log::warn!("notification outbox full; dropping {overflow} undelivered");
            self.notifications.drain(..overflow);
        }
        self.notifications.push(notification);
    }

    #[must_use]
    pub fn pending_notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}
