//! Centralized balance and tuning constants for the world simulation.
//!
//! These values define the deterministic math behind every engine. Keeping
//! them together means gameplay is only adjusted through reviewed code
//! changes, while region and faction data stays in the JSON catalogs.

// Probability bounds --------------------------------------------------------
pub(crate) const PROBABILITY_FLOOR: f64 = 0.0;
pub(crate) const PROBABILITY_MAX: f64 = 1.0;

// Orchestrator gates --------------------------------------------------------
pub(crate) const ANOMALY_BRANCH_THRESHOLD: f64 = 0.3;
pub(crate) const ANOMALY_BRANCH_FACTOR: f64 = 0.25;
pub(crate) const HOSTILE_AMBUSH_FACTOR: f64 = 0.6;
pub(crate) const ALLY_PATROL_CHANCE: f64 = 0.25;
pub(crate) const AMBIENT_CHANCE: f64 = 0.2;

// Reputation ---------------------------------------------------------------
pub(crate) const REPUTATION_THRESHOLDS: [i32; 6] = [-75, -40, -10, 10, 40, 75];
pub(crate) const REPUTATION_MIN: i32 = -200;
pub(crate) const REPUTATION_MAX: i32 = 200;

// Notifications -------------------------------------------------------------
pub(crate) const NOTIFICATION_OUTBOX_LIMIT: usize = 512;
pub(crate) const STANDING_BANDS: [i32; 3] = [25, 50, 75];
pub(crate) const DISCOUNT_FACTORS_POSITIVE: [f64; 3] = [1.2, 1.5, 2.0];
pub(crate) const DISCOUNT_FACTORS_NEGATIVE: [f64; 3] = [-0.5, -1.0, -1.5];
pub(crate) const AMBUSH_FACTORS_POSITIVE: [f64; 3] = [0.75, 0.5, 0.25];
pub(crate) const AMBUSH_FACTORS_NEGATIVE: [f64; 3] = [1.25, 1.5, 2.0];
pub(crate) const BACKUP_FACTORS_POSITIVE: [f64; 3] = [1.25, 1.5, 2.0];
pub(crate) const BACKUP_FACTORS_NEGATIVE: [f64; 3] = [0.75, 0.5, 0.25];
pub(crate) const DEFAULT_BASE_AMBUSH: f64 = 0.1;
pub(crate) const DEFAULT_BASE_BACKUP: f64 = 0.1;

// Weather ------------------------------------------------------------------
pub(crate) const WEATHER_REGION_BIAS: f64 = 1.5;
pub(crate) const WEATHER_ANOMALY_THRESHOLD: f64 = 0.3;
pub(crate) const WEATHER_TIMELINE_BONUS: f64 = 0.5;

// Timeline -----------------------------------------------------------------
pub(crate) const DISTORTION_GLOBAL_FACTOR: f64 = 0.4;
pub(crate) const DISTORTION_ANOMALY_FACTOR: f64 = 0.4;
pub(crate) const DISTORTION_UNSTABLE_BONUS: f64 = 0.2;
pub(crate) const DISTORTION_MYSTERIOUS_BONUS: f64 = 0.1;

// Anomalies ----------------------------------------------------------------
pub(crate) const GLITCH_MOB_THRESHOLD: f64 = 0.1;
pub(crate) const DISTORTION_FIELD_THRESHOLD: f64 = 0.2;
pub(crate) const ANOMALY_STORM_THRESHOLD: f64 = 0.3;
pub(crate) const ANOMALY_STORM_MAX_INTENSITY: u8 = 3;
pub(crate) const ANOMALY_STORM_INSTABILITY_STEP: f64 = 0.05;

// NPC traits ---------------------------------------------------------------
pub(crate) const DUAL_TRAIT_CHANCE: f64 = 0.2;
pub(crate) const NPC_BASE_ATK: i32 = 1;
pub(crate) const NPC_BASE_DEF: i32 = 1;
pub(crate) const NPC_BASE_HP: i32 = 10;
pub(crate) const NPC_BASE_MORALE: i32 = 0;
pub(crate) const TRAIT_ANOMALY_THRESHOLD: f64 = 0.3;
pub(crate) const TRAIT_ANOMALY_ATK: i32 = 1;
pub(crate) const TRAIT_ANOMALY_HP: i32 = 2;
pub(crate) const TRAIT_RAD_STORM_HP: i32 = 3;

// Loot ---------------------------------------------------------------------
pub(crate) const RARITY_WEIGHT_COMMON: f64 = 1.0;
pub(crate) const RARITY_WEIGHT_UNCOMMON: f64 = 0.6;
pub(crate) const RARITY_WEIGHT_RARE: f64 = 0.25;
pub(crate) const RARITY_WEIGHT_LEGENDARY: f64 = 0.05;
pub(crate) const RARITY_ANOMALY_FACTOR: f64 = 0.4;
pub(crate) const LOOT_RAD_STORM_THRESHOLD: f64 = 0.3;
pub(crate) const LOOT_ECHO_CHANCE: f64 = 0.25;
pub(crate) const LOOT_WHITEOUT_ITEM: &str = "thermal_coat";
pub(crate) const LOOT_ECHO_ITEM: &str = "echo_item";

// Bosses -------------------------------------------------------------------
pub(crate) const BOSS_RESPAWN_BASE_MS: u64 = 30 * 60 * 1_000;
pub(crate) const BOSS_RESPAWN_VARIANCE_MS: u64 = 15 * 60 * 1_000;
pub(crate) const BOSS_STORM_LEVEL_BOOST: u32 = 2;
pub(crate) const BOSS_RAD_STORM_LEVEL_BOOST: u32 = 5;

// Microquests --------------------------------------------------------------
pub(crate) const QUEST_ANOMALY_THRESHOLD: f64 = 0.3;

// Merchants ----------------------------------------------------------------
pub(crate) const MERCHANT_UNCOMMON_ROLL: f64 = 0.85;
pub(crate) const MERCHANT_RARE_ROLL: f64 = 0.95;
pub(crate) const MERCHANT_LEGENDARY_ROLL: f64 = 0.99;
pub(crate) const MERCHANT_BASE_PULLS: usize = 3;
pub(crate) const MERCHANT_FACTION_PULLS: usize = 2;
pub(crate) const MERCHANT_PERSONALITY_PULLS: usize = 2;

// Enemy scaling ------------------------------------------------------------
pub(crate) const ENEMY_LEVEL_SCALE: f64 = 10.0;
pub(crate) const TRAVELER_LEVEL_SCALE: f64 = 8.0;
pub(crate) const GLITCH_BEAST_LEVEL_BONUS: u32 = 3;
pub(crate) const STATIC_WALKER_LEVEL_BONUS: u32 = 2;
