//! NPC trait rolls and their effect on combat stats.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{
    DUAL_TRAIT_CHANCE, NPC_BASE_ATK, NPC_BASE_DEF, NPC_BASE_HP, NPC_BASE_MORALE,
    TRAIT_ANOMALY_ATK, TRAIT_ANOMALY_HP, TRAIT_ANOMALY_THRESHOLD, TRAIT_RAD_STORM_HP,
};
use crate::region::EnemySpawn;
use crate::weather::{Weather, WeatherKind};

/// Personality and combat traits, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitId {
    Brave,
    Cowardly,
    Greedy,
    Elite,
    AnomalyTouched,
    GlitchScarred,
    Drunk,
    Jittery,
    Storyteller,
    Silent,
}

/// Traits carried by one NPC; at most two.
pub type TraitSet = SmallVec<[TraitId; 2]>;

#[derive(Debug, Clone, Copy, Default)]
struct StatDelta {
    atk: i32,
    def: i32,
    hp: i32,
    morale: i32,
}

impl TraitId {
    pub const ALL: [Self; 10] = [
        Self::Brave,
        Self::Cowardly,
        Self::Greedy,
        Self::Elite,
        Self::AnomalyTouched,
        Self::GlitchScarred,
        Self::Drunk,
        Self::Jittery,
        Self::Storyteller,
        Self::Silent,
    ];

    const fn delta(self) -> StatDelta {
        match self {
            Self::Brave => StatDelta {
                atk: 1,
                def: 0,
                hp: 0,
                morale: 2,
            },
            Self::Cowardly => StatDelta {
                atk: -1,
                def: 0,
                hp: 0,
                morale: -2,
            },
            Self::Elite => StatDelta {
                atk: 2,
                def: 2,
                hp: 10,
                morale: 0,
            },
            Self::AnomalyTouched => StatDelta {
                atk: 1,
                def: -1,
                hp: 0,
                morale: 0,
            },
            Self::Drunk => StatDelta {
                atk: 1,
                def: -2,
                hp: 0,
                morale: 0,
            },
            Self::Jittery => StatDelta {
                atk: -1,
                def: 0,
                hp: 0,
                morale: -1,
            },
            Self::Greedy | Self::GlitchScarred | Self::Storyteller | Self::Silent => StatDelta {
                atk: 0,
                def: 0,
                hp: 0,
                morale: 0,
            },
        }
    }

    #[must_use]
    pub const fn flavor(self) -> &'static str {
        match self {
            Self::Brave => "Stands their ground even when outnumbered.",
            Self::Cowardly => "Likely to flee when injured.",
            Self::Greedy => "Carries extra valuables scavenged from others.",
            Self::Elite => "Highly trained and well-equipped.",
            Self::AnomalyTouched => "Reality flickers around them.",
            Self::GlitchScarred => "Temporal scars distort their movements.",
            Self::Drunk => "Stumbles unpredictably.",
            Self::Jittery => "Nervous and twitchy.",
            Self::Storyteller => "Knows rumors and secrets of the wasteland.",
            Self::Silent => "Speaks only when necessary.",
        }
    }

    /// Whether the NPC will talk; `None` when the trait says nothing about it.
    #[must_use]
    pub const fn dialog(self) -> Option<bool> {
        match self {
            Self::Storyteller => Some(true),
            Self::Silent => Some(false),
            _ => None,
        }
    }
}

/// A generated NPC with traits folded into its stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub base_level: u32,
    pub traits: TraitSet,
    pub atk: i32,
    pub def: i32,
    pub hp: i32,
    pub morale: i32,
}

/// Roll one trait, or two distinct traits with [`DUAL_TRAIT_CHANCE`], in table order.
pub fn roll_traits<R>(rng: &mut R) -> TraitSet
where
    R: Rng + ?Sized,
{
    let dual = rng.r#gen::<f64>() < DUAL_TRAIT_CHANCE;
    let count = TraitId::ALL.len();
    let first = rng.gen_range(0..count);
    let mut traits = TraitSet::new();
    traits.push(TraitId::ALL[first]);
    if dual {
        let mut second = rng.gen_range(0..count - 1);
        if second >= first {
            second += 1;
        }
        traits.push(TraitId::ALL[second]);
        traits.sort_unstable();
    }
    traits
}

/// Build an NPC from `traits`, applying each trait once in table order.
#[must_use]
pub fn build_npc(
    spawn: &EnemySpawn,
    traits: TraitSet,
    anomaly_level: f64,
    weather: Option<&Weather>,
) -> Npc {
    let rad_storm = weather.is_some_and(|w| w.kind == WeatherKind::RadStorm);
    let mut npc = Npc {
        id: spawn.id.clone(),
        base_level: spawn.level,
        traits: TraitSet::new(),
        atk: NPC_BASE_ATK,
        def: NPC_BASE_DEF,
        hp: NPC_BASE_HP,
        morale: NPC_BASE_MORALE,
    };
    for id in TraitId::ALL.into_iter().filter(|id| traits.contains(id)) {
        let delta = id.delta();
        npc.atk += delta.atk;
        npc.def += delta.def;
        npc.hp += delta.hp;
        npc.morale += delta.morale;
        if id == TraitId::AnomalyTouched {
            if anomaly_level > TRAIT_ANOMALY_THRESHOLD {
                npc.atk += TRAIT_ANOMALY_ATK;
                npc.hp += TRAIT_ANOMALY_HP;
            }
            if rad_storm {
                npc.hp += TRAIT_RAD_STORM_HP;
            }
        }
        npc.traits.push(id);
    }
    npc
}

/// Roll traits for one spawn and build the NPC.
pub fn spawn_npc<R>(
    spawn: &EnemySpawn,
    anomaly_level: f64,
    weather: Option<&Weather>,
    rng: &mut R,
) -> Npc
where
    R: Rng + ?Sized,
{
    let traits = roll_traits(rng);
    build_npc(spawn, traits, anomaly_level, weather)
}

/// Spawn a whole group in order.
pub fn spawn_group<R>(
    spawns: &[EnemySpawn],
    anomaly_level: f64,
    weather: Option<&Weather>,
    rng: &mut R,
) -> Vec<Npc>
where
    R: Rng + ?Sized,
{
    spawns
        .iter()
        .map(|spawn| spawn_npc(spawn, anomaly_level, weather, rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use smallvec::smallvec;

    fn spawn() -> EnemySpawn {
        EnemySpawn {
            id: "raider_gunman".into(),
            level: 4,
        }
    }

    fn rad_storm() -> Weather {
        Weather {
            kind: WeatherKind::RadStorm,
            intensity: None,
            region_id: "brood_nest".into(),
            faction_id: None,
            anomaly: 0.6,
            timestamp: 0,
        }
    }

    #[test]
    fn trait_deltas_are_additive() {
        let npc = build_npc(&spawn(), smallvec![TraitId::Brave, TraitId::Elite], 0.0, None);
        assert_eq!((npc.atk, npc.def, npc.hp, npc.morale), (4, 3, 20, 2));
        let npc = build_npc(&spawn(), smallvec![TraitId::Drunk, TraitId::Jittery], 0.0, None);
        assert_eq!((npc.atk, npc.def, npc.hp, npc.morale), (1, -1, 10, -1));
    }

    #[test]
    fn anomaly_touched_gains_from_anomalies_and_rad_storms() {
        let calm = build_npc(&spawn(), smallvec![TraitId::AnomalyTouched], 0.1, None);
        assert_eq!((calm.atk, calm.def, calm.hp), (2, 0, 10));
        let charged = build_npc(&spawn(), smallvec![TraitId::AnomalyTouched], 0.5, None);
        assert_eq!((charged.atk, charged.hp), (3, 12));
        let storm = rad_storm();
        let stormed = build_npc(&spawn(), smallvec![TraitId::AnomalyTouched], 0.5, Some(&storm));
        assert_eq!(stormed.hp, 15);
        let glitch = build_npc(&spawn(), smallvec![TraitId::GlitchScarred], 0.9, Some(&storm));
        assert_eq!((glitch.atk, glitch.hp), (1, 10));
    }

    #[test]
    fn traits_are_applied_in_table_order() {
        let npc = build_npc(&spawn(), smallvec![TraitId::Silent, TraitId::Brave], 0.0, None);
        assert_eq!(npc.traits.as_slice(), &[TraitId::Brave, TraitId::Silent]);
    }

    #[test]
    fn rolled_traits_are_distinct_and_mostly_single() {
        let mut rng = SmallRng::seed_from_u64(77);
        let mut doubles = 0;
        for _ in 0..2_000 {
            let traits = roll_traits(&mut rng);
            assert!(!traits.is_empty() && traits.len() <= 2);
            if traits.len() == 2 {
                assert_ne!(traits[0], traits[1]);
                assert!(traits[0] < traits[1]);
                doubles += 1;
            }
        }
        assert!((250..=550).contains(&doubles), "doubles = {doubles}");
    }

    #[test]
    fn groups_keep_spawn_levels() {
        let mut rng = SmallRng::seed_from_u64(3);
        let spawns = vec![
            spawn(),
            EnemySpawn {
                id: "raider_bruiser".into(),
                level: 5,
            },
        ];
        let group = spawn_group(&spawns, 0.0, None, &mut rng);
        assert_eq!(group.len(), 2);
        assert_eq!(group[1].base_level, 5);
        assert_eq!(group[0].id, "raider_gunman");
        assert_eq!(TraitId::Storyteller.dialog(), Some(true));
        assert!(!TraitId::Elite.flavor().is_empty());
    }
}
