#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use wasteland_engine::{Catalogs, WorldState};

/// Replays scripted unit-interval rolls, then continues from a seeded stream.
pub struct ScriptedRng {
    script: VecDeque<u64>,
    fallback: SmallRng,
}

impl ScriptedRng {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn new(rolls: &[f64]) -> Self {
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

pub fn catalogs() -> Arc<Catalogs> {
    Arc::new(Catalogs::default_catalogs())
}

/// Seeded state with the player standing in `region`, outbox drained.
pub fn state_in(catalogs: &Catalogs, region: &str) -> WorldState {
    let mut state = WorldState::seeded(&catalogs.regions, &catalogs.factions);
    state.set_region(region);
    state.take_notifications();
    state
}
