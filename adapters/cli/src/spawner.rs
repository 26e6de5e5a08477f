//! Demonstration tick system that grows the entity list deterministically.

use lockstep_core::{Entity, EntityId, SimulationState};
use lockstep_math::DeterministicRng;
use lockstep_world::TickSystem;

use crate::config::SpawnerConfig;

/// Spawns up to `max_per_tick` entities every tick.
#[derive(Debug)]
pub(crate) struct SeededSpawner {
    rng: DeterministicRng,
    max_per_tick: i32,
    next_id: u64,
}

impl SeededSpawner {
    pub(crate) const fn new(config: SpawnerConfig) -> Self {
        Self {
            rng: DeterministicRng::new(config.seed),
            max_per_tick: config.max_per_tick,
            next_id: 0,
        }
    }
}

impl TickSystem for SeededSpawner {
    fn run(&mut self, tick: u64, state: &mut SimulationState) {
        // Frames wrap at 32 bits like the generator itself.
        let frame = tick as i32;
        let count = self.rng.range(0, self.max_per_tick.saturating_add(1), frame);
        for _ in 0..count {
            state
                .entities_mut()
                .push(Entity::new(EntityId::new(self.next_id)));
            self.next_id += 1;
        }
    }
}
