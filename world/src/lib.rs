#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation clock for the lockstep core.
//!
//! The [`SimulationClock`] converts variable wall-clock deltas into a whole
//! number of fixed-duration logical ticks. Wall time is banked in an
//! accumulator and spent one step at a time, so every participant that feeds
//! the same deltas observes the same tick sequence regardless of frame rate.

use lockstep_core::{ConfigError, SimulationState, SyncConfig, SyncSnapshot};

/// Work performed once per logical tick.
///
/// Systems run in registration order after the tick counter has advanced.
/// They must be deterministic: the same tick applied to the same state must
/// always produce the same result.
pub trait TickSystem {
    /// Advances the provided state for the tick that just began.
    fn run(&mut self, tick: u64, state: &mut SimulationState);
}

/// Outcome of a single [`SimulationClock::update`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateReport {
    /// Number of logical ticks performed.
    pub ticks: u32,
    /// Milliseconds discarded because the catch-up cap was reached.
    pub dropped_ms: Option<f64>,
}

/// Fixed-step clock owning the authoritative simulation state.
pub struct SimulationClock {
    state: SimulationState,
    systems: Vec<Box<dyn TickSystem + Send>>,
    logic_tick_rate: f64,
    max_catchup_ticks: u32,
    // Banked time multiplied by the tick rate, so one step is exactly 1000.0
    // and repeated heartbeat deltas accumulate without rounding drift.
    scaled_accumulator: f64,
    catch_up_overruns: u64,
}

/// Amount of scaled accumulator consumed by one logical tick.
const SCALED_STEP: f64 = 1000.0;

impl SimulationClock {
    /// Creates a clock at tick zero with an empty accumulator.
    ///
    /// `config` must pass [`SyncConfig::validate`]; use [`Self::try_new`]
    /// when it has not been checked already.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "simulation clock built from invalid config {config:?}"
        );
        Self {
            state: SimulationState::new(),
            systems: Vec::new(),
            logic_tick_rate: f64::from(config.logic_tick_rate),
            max_catchup_ticks: config.max_catchup_ticks,
            scaled_accumulator: 0.0,
            catch_up_overruns: 0,
        }
    }

    /// Validates `config` and creates a clock at tick zero.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] reported by [`SyncConfig::validate`].
    pub fn try_new(config: &SyncConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Appends a system that runs on every subsequent tick.
    pub fn register(&mut self, system: Box<dyn TickSystem + Send>) {
        self.systems.push(system);
    }

    /// Banks `delta_ms` of wall time and performs every tick it pays for.
    ///
    /// At most `max_catchup_ticks` ticks run per call. When the cap is
    /// reached the remaining time is discarded and a warning is logged.
    /// Negative or non-finite deltas are treated as zero.
    pub fn update(&mut self, delta_ms: f64) -> UpdateReport {
        let delta_ms = if delta_ms.is_finite() && delta_ms >= 0.0 {
            delta_ms
        } else {
            tracing::debug!(delta_ms, "ignoring invalid clock delta");
            0.0
        };

        self.scaled_accumulator += delta_ms * self.logic_tick_rate;

        let mut ticks = 0;
        let mut dropped_ms = None;
        while self.scaled_accumulator >= SCALED_STEP {
            self.tick();
            self.scaled_accumulator -= SCALED_STEP;
            ticks += 1;

            if ticks >= self.max_catchup_ticks {
                let dropped = self.scaled_accumulator / self.logic_tick_rate;
                self.scaled_accumulator = 0.0;
                self.catch_up_overruns = self.catch_up_overruns.saturating_add(1);
                tracing::warn!(
                    ticks,
                    dropped_ms = dropped,
                    tick = self.state.tick(),
                    "catch-up cap reached, discarding banked time"
                );
                dropped_ms = Some(dropped);
                break;
            }
        }

        UpdateReport { ticks, dropped_ms }
    }

    /// Performs exactly one logical tick.
    pub fn tick(&mut self) {
        let tick = self.state.advance_tick();
        for system in &mut self.systems {
            system.run(tick, &mut self.state);
        }
        tracing::trace!(tick, "logic tick");
    }

    /// Logical tick counter.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.state.tick()
    }

    /// Read-only view of the live state.
    #[must_use]
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Time banked toward the next tick, in milliseconds.
    #[must_use]
    pub fn accumulator_ms(&self) -> f64 {
        self.scaled_accumulator / self.logic_tick_rate
    }

    /// Duration of one logical tick, in milliseconds.
    #[must_use]
    pub fn step_time_ms(&self) -> f64 {
        SCALED_STEP / self.logic_tick_rate
    }

    /// Fraction of the next tick already banked, in `[0, 1)`.
    #[must_use]
    pub fn interpolation_alpha(&self) -> f64 {
        self.scaled_accumulator / SCALED_STEP
    }

    /// Number of updates that hit the catch-up cap.
    #[must_use]
    pub const fn catch_up_overruns(&self) -> u64 {
        self.catch_up_overruns
    }

    /// Captures a detached copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot::new(self.state.tick(), self.accumulator_ms(), self.state.clone())
    }
}

impl std::fmt::Debug for SimulationClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationClock")
            .field("tick", &self.state.tick())
            .field("accumulator_ms", &self.accumulator_ms())
            .field("systems", &self.systems.len())
            .field("catch_up_overruns", &self.catch_up_overruns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lockstep_core::{Entity, EntityId};

    fn clock() -> SimulationClock {
        SimulationClock::new(&SyncConfig::default())
    }

    struct Spawner;

    impl TickSystem for Spawner {
        fn run(&mut self, tick: u64, state: &mut SimulationState) {
            state.entities_mut().push(Entity::new(EntityId::new(tick)));
        }
    }

    #[test]
    fn new_clock_starts_idle() {
        let clock = clock();
        assert_eq!(clock.tick_count(), 0);
        assert_eq!(clock.accumulator_ms(), 0.0);
        assert!(clock.state().entities().is_empty());
    }

    #[test]
    fn unrunnable_configs_are_rejected() {
        let zero_rate = SyncConfig {
            logic_tick_rate: 0,
            ..SyncConfig::default()
        };
        assert!(matches!(
            SimulationClock::try_new(&zero_rate),
            Err(ConfigError::ZeroTickRate)
        ));

        let zero_cap = SyncConfig {
            max_catchup_ticks: 0,
            ..SyncConfig::default()
        };
        assert!(matches!(
            SimulationClock::try_new(&zero_cap),
            Err(ConfigError::ZeroCatchUpCap)
        ));

        let clock = SimulationClock::try_new(&SyncConfig::default()).expect("default config");
        assert_eq!(clock.tick_count(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid config")]
    fn new_rejects_zero_tick_rate_in_debug_builds() {
        let _ = SimulationClock::new(&SyncConfig {
            logic_tick_rate: 0,
            ..SyncConfig::default()
        });
    }

    #[test]
    fn one_second_yields_the_tick_rate() {
        let mut clock = clock();
        let report = clock.update(1000.0);
        assert_eq!(report.ticks, 15);
        assert_eq!(report.dropped_ms, None);
        assert_eq!(clock.tick_count(), 15);
        assert_eq!(clock.accumulator_ms(), 0.0);
    }

    #[test]
    fn partial_steps_are_banked() {
        let mut clock = clock();
        for _ in 0..4 {
            assert_eq!(clock.update(16.0).ticks, 0);
        }
        assert!((clock.accumulator_ms() - 64.0).abs() < 1e-9);
        assert_eq!(clock.tick_count(), 0);

        assert_eq!(clock.update(76.0).ticks, 2);
        assert!((clock.accumulator_ms() - (140.0 - 2000.0 / 15.0)).abs() < 1e-9);
    }

    #[test]
    fn heartbeats_never_drift() {
        let mut clock = clock();
        for _ in 0..25 {
            let _ = clock.update(16.0);
        }
        assert_eq!(clock.tick_count(), 6);

        for _ in 0..975 {
            let _ = clock.update(16.0);
        }
        assert_eq!(clock.tick_count(), 240);
        assert_eq!(clock.accumulator_ms(), 0.0);
    }

    #[test]
    fn interpolation_alpha_tracks_accumulator() {
        let mut clock = clock();
        let _ = clock.update(clock.step_time_ms() / 2.0);
        assert!((clock.interpolation_alpha() - 0.5).abs() < 1e-9);
        assert!(clock.interpolation_alpha() < 1.0);
    }

    #[test]
    fn catch_up_is_capped() {
        let mut clock = clock();
        let report = clock.update(66_667.0);
        assert_eq!(report.ticks, 100);
        assert!(report.dropped_ms.is_some());
        assert_eq!(clock.tick_count(), 100);
        assert_eq!(clock.accumulator_ms(), 0.0);
        assert_eq!(clock.catch_up_overruns(), 1);

        assert_eq!(clock.update(1000.0).ticks, 15);
        assert_eq!(clock.catch_up_overruns(), 1);
    }

    #[test]
    fn invalid_deltas_are_ignored() {
        let mut clock = clock();
        assert_eq!(clock.update(-50.0).ticks, 0);
        assert_eq!(clock.update(f64::NAN).ticks, 0);
        assert_eq!(clock.update(f64::INFINITY).ticks, 0);
        assert_eq!(clock.accumulator_ms(), 0.0);
    }

    #[test]
    fn manual_tick_skips_accumulator() {
        let mut clock = clock();
        let _ = clock.update(20.0);
        clock.tick();
        assert_eq!(clock.tick_count(), 1);
        assert!((clock.accumulator_ms() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn systems_run_each_tick_in_order() {
        let mut clock = clock();
        clock.register(Box::new(Spawner));
        let _ = clock.update(200.0);

        let ids: Vec<u64> = clock
            .state()
            .entities()
            .iter()
            .map(|entity| entity.id.get())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn snapshots_are_detached_copies() {
        let mut clock = clock();
        clock.register(Box::new(Spawner));
        let _ = clock.update(100.0);

        let snapshot = clock.snapshot();
        assert_eq!(snapshot.tick(), 1);
        assert!((snapshot.accumulator_ms() - (100.0 - 1000.0 / 15.0)).abs() < 1e-9);

        let _ = clock.update(1000.0);
        assert_eq!(snapshot.tick(), 1);
        assert_eq!(snapshot.state().entities().len(), 1);
        assert_eq!(clock.state().entities().len(), 16);
    }
}
