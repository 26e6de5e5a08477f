#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the lockstep simulation.
//!
//! This crate defines the message surface that connects the simulation
//! worker with its consumer. The consumer submits [`Message::Init`] and
//! [`Message::Stop`] to drive the worker's lifecycle, and the worker answers
//! with [`Message::SyncState`] values carrying immutable [`SyncSnapshot`]s.
//! Every type here is an owned value that can be encoded with [`codec`] and
//! moved across a thread boundary without sharing memory.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod codec;

/// Logical ticks performed per second of simulated time.
pub const LOGIC_TICK_RATE: u32 = 15;

/// Interval between worker heartbeats, in milliseconds.
///
/// Faster than the logic rate so the worker stays responsive to messages
/// even though logic only advances at [`LOGIC_TICK_RATE`].
pub const HEARTBEAT_INTERVAL_MS: u64 = 16;

/// Maximum number of ticks a single clock update may perform.
pub const MAX_CATCHUP_TICKS: u32 = 100;

/// Number of ticks between consecutive snapshot emissions.
pub const SNAPSHOT_CADENCE: u64 = 15;

/// Outbound frames the transport buffers before dropping snapshots.
pub const OUTBOUND_BUFFER: usize = 8;

/// Messages exchanged between the simulation worker and its consumer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Requests that the worker start simulating. Ignored while running.
    Init,
    /// Requests that the worker halt and discard its simulation. Ignored
    /// while idle.
    Stop,
    /// Periodic copy of the simulation, sent from the worker to the consumer.
    SyncState(SyncSnapshot),
}

impl Message {
    /// Protocol tag naming the message variant.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Stop => "STOP",
            Self::SyncState(_) => "SYNC_STATE",
        }
    }
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Simulated entity. Only the identifier is modelled so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Identifier assigned to the entity.
    pub id: EntityId,
}

impl Entity {
    /// Creates an entity carrying the provided identifier.
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self { id }
    }
}

/// Authoritative simulation data: the tick counter and the entity list.
///
/// Owned by the simulation clock and only mutated while ticking. Everything
/// handed to other parties is a clone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationState {
    tick: u64,
    entities: Vec<Entity>,
}

impl SimulationState {
    /// Creates the empty state used when a simulation starts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of logical ticks performed so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Entities in insertion order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Mutable access to the entity list for systems running inside a tick.
    pub fn entities_mut(&mut self) -> &mut Vec<Entity> {
        &mut self.entities
    }

    /// Increments the tick counter, returning the new value.
    pub fn advance_tick(&mut self) -> u64 {
        self.tick = self.tick.saturating_add(1);
        self.tick
    }
}

/// Immutable copy of the simulation taken between ticks.
///
/// Holds no reference to live state, so it can be moved to another thread
/// and inspected freely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    tick: u64,
    accumulator_ms: f64,
    state: SimulationState,
}

impl SyncSnapshot {
    /// Captures a snapshot from its parts.
    #[must_use]
    pub fn new(tick: u64, accumulator_ms: f64, state: SimulationState) -> Self {
        Self {
            tick,
            accumulator_ms,
            state,
        }
    }

    /// Logical tick at which the snapshot was taken.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Time accumulated toward the next tick, in milliseconds.
    #[must_use]
    pub const fn accumulator_ms(&self) -> f64 {
        self.accumulator_ms
    }

    /// Copied simulation state.
    #[must_use]
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Render interpolation factor in `[0, 1)` for the provided step time.
    #[must_use]
    pub fn interpolation_alpha(&self, step_time_ms: f64) -> f64 {
        if step_time_ms <= 0.0 {
            return 0.0;
        }
        self.accumulator_ms / step_time_ms
    }

    /// Consumes the snapshot, yielding the copied state.
    #[must_use]
    pub fn into_state(self) -> SimulationState {
        self.state
    }
}

/// Timing configuration for the simulation clock and its worker.
///
/// Values are fixed when the worker starts; nothing is negotiated at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Logical ticks per second.
    pub logic_tick_rate: u32,
    /// Interval between heartbeats, in milliseconds.
    pub heartbeat_ms: u64,
    /// Maximum ticks performed by one clock update before remaining time is
    /// discarded.
    pub max_catchup_ticks: u32,
    /// Ticks between consecutive snapshot emissions.
    pub snapshot_cadence: u64,
    /// Outbound frames buffered by the worker transport.
    pub outbound_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            logic_tick_rate: LOGIC_TICK_RATE,
            heartbeat_ms: HEARTBEAT_INTERVAL_MS,
            max_catchup_ticks: MAX_CATCHUP_TICKS,
            snapshot_cadence: SNAPSHOT_CADENCE,
            outbound_buffer: OUTBOUND_BUFFER,
        }
    }
}

impl SyncConfig {
    /// Duration of one logical tick, in milliseconds.
    #[must_use]
    pub fn step_time_ms(&self) -> f64 {
        1000.0 / f64::from(self.logic_tick_rate)
    }

    /// Interval between heartbeats.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    /// Checks that the configuration describes a runnable simulation.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logic_tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.heartbeat_ms == 0 {
            return Err(ConfigError::ZeroHeartbeat);
        }
        let step_time_ms = self.step_time_ms();
        if self.heartbeat_ms as f64 >= step_time_ms {
            return Err(ConfigError::HeartbeatTooSlow {
                heartbeat_ms: self.heartbeat_ms,
                step_time_ms,
            });
        }
        if self.max_catchup_ticks == 0 {
            return Err(ConfigError::ZeroCatchUpCap);
        }
        if self.snapshot_cadence == 0 {
            return Err(ConfigError::ZeroSnapshotCadence);
        }
        if self.outbound_buffer == 0 {
            return Err(ConfigError::ZeroOutboundBuffer);
        }
        Ok(())
    }
}

/// Reasons a [`SyncConfig`] may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The logic tick rate was zero.
    #[error("logic tick rate must be positive")]
    ZeroTickRate,
    /// The heartbeat interval was zero.
    #[error("heartbeat interval must be positive")]
    ZeroHeartbeat,
    /// The heartbeat does not fire more often than the logic ticks.
    #[error("heartbeat of {heartbeat_ms}ms must be shorter than the {step_time_ms:.3}ms step")]
    HeartbeatTooSlow {
        /// Configured heartbeat interval in milliseconds.
        heartbeat_ms: u64,
        /// Step time derived from the tick rate in milliseconds.
        step_time_ms: f64,
    },
    /// The catch-up cap was zero.
    #[error("catch-up tick cap must be positive")]
    ZeroCatchUpCap,
    /// The snapshot cadence was zero.
    #[error("snapshot cadence must be positive")]
    ZeroSnapshotCadence,
    /// The outbound buffer was zero.
    #[error("outbound buffer must hold at least one frame")]
    ZeroOutboundBuffer,
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, Entity, EntityId, Message, SimulationState, SyncConfig, SyncSnapshot,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    fn populated_state() -> SimulationState {
        let mut state = SimulationState::new();
        state.entities_mut().push(Entity::new(EntityId::new(7)));
        state.entities_mut().push(Entity::new(EntityId::new(11)));
        let _ = state.advance_tick();
        state
    }

    #[test]
    fn state_starts_empty_and_advances() {
        let mut state = SimulationState::new();
        assert_eq!(state.tick(), 0);
        assert!(state.entities().is_empty());
        assert_eq!(state.advance_tick(), 1);
        assert_eq!(state.tick(), 1);
    }

    #[test]
    fn snapshot_state_is_a_detached_copy() {
        let mut live = populated_state();
        let snapshot = SyncSnapshot::new(live.tick(), 12.5, live.clone());

        live.entities_mut().clear();
        let _ = live.advance_tick();

        assert_eq!(snapshot.tick(), 1);
        assert_eq!(snapshot.state().entities().len(), 2);
        assert_eq!(snapshot.into_state().tick(), 1);
    }

    #[test]
    fn interpolation_alpha_is_fraction_of_step() {
        let snapshot = SyncSnapshot::new(3, 33.0, SimulationState::new());
        assert!((snapshot.interpolation_alpha(66.0) - 0.5).abs() < f64::EPSILON);
        assert_eq!(snapshot.interpolation_alpha(0.0), 0.0);
    }

    #[test]
    fn messages_round_trip_through_bincode() {
        assert_round_trip(&Message::Init);
        assert_round_trip(&Message::Stop);
        assert_round_trip(&Message::SyncState(SyncSnapshot::new(
            1,
            4.25,
            populated_state(),
        )));
    }

    #[test]
    fn message_tags_match_protocol_names() {
        assert_eq!(Message::Init.tag(), "INIT");
        assert_eq!(Message::Stop.tag(), "STOP");
        let sync = Message::SyncState(SyncSnapshot::new(0, 0.0, SimulationState::new()));
        assert_eq!(sync.tag(), "SYNC_STATE");
    }

    #[test]
    fn default_config_matches_published_constants() {
        let config = SyncConfig::default();
        assert_eq!(config.logic_tick_rate, 15);
        assert_eq!(config.heartbeat_ms, 16);
        assert_eq!(config.max_catchup_ticks, 100);
        assert_eq!(config.snapshot_cadence, 15);
        assert!((config.step_time_ms() - 1000.0 / 15.0).abs() < f64::EPSILON);
        assert_eq!(config.validate(), Ok(()));
        assert_round_trip(&config);
    }

    #[test]
    fn validation_rejects_unrunnable_configs() {
        let base = SyncConfig::default();

        let zero_rate = SyncConfig {
            logic_tick_rate: 0,
            ..base
        };
        assert_eq!(zero_rate.validate(), Err(ConfigError::ZeroTickRate));

        let slow_heartbeat = SyncConfig {
            heartbeat_ms: 70,
            ..base
        };
        assert!(matches!(
            slow_heartbeat.validate(),
            Err(ConfigError::HeartbeatTooSlow {
                heartbeat_ms: 70,
                ..
            })
        ));

        let zero_cap = SyncConfig {
            max_catchup_ticks: 0,
            ..base
        };
        assert_eq!(zero_cap.validate(), Err(ConfigError::ZeroCatchUpCap));

        let zero_cadence = SyncConfig {
            snapshot_cadence: 0,
            ..base
        };
        assert_eq!(zero_cadence.validate(), Err(ConfigError::ZeroSnapshotCadence));
    }
}
