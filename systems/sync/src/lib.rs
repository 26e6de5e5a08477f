#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Message-driven lifecycle around the simulation clock.
//!
//! [`SyncChannel`] is the worker-side state machine. It reacts to
//! [`Message::Init`] and [`Message::Stop`], drives the clock from heartbeats
//! supplied by a [`Scheduler`], and yields a [`Message::SyncState`] whenever
//! the tick counter crosses a multiple of the snapshot cadence. The channel
//! never reads a clock itself: callers pass the current time explicitly, so
//! the whole lifecycle can be exercised without real threads or timers.
//!
//! [`worker::SimulationWorker`] hosts a channel on a dedicated thread.

use std::time::Duration;

use lockstep_core::{Message, SyncConfig};
use lockstep_world::SimulationClock;

pub mod worker;

/// Timer that delivers heartbeats to a [`SyncChannel`].
pub trait Scheduler {
    /// Begins delivering heartbeats at the provided interval.
    fn start(&mut self, interval: Duration);

    /// Stops delivering heartbeats. No heartbeat may fire afterwards.
    fn cancel(&mut self);

    /// Reports whether heartbeats are currently scheduled.
    fn is_active(&self) -> bool;
}

/// Builds the clock for each new simulation session.
///
/// Lets callers register tick systems before the first heartbeat.
pub type ClockFactory = Box<dyn FnMut(&SyncConfig) -> SimulationClock + Send>;

#[derive(Debug)]
enum Phase {
    Idle,
    Running(Session),
}

#[derive(Debug)]
struct Session {
    clock: SimulationClock,
    last_heartbeat_ms: f64,
    next_sync_tick: u64,
}

/// Worker-side state machine translating messages into clock activity.
pub struct SyncChannel<S: Scheduler> {
    config: SyncConfig,
    scheduler: S,
    clock_factory: ClockFactory,
    phase: Phase,
}

impl<S: Scheduler> SyncChannel<S> {
    /// Creates an idle channel whose sessions use bare clocks.
    #[must_use]
    pub fn new(config: SyncConfig, scheduler: S) -> Self {
        Self::with_clock_factory(config, scheduler, Box::new(SimulationClock::new))
    }

    /// Creates an idle channel that builds each session's clock with
    /// `clock_factory`.
    #[must_use]
    pub fn with_clock_factory(
        config: SyncConfig,
        scheduler: S,
        clock_factory: ClockFactory,
    ) -> Self {
        Self {
            config,
            scheduler,
            clock_factory,
            phase: Phase::Idle,
        }
    }

    /// Applies an inbound message received at `now_ms`.
    ///
    /// `Init` while running and `Stop` while idle are ignored, as is any
    /// `SyncState` sent toward the worker.
    pub fn handle(&mut self, message: Message, now_ms: f64) {
        match message {
            Message::Init if !self.is_running() => self.start(now_ms),
            Message::Stop if self.is_running() => self.stop(),
            message => {
                tracing::debug!(
                    message = message.tag(),
                    running = self.is_running(),
                    "ignoring message"
                );
            }
        }
    }

    fn start(&mut self, now_ms: f64) {
        let clock = (self.clock_factory)(&self.config);
        self.scheduler.start(self.config.heartbeat_interval());
        self.phase = Phase::Running(Session {
            clock,
            last_heartbeat_ms: now_ms,
            next_sync_tick: self.config.snapshot_cadence,
        });
        tracing::info!(
            tick_rate = self.config.logic_tick_rate,
            heartbeat_ms = self.config.heartbeat_ms,
            "simulation started"
        );
    }

    fn stop(&mut self) {
        self.scheduler.cancel();
        if let Phase::Running(session) = std::mem::replace(&mut self.phase, Phase::Idle) {
            tracing::info!(tick = session.clock.tick_count(), "simulation stopped");
        }
    }

    /// Advances the clock by the time elapsed since the previous heartbeat.
    ///
    /// Returns a snapshot message when the tick counter reaches the next
    /// multiple of the snapshot cadence. A catch-up burst that crosses several
    /// multiples at once yields a single snapshot of the latest state.
    /// Heartbeats arriving while idle do nothing.
    pub fn heartbeat(&mut self, now_ms: f64) -> Option<Message> {
        let Phase::Running(session) = &mut self.phase else {
            tracing::trace!("heartbeat while idle");
            return None;
        };

        let delta_ms = now_ms - session.last_heartbeat_ms;
        session.last_heartbeat_ms = now_ms;
        let _ = session.clock.update(delta_ms);

        let tick = session.clock.tick_count();
        if tick < session.next_sync_tick {
            return None;
        }

        let cadence = self.config.snapshot_cadence;
        session.next_sync_tick = (tick / cadence + 1) * cadence;
        tracing::debug!(tick, "emitting snapshot");
        Some(Message::SyncState(session.clock.snapshot()))
    }

    /// Reports whether a simulation session is active.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    /// Clock of the active session, if any.
    #[must_use]
    pub fn clock(&self) -> Option<&SimulationClock> {
        match &self.phase {
            Phase::Running(session) => Some(&session.clock),
            Phase::Idle => None,
        }
    }

    /// Scheduler driving the heartbeats.
    #[must_use]
    pub const fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Configuration applied to every session.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl<S: Scheduler + std::fmt::Debug> std::fmt::Debug for SyncChannel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncChannel")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler)
            .field("phase", &self.phase)
            .finish()
    }
}
