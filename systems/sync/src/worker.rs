//! Dedicated simulation thread speaking the framed message protocol.
//!
//! The thread owns its [`SyncChannel`] outright. The consumer talks to it
//! only through encoded frames over bounded channels: commands travel
//! inbound, snapshots travel outbound. When the outbound
//! buffer is full the newest snapshot is dropped rather than stalling the
//! simulation, since the next one supersedes it anyway.

use std::{
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use lockstep_core::{
    codec::{self, CodecError},
    ConfigError, Message, SyncConfig,
};
use thiserror::Error;

use crate::{ClockFactory, Scheduler, SyncChannel};

const THREAD_NAME: &str = "lockstep-sim";

/// Inbound frames queued before [`SimulationWorker::post`] blocks.
const INBOUND_BUFFER: usize = 64;

/// Failures surfaced by [`SimulationWorker`].
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The configuration cannot drive a simulation.
    #[error("invalid simulation config: {0}")]
    Config(#[from] ConfigError),
    /// The worker thread could not be started.
    #[error("failed to spawn simulation thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// A message could not be framed or a frame could not be parsed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The worker thread is no longer running.
    #[error("simulation thread disconnected")]
    Disconnected,
    /// The worker thread panicked.
    #[error("simulation thread panicked")]
    Panicked,
}

/// Heartbeat source backed by a crossbeam ticker channel.
///
/// While idle the ticker is a channel that never delivers, so replacing it
/// on cancel guarantees no heartbeat fires after a stop.
#[derive(Debug)]
pub struct TickerScheduler {
    ticker: Receiver<Instant>,
    active: bool,
}

impl TickerScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ticker: channel::never(),
            active: false,
        }
    }

    /// Channel yielding one instant per heartbeat.
    #[must_use]
    pub fn ticker(&self) -> &Receiver<Instant> {
        &self.ticker
    }
}

impl Default for TickerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TickerScheduler {
    fn start(&mut self, interval: Duration) {
        self.ticker = channel::tick(interval);
        self.active = true;
    }

    fn cancel(&mut self) {
        self.ticker = channel::never();
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Handle to a simulation running on its own thread.
///
/// Dropping the handle closes the inbound channel and joins the thread.
#[derive(Debug)]
pub struct SimulationWorker {
    inbound: Option<Sender<Vec<u8>>>,
    outbound: Receiver<Vec<u8>>,
    thread: Option<JoinHandle<()>>,
}

impl SimulationWorker {
    /// Spawns an idle worker whose sessions use bare clocks.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or the thread cannot start.
    pub fn spawn(config: SyncConfig) -> Result<Self, WorkerError> {
        Self::spawn_with(config, Box::new(lockstep_world::SimulationClock::new))
    }

    /// Spawns an idle worker that prepares each session's clock with
    /// `clock_factory`.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or the thread cannot start.
    pub fn spawn_with(
        config: SyncConfig,
        clock_factory: ClockFactory,
    ) -> Result<Self, WorkerError> {
        config.validate()?;

        let (inbound_tx, inbound_rx) = channel::bounded(INBOUND_BUFFER);
        let (outbound_tx, outbound_rx) = channel::bounded(config.outbound_buffer);
        let sync = SyncChannel::with_clock_factory(config, TickerScheduler::new(), clock_factory);

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || run(sync, &inbound_rx, &outbound_tx))
            .map_err(WorkerError::Spawn)?;

        Ok(Self {
            inbound: Some(inbound_tx),
            outbound: outbound_rx,
            thread: Some(thread),
        })
    }

    /// Encodes and submits a message to the worker.
    ///
    /// # Errors
    ///
    /// Fails when encoding fails or the worker has exited.
    pub fn post(&self, message: &Message) -> Result<(), WorkerError> {
        self.post_frame(codec::encode(message)?)
    }

    /// Submits a raw frame, blocking while the inbound buffer is full.
    ///
    /// Frames the worker cannot decode are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Disconnected`] when the worker has exited.
    pub fn post_frame(&self, frame: Vec<u8>) -> Result<(), WorkerError> {
        let inbound = self.inbound.as_ref().ok_or(WorkerError::Disconnected)?;
        inbound
            .send(frame)
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Waits up to `timeout` for the next outbound message.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    ///
    /// # Errors
    ///
    /// Fails when the worker has exited or sent an undecodable frame.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Message>, WorkerError> {
        match self.outbound.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(codec::decode(&frame)?)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    /// Closes the inbound channel and waits for the thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Panicked`] if the thread panicked.
    pub fn shutdown(mut self) -> Result<(), WorkerError> {
        self.join()
    }

    fn join(&mut self) -> Result<(), WorkerError> {
        drop(self.inbound.take());
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| WorkerError::Panicked),
            None => Ok(()),
        }
    }
}

impl Drop for SimulationWorker {
    fn drop(&mut self) {
        if let Err(error) = self.join() {
            tracing::error!(%error, "simulation thread did not exit cleanly");
        }
    }
}

fn run(
    mut sync: SyncChannel<TickerScheduler>,
    inbound: &Receiver<Vec<u8>>,
    outbound: &Sender<Vec<u8>>,
) {
    let epoch = Instant::now();
    let now_ms = || epoch.elapsed().as_secs_f64() * 1000.0;
    tracing::info!("simulation worker started");

    loop {
        let ticker = sync.scheduler().ticker().clone();
        let keep_running = channel::select! {
            recv(inbound) -> frame => match frame {
                Ok(frame) => {
                    match codec::decode(&frame) {
                        Ok(message) => sync.handle(message, now_ms()),
                        Err(error) => tracing::debug!(%error, "ignoring undecodable frame"),
                    }
                    true
                }
                Err(_) => false,
            },
            recv(ticker) -> _ => match sync.heartbeat(now_ms()) {
                Some(message) => publish(outbound, &message),
                None => true,
            },
        };
        if !keep_running {
            break;
        }
    }

    tracing::info!("simulation worker exiting");
}

/// Sends a message to the consumer, returning `false` once nobody listens.
fn publish(outbound: &Sender<Vec<u8>>, message: &Message) -> bool {
    let frame = match codec::encode(message) {
        Ok(frame) => frame,
        Err(error) => {
            tracing::error!(%error, "failed to encode outbound message");
            return true;
        }
    };

    match outbound.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::debug!(message = message.tag(), "outbound buffer full, dropping message");
            true
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}
