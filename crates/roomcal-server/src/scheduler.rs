//! Background scheduler for refresh cycles.
//!
//! The scheduler runs one cycle immediately, then one per interval. Cycles
//! never overlap: commands received while a cycle runs are handled after it
//! finishes. It supports:
//! - A fixed refresh interval
//! - Immediate refresh on command (SIGHUP)
//! - Halting after a failed cycle, for fail-fast deployments

use std::fmt::Display;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between cycle starts.
    pub refresh_interval: Duration,
    /// Stop the loop after the first failed cycle.
    pub halt_on_failure: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(300), // 5 minutes
            halt_on_failure: false,
        }
    }
}

impl SchedulerConfig {
    /// Creates a new scheduler config with the given refresh interval.
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            ..Default::default()
        }
    }

    /// Builder: stop after the first failed cycle.
    pub fn with_halt_on_failure(mut self, halt: bool) -> Self {
        self.halt_on_failure = halt;
        self
    }
}

/// Commands that can be sent to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Run a cycle now. The periodic schedule is unaffected.
    SyncNow,
    /// Stop the scheduler.
    Stop,
}

/// Why the scheduler loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerExit {
    /// Stopped on command, or every handle was dropped.
    Stopped,
    /// A cycle failed while `halt_on_failure` was set.
    Halted(String),
}

/// The scheduler drives periodic refresh cycles.
pub struct Scheduler {
    config: SchedulerConfig,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    /// Creates a new scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
        }
    }

    /// Runs the scheduler loop with the given cycle function.
    ///
    /// The cycle function should return `Ok` on success or an error
    /// describing the failure. The loop returns once stopped or halted.
    pub async fn run<F, Fut, T, E>(self, cycle_fn: F) -> SchedulerExit
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<T, E>> + Send,
        E: Display,
    {
        let Self {
            config,
            command_tx,
            mut command_rx,
        } = self;
        // Only handles keep the channel open.
        drop(command_tx);

        info!(
            interval_secs = config.refresh_interval.as_secs(),
            halt_on_failure = config.halt_on_failure,
            "Scheduler started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now(), config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("Refresh interval elapsed");
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::SyncNow) => {
                            debug!("Received SyncNow command");
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("Scheduler stopping");
                            return SchedulerExit::Stopped;
                        }
                    }
                }
            }

            if let Err(e) = cycle_fn().await {
                let message = e.to_string();
                if config.halt_on_failure {
                    error!(error = %message, "Refresh cycle failed, halting scheduler");
                    return SchedulerExit::Halted(message);
                }
                warn!(error = %message, "Refresh cycle failed");
            }
        }
    }
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Triggers an immediate cycle.
    pub async fn sync_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::SyncNow).await
    }

    /// Stops the scheduler.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns true if the scheduler loop has ended.
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }
}
