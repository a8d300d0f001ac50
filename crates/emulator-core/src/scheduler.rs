//! Periodic multi-channel tick loop.
//!
//! Every tick the [`TickScheduler`] runs one unit of work per channel:
//!
//! ```text
//! Tick N
//!   |
//!   +-- channel 1: Evolving -> Persisting (record + upsert) -> Idle
//!   +-- channel 2: Evolving -> Persisting (record + upsert) -> Idle
//!   +-- ...                                  (all concurrently)
//!   |
//!   +-- barrier: wait for every unit, success or failure
//!   +-- report to the TickObserver
//!   +-- sleep `period`, measured from the end of the barrier
//! ```
//!
//! Units run concurrently and in no particular order. Each unit borrows
//! exactly one channel mutably for the duration of the tick, so channel
//! state needs no locks. A storage failure is logged and recorded in the
//! tick report but never stops the tick, the loop, or other channels; the
//! channel's in-memory state has already advanced and is not rolled back.

use std::time::Duration;

use chrono::Utc;
use emulator_types::{ChannelId, Observation};
use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::channel::{Channel, ChannelPhase};
use crate::control::{EndReason, TickControl};
use crate::evolution::EvolutionError;
use crate::sink::{SinkError, StorageSink};

/// Errors that can occur when constructing a scheduler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// No channels were supplied.
    #[error("at least one channel is required")]
    NoChannels,

    /// The tick period is zero.
    #[error("tick period must be greater than zero")]
    ZeroPeriod,
}

/// What happened to one channel during one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelOutcome {
    /// The value was evolved and both storage writes succeeded.
    Persisted {
        /// The observation that was stored.
        observation: Observation,
    },

    /// The value was evolved but at least one storage write failed.
    PersistFailed {
        /// The observation that was handed to storage.
        observation: Observation,
        /// Error from appending the observation, if it failed.
        record_error: Option<SinkError>,
        /// Error from upserting the latest value, if it failed.
        upsert_error: Option<SinkError>,
    },

    /// The value could not be evolved; nothing was written.
    EvolutionFailed {
        /// The channel that failed.
        channel_id: ChannelId,
        /// The evolution error.
        error: EvolutionError,
    },
}

impl ChannelOutcome {
    /// The channel this outcome belongs to.
    pub const fn channel_id(&self) -> ChannelId {
        match self {
            Self::Persisted { observation } | Self::PersistFailed { observation, .. } => {
                observation.channel_id
            }
            Self::EvolutionFailed { channel_id, .. } => *channel_id,
        }
    }

    /// The observation produced this tick, if evolution succeeded.
    pub const fn observation(&self) -> Option<&Observation> {
        match self {
            Self::Persisted { observation } | Self::PersistFailed { observation, .. } => {
                Some(observation)
            }
            Self::EvolutionFailed { .. } => None,
        }
    }

    /// Whether the channel evolved and persisted cleanly.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Persisted { .. })
    }
}

/// Summary of one completed tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// When the tick started.
    pub started_at: Instant,
    /// Time from tick start to the end of the barrier.
    pub elapsed: Duration,
    /// One outcome per channel, in channel order.
    pub outcomes: Vec<ChannelOutcome>,
}

impl TickReport {
    /// Number of channels that evolved and persisted cleanly.
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of channels with any failure this tick.
    pub fn failure_count(&self) -> usize {
        self.outcomes.len().saturating_sub(self.success_count())
    }
}

/// Result of a tick loop that ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the loop ended.
    pub end_reason: EndReason,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick's barrier.
pub trait TickObserver: Send {
    /// Called once per completed tick.
    fn on_tick(&mut self, report: &TickReport);
}

/// A tick observer that ignores every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl TickObserver for NoOpObserver {
    fn on_tick(&mut self, _report: &TickReport) {}
}

/// Drives evolve-then-persist cycles for every channel at a fixed cadence.
#[derive(Debug)]
pub struct TickScheduler<S> {
    channels: Vec<Channel>,
    period: Duration,
    sink: S,
    tick: u64,
}

impl<S: StorageSink> TickScheduler<S> {
    /// Create a scheduler over a fixed set of channels.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoChannels`] if `channels` is empty or
    /// [`SchedulerError::ZeroPeriod`] if `period` is zero.
    pub fn new(channels: Vec<Channel>, period: Duration, sink: S) -> Result<Self, SchedulerError> {
        if channels.is_empty() {
            return Err(SchedulerError::NoChannels);
        }
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }
        Ok(Self {
            channels,
            period,
            sink,
            tick: 0,
        })
    }

    /// The channels, in configuration order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// The storage sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Run one tick: every channel concurrently, then the barrier.
    ///
    /// Returns once every channel's unit has finished.
    pub async fn run_tick(&mut self) -> TickReport {
        self.tick = self.tick.saturating_add(1);
        let tick = self.tick;
        let started_at = Instant::now();

        let sink = &self.sink;
        let units = self
            .channels
            .iter_mut()
            .map(|channel| run_unit(tick, channel, sink));
        let outcomes = join_all(units).await;

        let report = TickReport {
            tick,
            started_at,
            elapsed: started_at.elapsed(),
            outcomes,
        };

        debug!(
            tick,
            channels = report.outcomes.len(),
            failures = report.failure_count(),
            elapsed_ms = report.elapsed.as_millis(),
            "Tick complete"
        );

        report
    }

    /// Run the tick loop until the control says to stop.
    ///
    /// With an unbounded control and no stop request this never returns.
    /// The sleep after the final tick of a bounded run is skipped.
    pub async fn run(
        &mut self,
        control: &TickControl,
        observer: &mut dyn TickObserver,
    ) -> RunSummary {
        let mut total_ticks: u64 = 0;

        info!(
            channels = self.channels.len(),
            period_ms = self.period.as_millis(),
            max_ticks = control.max_ticks(),
            sink = self.sink.name(),
            "Tick loop starting"
        );

        loop {
            // --- Check stop request (before tick) ---
            if control.is_stop_requested() {
                info!(total_ticks, "Stop requested");
                return RunSummary {
                    end_reason: EndReason::StopRequested,
                    total_ticks,
                };
            }

            // --- Execute tick ---
            let report = self.run_tick().await;
            total_ticks = total_ticks.saturating_add(1);

            // --- Notify observer ---
            observer.on_tick(&report);

            // --- Check tick limit (after tick) ---
            if control.tick_limit_reached(total_ticks) {
                info!(
                    total_ticks,
                    max_ticks = control.max_ticks(),
                    "Tick limit reached"
                );
                return RunSummary {
                    end_reason: EndReason::TickLimitReached,
                    total_ticks,
                };
            }

            // --- Sleep for tick period ---
            tokio::select! {
                () = tokio::time::sleep(self.period) => {}
                () = control.stopped() => {
                    debug!(tick = report.tick, "Inter-tick sleep interrupted by stop request");
                }
            }
        }
    }
}

/// One channel's work for one tick.
async fn run_unit<S: StorageSink>(tick: u64, channel: &mut Channel, sink: &S) -> ChannelOutcome {
    let channel_id = channel.id();

    channel.set_phase(ChannelPhase::Evolving);
    let value = match channel.evolve() {
        Ok(value) => value,
        Err(e) => {
            channel.set_phase(ChannelPhase::Idle);
            error!(tick, channel_id = %channel_id, error = %e, "Channel evolution failed");
            return ChannelOutcome::EvolutionFailed {
                channel_id,
                error: e,
            };
        }
    };

    channel.set_phase(ChannelPhase::Persisting);
    let observation = Observation::new(channel_id, Utc::now(), value);
    let latest = observation.to_latest();
    let (recorded, upserted) = tokio::join!(
        sink.record_observation(&observation),
        sink.upsert_latest(&latest),
    );
    channel.set_phase(ChannelPhase::Idle);

    let record_error = recorded.err();
    let upsert_error = upserted.err();

    if record_error.is_none() && upsert_error.is_none() {
        debug!(tick, channel_id = %channel_id, value, "Channel persisted");
        return ChannelOutcome::Persisted { observation };
    }

    if let Some(ref e) = record_error {
        warn!(tick, channel_id = %channel_id, error = %e, "Failed to record observation");
    }
    if let Some(ref e) = upsert_error {
        warn!(tick, channel_id = %channel_id, error = %e, "Failed to upsert latest value");
    }

    ChannelOutcome::PersistFailed {
        observation,
        record_error,
        upsert_error,
    }
}

/// Log the end of a tick loop run.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        reason = ?summary.end_reason,
        total_ticks = summary.total_ticks,
        "Tick loop ended"
    );
}
