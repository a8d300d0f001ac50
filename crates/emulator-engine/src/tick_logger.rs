//! Tick observer that logs a one-line summary per tick.
//!
//! Failed channels are already logged individually by the scheduler; this
//! adds the per-tick totals and keeps running counts for the shutdown line.

use emulator_core::scheduler::{TickObserver, TickReport};
use tracing::{info, warn};

/// Logs every tick report and accumulates totals.
#[derive(Debug, Default)]
pub struct TickLogger {
    persisted: u64,
    failed: u64,
}

impl TickLogger {
    /// Create a logger with zeroed totals.
    pub const fn new() -> Self {
        Self {
            persisted: 0,
            failed: 0,
        }
    }

    /// Channel-ticks that persisted cleanly so far.
    pub const fn persisted(&self) -> u64 {
        self.persisted
    }

    /// Channel-ticks with any failure so far.
    pub const fn failed(&self) -> u64 {
        self.failed
    }
}

impl TickObserver for TickLogger {
    fn on_tick(&mut self, report: &TickReport) {
        let ok = u64::try_from(report.success_count()).unwrap_or(u64::MAX);
        let failed = u64::try_from(report.failure_count()).unwrap_or(u64::MAX);
        self.persisted = self.persisted.saturating_add(ok);
        self.failed = self.failed.saturating_add(failed);

        if failed == 0 {
            info!(
                tick = report.tick,
                channels = report.outcomes.len(),
                elapsed_ms = report.elapsed.as_millis(),
                "Tick persisted"
            );
        } else {
            warn!(
                tick = report.tick,
                channels = report.outcomes.len(),
                failed,
                elapsed_ms = report.elapsed.as_millis(),
                "Tick completed with failures"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use emulator_core::scheduler::ChannelOutcome;
    use emulator_core::sink::SinkError;
    use emulator_types::{ChannelId, Observation};
    use tokio::time::Instant;

    use super::*;

    fn report(tick: u64, failing: bool) -> TickReport {
        let ok = Observation::new(ChannelId::new(1), Utc::now(), 1.0);
        let other = Observation::new(ChannelId::new(2), Utc::now(), 2.0);
        let second = if failing {
            ChannelOutcome::PersistFailed {
                observation: other,
                record_error: Some(SinkError::Record {
                    channel_id: ChannelId::new(2),
                    message: String::from("timeout"),
                }),
                upsert_error: None,
            }
        } else {
            ChannelOutcome::Persisted { observation: other }
        };
        TickReport {
            tick,
            started_at: Instant::now(),
            elapsed: Duration::from_millis(3),
            outcomes: vec![ChannelOutcome::Persisted { observation: ok }, second],
        }
    }

    #[test]
    fn totals_accumulate() {
        let mut logger = TickLogger::new();
        logger.on_tick(&report(1, false));
        logger.on_tick(&report(2, true));
        assert_eq!(logger.persisted(), 3);
        assert_eq!(logger.failed(), 1);
    }
}
