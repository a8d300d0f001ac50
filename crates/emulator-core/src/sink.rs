//! Storage collaborator interface.
//!
//! The scheduler hands every tick's values to a [`StorageSink`]. A sink
//! must tolerate concurrent calls from every channel of a tick and must
//! report failures as values, never by panicking, so one channel's failed
//! write cannot disturb the others.
//!
//! Retry policy, if any, belongs to the sink implementation. The scheduler
//! calls each operation exactly once per channel per tick.

use std::future::Future;

use emulator_types::{ChannelId, LatestValue, Observation};
use tracing::info;

/// Errors reported by a storage sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// Appending an observation failed.
    #[error("failed to record observation for channel {channel_id}: {message}")]
    Record {
        /// The channel whose write failed.
        channel_id: ChannelId,
        /// Description of the failure.
        message: String,
    },

    /// Upserting the latest value failed.
    #[error("failed to upsert latest value for channel {channel_id}: {message}")]
    Upsert {
        /// The channel whose write failed.
        channel_id: ChannelId,
        /// Description of the failure.
        message: String,
    },
}

impl SinkError {
    /// The channel the failed write belonged to.
    pub const fn channel_id(&self) -> ChannelId {
        match self {
            Self::Record { channel_id, .. } | Self::Upsert { channel_id, .. } => *channel_id,
        }
    }
}

/// Destination for per-tick channel values.
pub trait StorageSink: Send + Sync {
    /// Append one observation to the value history.
    fn record_observation(
        &self,
        observation: &Observation,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Insert or replace the channel's latest-value record.
    fn upsert_latest(
        &self,
        latest: &LatestValue,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// A sink that writes every value to the log and never fails.
///
/// Used for dry runs without a database.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl LogSink {
    /// Create a new log sink.
    pub const fn new() -> Self {
        Self
    }
}

impl StorageSink for LogSink {
    async fn record_observation(&self, observation: &Observation) -> Result<(), SinkError> {
        info!(
            channel_id = %observation.channel_id,
            timestamp = %observation.timestamp,
            value = observation.value,
            "observation"
        );
        Ok(())
    }

    async fn upsert_latest(&self, latest: &LatestValue) -> Result<(), SinkError> {
        tracing::debug!(
            channel_id = %latest.channel_id,
            value = latest.value,
            "latest value"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn sink_error_names_channel() {
        let err = SinkError::Upsert {
            channel_id: ChannelId::new(9),
            message: String::from("connection reset"),
        };
        assert_eq!(err.channel_id(), ChannelId::new(9));
        let msg = format!("{err}");
        assert!(msg.contains("channel 9"));
        assert!(msg.contains("connection reset"));
    }

    #[tokio::test]
    async fn log_sink_accepts_everything() {
        let sink = LogSink::new();
        let obs = Observation::new(ChannelId::new(1), Utc::now(), 3.5);
        assert!(sink.record_observation(&obs).await.is_ok());
        assert!(sink.upsert_latest(&obs.to_latest()).await.is_ok());
        assert_eq!(sink.name(), "log");
    }
}
