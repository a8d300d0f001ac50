//! Storage backend selected at startup.
//!
//! The scheduler is generic over its sink; [`EngineSink`] lets the binary
//! pick the backend from configuration and still hand the scheduler a single
//! concrete type.

use emulator_core::sink::{LogSink, SinkError, StorageSink};
use emulator_db::PgStorageSink;
use emulator_types::{LatestValue, Observation};

/// The configured storage backend.
#[derive(Debug, Clone)]
pub enum EngineSink {
    /// Write to `PostgreSQL`.
    Postgres(PgStorageSink),
    /// Write to the log only.
    Log(LogSink),
}

impl EngineSink {
    /// Close the database pool, if any.
    pub async fn close(&self) {
        if let Self::Postgres(sink) = self {
            sink.pool().close().await;
        }
    }
}

impl StorageSink for EngineSink {
    async fn record_observation(&self, observation: &Observation) -> Result<(), SinkError> {
        match self {
            Self::Postgres(sink) => sink.record_observation(observation).await,
            Self::Log(sink) => sink.record_observation(observation).await,
        }
    }

    async fn upsert_latest(&self, latest: &LatestValue) -> Result<(), SinkError> {
        match self {
            Self::Postgres(sink) => sink.upsert_latest(latest).await,
            Self::Log(sink) => sink.upsert_latest(latest).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Postgres(sink) => sink.name(),
            Self::Log(sink) => sink.name(),
        }
    }
}
