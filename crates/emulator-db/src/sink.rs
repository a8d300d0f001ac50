//! [`StorageSink`] backed by `PostgreSQL`.
//!
//! Each call is a single statement on a pooled connection, so concurrent
//! calls from every channel of a tick are safe. Failures are returned to the
//! scheduler as [`SinkError`] values; nothing is retried here.

use emulator_core::sink::{SinkError, StorageSink};
use emulator_types::{LatestValue, Observation};

use crate::latest_store::LatestStore;
use crate::observation_store::ObservationStore;
use crate::postgres::PostgresPool;

/// Writes observations to `data` and latest values to `latestinfo`.
#[derive(Debug, Clone)]
pub struct PgStorageSink {
    pool: PostgresPool,
}

impl PgStorageSink {
    /// Create a sink over a connected pool.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    pub const fn pool(&self) -> &PostgresPool {
        &self.pool
    }
}

impl StorageSink for PgStorageSink {
    async fn record_observation(&self, observation: &Observation) -> Result<(), SinkError> {
        ObservationStore::new(self.pool.pool())
            .insert(observation)
            .await
            .map_err(|e| SinkError::Record {
                channel_id: observation.channel_id,
                message: e.to_string(),
            })
    }

    async fn upsert_latest(&self, latest: &LatestValue) -> Result<(), SinkError> {
        LatestStore::new(self.pool.pool())
            .upsert(latest)
            .await
            .map_err(|e| SinkError::Upsert {
                channel_id: latest.channel_id,
                message: e.to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
