//! Inserts into the `data` value-history table.

use emulator_types::Observation;
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `data` table.
pub struct ObservationStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ObservationStore<'a> {
    /// Create a new observation store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one observation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, observation: &Observation) -> Result<(), DbError> {
        sqlx::query("INSERT INTO data (channelid, timevalue, value) VALUES ($1, $2, $3)")
            .bind(i64::from(observation.channel_id))
            .bind(observation.timestamp)
            .bind(observation.value)
            .execute(self.pool)
            .await?;

        tracing::trace!(
            channel_id = %observation.channel_id,
            value = observation.value,
            "Inserted observation"
        );
        Ok(())
    }
}
