//! Upserts into the `latestinfo` table.
//!
//! `latestinfo` holds exactly one row per channel. A channel that has never
//! been written gets its row on the first upsert; later upserts replace the
//! value and timestamp.

use emulator_types::LatestValue;
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `latestinfo` table.
pub struct LatestStore<'a> {
    pool: &'a PgPool,
}

impl<'a> LatestStore<'a> {
    /// Create a new latest-value store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the latest value of a channel.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails.
    pub async fn upsert(&self, latest: &LatestValue) -> Result<(), DbError> {
        let result = sqlx::query(
            r"INSERT INTO latestinfo (channelid, value, timevalue)
              VALUES ($1, $2, $3)
              ON CONFLICT (channelid)
              DO UPDATE SET value = EXCLUDED.value, timevalue = EXCLUDED.timevalue",
        )
        .bind(i64::from(latest.channel_id))
        .bind(latest.value)
        .bind(latest.timestamp)
        .execute(self.pool)
        .await?;

        tracing::trace!(
            channel_id = %latest.channel_id,
            rows = result.rows_affected(),
            "Upserted latest value"
        );
        Ok(())
    }
}
