//! `PostgreSQL` storage for the channel emulator.
//!
//! Every tick each channel produces one observation. This crate writes it
//! to two tables:
//!
//! ```text
//! Observation
//!     |
//!     +-- ObservationStore --> data        (append-only value history)
//!     +-- LatestStore      --> latestinfo  (one row per channel, upserted)
//! ```
//!
//! [`PgStorageSink`] adapts both stores to the
//! [`StorageSink`](emulator_core::sink::StorageSink) interface the tick
//! scheduler calls.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool, configuration, migrations
//! - [`observation_store`] -- Inserts into the `data` table
//! - [`latest_store`] -- Upserts into the `latestinfo` table
//! - [`sink`] -- [`PgStorageSink`]
//! - [`error`] -- Shared error types

pub mod error;
pub mod latest_store;
pub mod observation_store;
pub mod postgres;
pub mod sink;

// Re-export primary types for convenience.
pub use error::DbError;
pub use latest_store::LatestStore;
pub use observation_store::ObservationStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use sink::PgStorageSink;
