//! Error types for the emulator binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup.

/// Top-level error for the emulator binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: emulator_core::config::ConfigError,
    },

    /// A channel could not be built.
    #[error("channel error: {source}")]
    Channel {
        /// The underlying channel error.
        #[from]
        source: emulator_core::channel::ChannelError,
    },

    /// The tick scheduler rejected its inputs.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: emulator_core::scheduler::SchedulerError,
    },

    /// Connecting to or migrating the database failed.
    #[error("database error: {source}")]
    Db {
        /// The underlying database error.
        #[from]
        source: emulator_db::DbError,
    },
}
