//! Shared type definitions for the channel emulator.
//!
//! This crate is the single source of truth for the data model used across
//! the emulator workspace: immutable channel definitions loaded at startup,
//! the mutable per-channel simulation state, and the observation records
//! handed to storage each tick.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe channel identifier
//! - [`channel`] -- Channel definitions, kind-specific parameters, validation
//! - [`state`] -- Mutable per-channel simulation state
//! - [`observation`] -- Per-tick observation and latest-value records

pub mod channel;
pub mod ids;
pub mod observation;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use channel::{
    BooleanParams, ChannelDefinition, ChannelKind, NumericParams, ValidationError, validate_all,
};
pub use ids::ChannelId;
pub use observation::{LatestValue, Observation};
pub use state::{BooleanState, ChannelState, NumericState};
