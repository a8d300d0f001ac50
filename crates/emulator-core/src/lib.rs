//! Channel evolution, tick scheduling, and configuration for the emulator.
//!
//! This crate owns the per-channel evolution rules and the periodic loop
//! that drives them: every tick each channel evolves and hands its value to
//! storage, all channels concurrently, then the loop waits for the slowest
//! one and sleeps for the configured period.
//!
//! # Modules
//!
//! - [`evolution`] -- Bounded random walk and boolean toggle rules.
//! - [`channel`] -- [`Channel`]: definition, state, and private RNG.
//! - [`sink`] -- [`StorageSink`] trait and the logging [`LogSink`].
//! - [`scheduler`] -- The tick loop with per-tick fan-out and barrier.
//! - [`control`] -- Stop requests and tick limits for the tick loop.
//! - [`config`] -- Configuration loading from `emulator-config.yaml`.
//! - [`legacy`] -- Loaders for the plain-text configuration files.
//!
//! [`Channel`]: channel::Channel
//! [`StorageSink`]: sink::StorageSink
//! [`LogSink`]: sink::LogSink

pub mod channel;
pub mod config;
pub mod control;
pub mod evolution;
pub mod legacy;
pub mod scheduler;
pub mod sink;
