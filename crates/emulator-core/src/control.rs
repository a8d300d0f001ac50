//! Run control shared between the tick loop and whoever may stop it.
//!
//! The emulator normally runs until the process is terminated. A
//! [`TickControl`] adds two optional ways out: a stop request (wired to
//! Ctrl-C by the engine) and a tick limit. Both are checked at the top of
//! every tick; a stop request also cuts the inter-tick sleep short. A tick
//! that has already started always runs to completion.
//!
//! The stop flag is an atomic so the tick loop can read it without locking.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;

/// Reason why the tick loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    /// A stop was requested.
    StopRequested,
    /// The configured tick limit was reached.
    TickLimitReached,
}

/// Shared run control state.
///
/// Wrap in an `Arc` to share between the tick loop and a signal handler.
#[derive(Debug)]
pub struct TickControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the tick loop out of its inter-tick sleep.
    stop_notify: Notify,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Wall-clock time when the control was created.
    started_at: DateTime<Utc>,
}

impl TickControl {
    /// Create a control with the given tick limit (0 = unlimited).
    pub fn new(max_ticks: u64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            max_ticks,
            started_at: Utc::now(),
        }
    }

    /// Create a control that only ends on a stop request.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Request a clean stop after the current tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop is requested.
    ///
    /// Returns immediately if one already was.
    pub async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.stop_notify.notified().await;
        }
    }

    /// Configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Whether `completed_ticks` has reached the tick limit.
    pub const fn tick_limit_reached(&self, completed_ticks: u64) -> bool {
        self.max_ticks > 0 && completed_ticks >= self.max_ticks
    }

    /// Wall-clock time when the control was created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds elapsed since the control was created.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        u64::try_from(elapsed.num_seconds()).unwrap_or(0)
    }
}

impl Default for TickControl {
    fn default() -> Self {
        Self::unbounded()
    }
}
