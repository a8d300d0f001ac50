//! Mutable per-channel simulation state.
//!
//! Exactly one [`ChannelState`] exists per channel definition. It is built
//! once at startup and then mutated in place by a single evolution call per
//! tick. It is never shared between channels.

use serde::{Deserialize, Serialize};

/// State of a numeric channel.
///
/// Both fields stay within the definition's `[min, max]` after every update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericState {
    /// Value reported for the most recent tick.
    pub current_value: f64,

    /// Value the channel is currently drifting toward.
    pub target_value: f64,
}

/// State of a boolean channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanState {
    /// Value reported for the most recent tick.
    pub current_value: bool,
}

/// Mutable simulation state for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelState {
    /// State of a numeric channel.
    Numeric(NumericState),
    /// State of a boolean channel.
    Boolean(BooleanState),
}

impl ChannelState {
    /// Short lowercase kind name for logging and error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Boolean(_) => "boolean",
        }
    }

    /// Current value as it is written to storage (booleans as `0.0`/`1.0`).
    pub fn observed_value(&self) -> f64 {
        match self {
            Self::Numeric(s) => s.current_value,
            Self::Boolean(s) => encode_bool(s.current_value),
        }
    }
}

/// Encode a boolean channel value as a storage number.
pub const fn encode_bool(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
