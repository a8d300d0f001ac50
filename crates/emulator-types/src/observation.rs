//! Records handed to storage once per channel per tick.
//!
//! Neither record is retained by the emulator after the storage call
//! returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ChannelId;

/// One sampled value of one channel at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Channel the value belongs to.
    pub channel_id: ChannelId,
    /// When the value was produced (UTC).
    pub timestamp: DateTime<Utc>,
    /// The value; boolean channels use `0.0` and `1.0`.
    pub value: f64,
}

impl Observation {
    /// Create an observation stamped with the given time.
    pub const fn new(channel_id: ChannelId, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            channel_id,
            timestamp,
            value,
        }
    }

    /// The latest-value record derived from this observation.
    pub const fn to_latest(&self) -> LatestValue {
        LatestValue {
            channel_id: self.channel_id,
            value: self.value,
            timestamp: self.timestamp,
        }
    }
}

/// Most recent value of a channel, upserted every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestValue {
    /// Channel the value belongs to.
    pub channel_id: ChannelId,
    /// The value; boolean channels use `0.0` and `1.0`.
    pub value: f64,
    /// When the value was produced (UTC).
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn latest_carries_same_value_and_time() {
        let now = Utc::now();
        let obs = Observation::new(ChannelId::new(7), now, 12.5);
        let latest = obs.to_latest();
        assert_eq!(latest.channel_id, ChannelId::new(7));
        assert_eq!(latest.value, 12.5);
        assert_eq!(latest.timestamp, now);
    }
}
