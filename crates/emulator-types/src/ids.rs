//! Type-safe channel identifier.
//!
//! Channel ids come from configuration and are written verbatim to the
//! `channelid` columns of the storage tables, so the wrapper is a plain
//! positive integer rather than a generated UUID.

use serde::{Deserialize, Serialize};

/// Unique identifier for a simulated channel.
///
/// Zero is reserved and rejected by [`ChannelDefinition::validate`].
///
/// [`ChannelDefinition::validate`]: crate::ChannelDefinition::validate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

impl ChannelId {
    /// Wrap a raw channel number.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Return the inner integer value.
    pub const fn into_inner(self) -> u32 {
        self.0
    }

    /// Whether the id is a valid (non-zero) channel number.
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl core::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ChannelId> for i64 {
    fn from(id: ChannelId) -> Self {
        Self::from(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_valid() {
        assert!(!ChannelId::new(0).is_valid());
        assert!(ChannelId::new(1).is_valid());
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&ChannelId::new(17)).unwrap_or_default();
        assert_eq!(json, "17");
    }

    #[test]
    fn converts_to_database_integer() {
        assert_eq!(i64::from(ChannelId::new(u32::MAX)), 4_294_967_295);
    }
}
