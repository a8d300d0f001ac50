//! A simulated channel: definition, state, and private random stream.
//!
//! Each [`Channel`] owns its state and its own seedable RNG. The scheduler
//! hands every per-tick unit of work a unique `&mut Channel`, so no channel
//! is ever touched by two units at once and no locking is needed.
//!
//! Per-channel RNGs are derived from a single master seed. Logging the
//! master seed at startup is enough to replay a whole run.

use emulator_types::{ChannelDefinition, ChannelId, ChannelKind, ChannelState, ValidationError};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::evolution::{self, EvolutionError};

/// Odd 64-bit constant used to spread channel ids across the seed space.
const SEED_SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// Errors that can occur when assembling a channel.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChannelError {
    /// The definition failed validation.
    #[error("invalid channel definition: {source}")]
    Invalid {
        /// The underlying validation error.
        #[from]
        source: ValidationError,
    },

    /// A supplied state does not belong to the definition's kind.
    #[error("channel {id}: definition is {expected} but state is {found}")]
    KindMismatch {
        /// The channel being assembled.
        id: ChannelId,
        /// Kind named by the definition.
        expected: &'static str,
        /// Kind held by the state.
        found: &'static str,
    },

    /// A supplied numeric state lies outside the channel's range.
    #[error("channel {id}: state is outside [{min}, {max}]")]
    StateOutOfRange {
        /// The channel being assembled.
        id: ChannelId,
        /// Lower bound of the range.
        min: f64,
        /// Upper bound of the range.
        max: f64,
    },
}

/// Position of a channel within the per-tick cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    /// Waiting for the next tick.
    Idle,
    /// Computing the next value.
    Evolving,
    /// Handing the value to storage.
    Persisting,
}

/// One simulated channel.
#[derive(Debug, Clone)]
pub struct Channel {
    definition: ChannelDefinition,
    state: ChannelState,
    rng: SmallRng,
    phase: ChannelPhase,
}

impl Channel {
    /// Create a channel with fresh initial state.
    ///
    /// The channel's RNG is seeded from `master_seed` and the channel id.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Invalid`] if the definition fails validation.
    pub fn new(definition: ChannelDefinition, master_seed: u64) -> Result<Self, ChannelError> {
        definition.validate()?;
        let mut rng = SmallRng::seed_from_u64(channel_seed(master_seed, definition.id));
        let state = evolution::initial_state(&definition, &mut rng);
        Ok(Self {
            definition,
            state,
            rng,
            phase: ChannelPhase::Idle,
        })
    }

    /// Create a channel from an explicit state and RNG (useful for testing
    /// and state restoration).
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the definition is invalid, the state is
    /// of the wrong kind, or a numeric state lies outside the range.
    pub fn from_parts(
        definition: ChannelDefinition,
        state: ChannelState,
        rng: SmallRng,
    ) -> Result<Self, ChannelError> {
        definition.validate()?;
        match (&definition.kind, &state) {
            (ChannelKind::Numeric(p), ChannelState::Numeric(s)) => {
                if !p.contains(s.current_value) || !p.contains(s.target_value) {
                    return Err(ChannelError::StateOutOfRange {
                        id: definition.id,
                        min: p.min,
                        max: p.max,
                    });
                }
            }
            (ChannelKind::Boolean(_), ChannelState::Boolean(_)) => {}
            (kind, other) => {
                return Err(ChannelError::KindMismatch {
                    id: definition.id,
                    expected: kind.name(),
                    found: other.kind_name(),
                });
            }
        }
        Ok(Self {
            definition,
            state,
            rng,
            phase: ChannelPhase::Idle,
        })
    }

    /// The channel id.
    pub const fn id(&self) -> ChannelId {
        self.definition.id
    }

    /// The immutable definition.
    pub const fn definition(&self) -> &ChannelDefinition {
        &self.definition
    }

    /// The current simulation state.
    pub const fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Where the channel is in the per-tick cycle.
    pub const fn phase(&self) -> ChannelPhase {
        self.phase
    }

    /// Advance the channel by one tick and return the value to store.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError`] if the state does not match the
    /// definition, which cannot happen for channels built through
    /// [`Channel::new`] or [`Channel::from_parts`].
    pub fn evolve(&mut self) -> Result<f64, EvolutionError> {
        evolution::evolve(&self.definition, &mut self.state, &mut self.rng)
    }

    pub(crate) const fn set_phase(&mut self, phase: ChannelPhase) {
        self.phase = phase;
    }
}

/// Build channels for every definition, in order.
///
/// # Errors
///
/// Returns [`ChannelError::Invalid`] for the first malformed definition or
/// repeated id.
pub fn build_channels(
    definitions: &[ChannelDefinition],
    master_seed: u64,
) -> Result<Vec<Channel>, ChannelError> {
    emulator_types::validate_all(definitions)?;
    definitions
        .iter()
        .map(|def| Channel::new(*def, master_seed))
        .collect()
}

/// Derive the RNG seed of one channel from the master seed.
pub fn channel_seed(master_seed: u64, id: ChannelId) -> u64 {
    master_seed ^ u64::from(id.into_inner()).wrapping_mul(SEED_SPREAD)
}
