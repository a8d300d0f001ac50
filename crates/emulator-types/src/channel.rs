//! Immutable channel definitions.
//!
//! A [`ChannelDefinition`] is loaded once at startup and never changes for
//! the lifetime of the process. Definitions are checked with
//! [`ChannelDefinition::validate`] before any state is built from them, so
//! the evolution functions can rely on well-formed ranges and probabilities.

use serde::{Deserialize, Serialize};

use crate::ids::ChannelId;

/// Default maximum movement per tick for numeric channels.
pub const DEFAULT_STEP: f64 = 0.5;

/// Default per-tick retarget probability for numeric channels.
pub const DEFAULT_CHANGE_PROBABILITY: f64 = 0.3;

/// Default per-tick flip probability for boolean channels.
pub const DEFAULT_TOGGLE_PROBABILITY: f64 = 0.1;

/// Reasons a channel definition is rejected at load time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The channel id is zero.
    #[error("channel id must be a positive integer")]
    ZeroId,

    /// A numeric bound is NaN or infinite, or the range width overflows.
    #[error("channel {id}: bounds must be finite (min = {min}, max = {max})")]
    NonFiniteBounds {
        /// The offending channel.
        id: ChannelId,
        /// Configured lower bound.
        min: f64,
        /// Configured upper bound.
        max: f64,
    },

    /// The lower bound is not strictly below the upper bound.
    #[error("channel {id}: min ({min}) must be less than max ({max})")]
    EmptyRange {
        /// The offending channel.
        id: ChannelId,
        /// Configured lower bound.
        min: f64,
        /// Configured upper bound.
        max: f64,
    },

    /// The step is zero, negative, or not finite.
    #[error("channel {id}: step must be a positive finite number, got {step}")]
    InvalidStep {
        /// The offending channel.
        id: ChannelId,
        /// Configured step.
        step: f64,
    },

    /// A probability lies outside `[0, 1]`.
    #[error("channel {id}: {field} must be within [0, 1], got {value}")]
    InvalidProbability {
        /// The offending channel.
        id: ChannelId,
        /// Name of the probability field.
        field: &'static str,
        /// Configured value.
        value: f64,
    },

    /// Two definitions share the same id.
    #[error("channel {id} is defined more than once")]
    DuplicateId {
        /// The repeated channel id.
        id: ChannelId,
    },
}

/// Parameters of a numeric (bounded random-walk) channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericParams {
    /// Lower bound of the value range (inclusive).
    pub min: f64,

    /// Upper bound of the value range (inclusive).
    pub max: f64,

    /// Maximum movement toward the target in a single tick.
    #[serde(default = "default_step")]
    pub step: f64,

    /// Chance per tick of picking a new target value.
    #[serde(default = "default_change_probability")]
    pub change_probability: f64,
}

impl NumericParams {
    /// Create numeric parameters with the default step and retarget chance.
    pub const fn with_range(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            step: DEFAULT_STEP,
            change_probability: DEFAULT_CHANGE_PROBABILITY,
        }
    }

    /// Midpoint of the value range, used as the initial value.
    pub fn midpoint(&self) -> f64 {
        self.min + (self.max - self.min) / 2.0
    }

    /// Clamp a value into `[min, max]`.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Whether `value` lies inside the closed range.
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Parameters of a boolean (random toggle) channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BooleanParams {
    /// Chance per tick of flipping the current value.
    #[serde(default = "default_toggle_probability")]
    pub toggle_probability: f64,
}

impl Default for BooleanParams {
    fn default() -> Self {
        Self {
            toggle_probability: DEFAULT_TOGGLE_PROBABILITY,
        }
    }
}

/// Kind of a channel together with its kind-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelKind {
    /// A real-valued channel drifting toward randomly chosen targets.
    Numeric(NumericParams),
    /// An on/off channel that flips at random.
    Boolean(BooleanParams),
}

impl ChannelKind {
    /// Short lowercase name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Boolean(_) => "boolean",
        }
    }
}

/// Immutable definition of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelDefinition {
    /// Unique channel id.
    pub id: ChannelId,

    /// Channel kind and parameters.
    #[serde(flatten)]
    pub kind: ChannelKind,
}

impl ChannelDefinition {
    /// Build a numeric channel definition.
    pub const fn numeric(id: ChannelId, params: NumericParams) -> Self {
        Self {
            id,
            kind: ChannelKind::Numeric(params),
        }
    }

    /// Build a boolean channel definition.
    pub const fn boolean(id: ChannelId, params: BooleanParams) -> Self {
        Self {
            id,
            kind: ChannelKind::Boolean(params),
        }
    }

    /// Check that the definition is well formed.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let id = self.id;
        if !id.is_valid() {
            return Err(ValidationError::ZeroId);
        }

        match self.kind {
            ChannelKind::Numeric(p) => {
                if !p.min.is_finite() || !p.max.is_finite() || !(p.max - p.min).is_finite() {
                    return Err(ValidationError::NonFiniteBounds {
                        id,
                        min: p.min,
                        max: p.max,
                    });
                }
                if p.min >= p.max {
                    return Err(ValidationError::EmptyRange {
                        id,
                        min: p.min,
                        max: p.max,
                    });
                }
                if !p.step.is_finite() || p.step <= 0.0 {
                    return Err(ValidationError::InvalidStep { id, step: p.step });
                }
                check_probability(id, "change_probability", p.change_probability)
            }
            ChannelKind::Boolean(p) => {
                check_probability(id, "toggle_probability", p.toggle_probability)
            }
        }
    }
}

/// Validate a whole channel list: every definition plus id uniqueness.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, in list order.
pub fn validate_all(definitions: &[ChannelDefinition]) -> Result<(), ValidationError> {
    let mut seen = std::collections::BTreeSet::new();
    for def in definitions {
        def.validate()?;
        if !seen.insert(def.id) {
            return Err(ValidationError::DuplicateId { id: def.id });
        }
    }
    Ok(())
}

fn check_probability(id: ChannelId, field: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidProbability { id, field, value })
    }
}

const fn default_step() -> f64 {
    DEFAULT_STEP
}

const fn default_change_probability() -> f64 {
    DEFAULT_CHANGE_PROBABILITY
}

const fn default_toggle_probability() -> f64 {
    DEFAULT_TOGGLE_PROBABILITY
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    fn numeric(id: u32, min: f64, max: f64) -> ChannelDefinition {
        ChannelDefinition::numeric(ChannelId::new(id), NumericParams::with_range(min, max))
    }

    #[test]
    fn well_formed_numeric_passes() {
        assert!(numeric(1, 0.0, 10.0).validate().is_ok());
    }

    #[test]
    fn zero_id_rejected() {
        assert_eq!(numeric(0, 0.0, 1.0).validate(), Err(ValidationError::ZeroId));
    }

    #[test]
    fn inverted_range_rejected() {
        let result = numeric(3, 5.0, 5.0).validate();
        assert!(matches!(result, Err(ValidationError::EmptyRange { .. })));
    }

    #[test]
    fn nan_bound_rejected() {
        let result = numeric(3, f64::NAN, 5.0).validate();
        assert!(matches!(result, Err(ValidationError::NonFiniteBounds { .. })));
    }

    #[test]
    fn non_positive_step_rejected() {
        let mut params = NumericParams::with_range(0.0, 1.0);
        params.step = 0.0;
        let def = ChannelDefinition::numeric(ChannelId::new(2), params);
        assert!(matches!(
            def.validate(),
            Err(ValidationError::InvalidStep { .. })
        ));
    }

    #[test]
    fn probability_out_of_range_rejected() {
        let def = ChannelDefinition::boolean(
            ChannelId::new(4),
            BooleanParams {
                toggle_probability: 1.5,
            },
        );
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("toggle_probability"));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let defs = [numeric(1, 0.0, 1.0), numeric(2, 0.0, 1.0), numeric(1, 0.0, 2.0)];
        assert_eq!(
            validate_all(&defs),
            Err(ValidationError::DuplicateId {
                id: ChannelId::new(1)
            })
        );
    }

    #[test]
    fn midpoint_of_range() {
        assert_eq!(NumericParams::with_range(-10.0, 30.0).midpoint(), 10.0);
    }

    #[test]
    fn deserializes_tagged_definitions_with_defaults() {
        let json = r#"[
            {"id": 1, "kind": "numeric", "min": 0.0, "max": 100.0},
            {"id": 2, "kind": "boolean", "toggle_probability": 0.25}
        ]"#;
        let defs: Vec<ChannelDefinition> = serde_json::from_str(json).unwrap();
        assert_eq!(defs.len(), 2);

        let ChannelKind::Numeric(p) = defs[0].kind else {
            panic!("expected numeric channel");
        };
        assert_eq!(p.step, DEFAULT_STEP);
        assert_eq!(p.change_probability, DEFAULT_CHANGE_PROBABILITY);

        let ChannelKind::Boolean(b) = defs[1].kind else {
            panic!("expected boolean channel");
        };
        assert_eq!(b.toggle_probability, 0.25);
    }
}
