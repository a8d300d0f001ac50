//! Stochastic value evolution for a single channel.
//!
//! These functions are the only place randomness enters the emulator. Each
//! one reads a channel's current state, draws from the supplied RNG, writes
//! the new value back into the state, and returns it. They know nothing
//! about other channels, scheduling, or storage.
//!
//! # Numeric channels
//!
//! A numeric channel performs a bounded random walk toward a target:
//!
//! 1. With probability `change_probability` a new target is drawn uniformly
//!    from `[min, max]`. There is no minimum distance from the current value.
//! 2. The value moves toward the target by at most `step`. It never
//!    overshoots and lands exactly on the target once within `step`.
//! 3. The result is clamped to `[min, max]` and rounded to two decimals.
//!
//! # Boolean channels
//!
//! A boolean channel flips with probability `toggle_probability` per tick.
//!
//! # Determinism
//!
//! Given the same RNG stream, every function here produces the same
//! sequence of values. A uniform draw is consumed every tick even when the
//! probability is 0 or 1, so the stream position never depends on the
//! configured probabilities.

use emulator_types::state::encode_bool;
use emulator_types::{
    BooleanParams, BooleanState, ChannelDefinition, ChannelId, ChannelKind, ChannelState,
    NumericParams, NumericState,
};
use rand::Rng;

/// Errors that can occur while evolving a channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvolutionError {
    /// The state does not match the kind of its definition.
    #[error("channel {id}: definition is {expected} but state is {found}")]
    KindMismatch {
        /// The channel being evolved.
        id: ChannelId,
        /// Kind named by the definition.
        expected: &'static str,
        /// Kind held by the state.
        found: &'static str,
    },
}

/// Build the initial state for a channel.
///
/// Numeric channels start at the midpoint of their range with a random
/// target. Boolean channels start at a random value.
pub fn initial_state(definition: &ChannelDefinition, rng: &mut impl Rng) -> ChannelState {
    match definition.kind {
        ChannelKind::Numeric(params) => ChannelState::Numeric(NumericState {
            current_value: params.midpoint(),
            target_value: draw_target(&params, rng),
        }),
        ChannelKind::Boolean(_) => ChannelState::Boolean(BooleanState {
            current_value: rng.random(),
        }),
    }
}

/// Advance a numeric channel by one tick and return its new value.
pub fn evolve_numeric(state: &mut NumericState, params: &NumericParams, rng: &mut impl Rng) -> f64 {
    let roll: f64 = rng.random();
    if roll < params.change_probability {
        state.target_value = draw_target(params, rng);
    }

    let delta = state.target_value - state.current_value;
    let movement = delta.signum() * delta.abs().min(params.step);
    let moved = params.clamp(state.current_value + movement);

    // Rounding can move a value that sits on a bound by up to half a cent.
    let value = params.clamp(round_to_cents(moved));
    state.current_value = value;
    value
}

/// Advance a boolean channel by one tick and return its new value.
pub fn evolve_boolean(state: &mut BooleanState, params: &BooleanParams, rng: &mut impl Rng) -> bool {
    let roll: f64 = rng.random();
    if roll < params.toggle_probability {
        state.current_value = !state.current_value;
    }
    state.current_value
}

/// Advance any channel by one tick and return the value to store.
///
/// Boolean channels are encoded as `0.0` or `1.0`.
///
/// # Errors
///
/// Returns [`EvolutionError::KindMismatch`] if `state` was not built for
/// `definition`. States created by [`initial_state`] always match.
pub fn evolve(
    definition: &ChannelDefinition,
    state: &mut ChannelState,
    rng: &mut impl Rng,
) -> Result<f64, EvolutionError> {
    match (&definition.kind, state) {
        (ChannelKind::Numeric(params), ChannelState::Numeric(s)) => {
            Ok(evolve_numeric(s, params, rng))
        }
        (ChannelKind::Boolean(params), ChannelState::Boolean(s)) => {
            Ok(encode_bool(evolve_boolean(s, params, rng)))
        }
        (kind, other) => Err(EvolutionError::KindMismatch {
            id: definition.id,
            expected: kind.name(),
            found: other.kind_name(),
        }),
    }
}

/// Round to two decimal places, halves away from zero.
///
/// The value is scaled by 100 and rounded with [`f64::round`], so the
/// result is the nearest multiple of 0.01 representable as `f64`.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn draw_target(params: &NumericParams, rng: &mut impl Rng) -> f64 {
    rng.random_range(params.min..=params.max)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::unreachable)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn params(min: f64, max: f64, step: f64, change_probability: f64) -> NumericParams {
        NumericParams {
            min,
            max,
            step,
            change_probability,
        }
    }

    #[test]
    fn walks_toward_target_without_overshoot() {
        let p = params(0.0, 10.0, 1.0, 0.0);
        let mut state = NumericState {
            current_value: 5.0,
            target_value: 8.0,
        };
        let mut rng = SmallRng::seed_from_u64(1);

        let values: Vec<f64> = (0..4)
            .map(|_| evolve_numeric(&mut state, &p, &mut rng))
            .collect();

        assert_eq!(values, vec![6.0, 7.0, 8.0, 8.0]);
        assert_eq!(state.target_value, 8.0);
    }

    #[test]
    fn walks_downward_too() {
        let p = params(0.0, 10.0, 1.5, 0.0);
        let mut state = NumericState {
            current_value: 5.0,
            target_value: 2.0,
        };
        let mut rng = SmallRng::seed_from_u64(2);

        assert_eq!(evolve_numeric(&mut state, &p, &mut rng), 3.5);
        assert_eq!(evolve_numeric(&mut state, &p, &mut rng), 2.0);
        assert_eq!(evolve_numeric(&mut state, &p, &mut rng), 2.0);
    }

    #[test]
    fn zero_change_probability_never_retargets() {
        let p = params(-50.0, 50.0, 3.0, 0.0);
        let mut state = NumericState {
            current_value: 0.0,
            target_value: 42.5,
        };
        let mut rng = SmallRng::seed_from_u64(3);

        for _ in 0..500 {
            let _ = evolve_numeric(&mut state, &p, &mut rng);
            assert_eq!(state.target_value, 42.5);
        }
        assert_eq!(state.current_value, 42.5);
    }

    #[test]
    fn fixed_point_when_at_target() {
        let p = params(0.0, 1.0, 0.1, 0.0);
        let mut state = NumericState {
            current_value: 0.25,
            target_value: 0.25,
        };
        let mut rng = SmallRng::seed_from_u64(4);

        for _ in 0..100 {
            assert_eq!(evolve_numeric(&mut state, &p, &mut rng), 0.25);
        }
    }

    #[test]
    fn full_change_probability_retargets_every_tick() {
        let p = params(0.0, 1000.0, 1.0, 1.0);
        let mut state = NumericState {
            current_value: 500.0,
            target_value: 500.0,
        };
        let mut rng = SmallRng::seed_from_u64(5);

        let mut targets = Vec::new();
        for _ in 0..20 {
            let _ = evolve_numeric(&mut state, &p, &mut rng);
            targets.push(state.target_value);
        }
        targets.dedup();
        assert_eq!(targets.len(), 20, "target should be redrawn every tick");
    }

    #[test]
    fn stays_in_range_and_respects_step() {
        for seed in 0..50_u64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let p = params(-3.0, 7.0, 0.75, 0.4);
            let def = ChannelDefinition::numeric(ChannelId::new(1), p);
            let mut state = match initial_state(&def, &mut rng) {
                ChannelState::Numeric(s) => s,
                ChannelState::Boolean(_) => unreachable!(),
            };

            for _ in 0..200 {
                let before = state.current_value;
                let after = evolve_numeric(&mut state, &p, &mut rng);
                assert!(p.contains(after), "value {after} escaped range");
                assert!(p.contains(state.target_value));
                assert!((after - before).abs() <= p.step + 0.005 + 1e-9);
            }
        }
    }

    #[test]
    fn large_step_reaches_any_target_in_one_tick() {
        let p = params(0.0, 10.0, 25.0, 0.0);
        let mut state = NumericState {
            current_value: 0.0,
            target_value: 9.87,
        };
        let mut rng = SmallRng::seed_from_u64(6);
        assert_eq!(evolve_numeric(&mut state, &p, &mut rng), 9.87);
    }

    #[test]
    fn values_are_rounded_to_cents() {
        let p = params(0.0, 10.0, 0.333, 0.0);
        let mut state = NumericState {
            current_value: 1.0,
            target_value: 9.0,
        };
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(evolve_numeric(&mut state, &p, &mut rng), 1.33);
        assert_eq!(evolve_numeric(&mut state, &p, &mut rng), 1.66);
    }

    #[test]
    fn round_half_away_from_zero() {
        assert_eq!(round_to_cents(1.125), 1.13);
        assert_eq!(round_to_cents(-1.125), -1.13);
        assert_eq!(round_to_cents(3.0), 3.0);
    }

    #[test]
    fn boolean_always_toggles_at_probability_one() {
        let p = BooleanParams {
            toggle_probability: 1.0,
        };
        let mut state = BooleanState {
            current_value: false,
        };
        let mut rng = SmallRng::seed_from_u64(8);

        let seq: Vec<bool> = (0..3)
            .map(|_| evolve_boolean(&mut state, &p, &mut rng))
            .collect();
        assert_eq!(seq, vec![true, false, true]);
    }

    #[test]
    fn boolean_never_toggles_at_probability_zero() {
        let p = BooleanParams {
            toggle_probability: 0.0,
        };
        let mut state = BooleanState { current_value: true };
        let mut rng = SmallRng::seed_from_u64(9);

        for _ in 0..200 {
            assert!(evolve_boolean(&mut state, &p, &mut rng));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let def = ChannelDefinition::numeric(ChannelId::new(1), params(0.0, 100.0, 2.0, 0.3));
        let run = |seed: u64| {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut state = initial_state(&def, &mut rng);
            (0..50)
                .map(|_| evolve(&def, &mut state, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn numeric_initial_state_starts_at_midpoint() {
        let def = ChannelDefinition::numeric(ChannelId::new(1), params(10.0, 20.0, 1.0, 0.5));
        let mut rng = SmallRng::seed_from_u64(10);
        let ChannelState::Numeric(state) = initial_state(&def, &mut rng) else {
            unreachable!();
        };
        assert_eq!(state.current_value, 15.0);
        assert!((10.0..=20.0).contains(&state.target_value));
    }

    #[test]
    fn dispatch_encodes_booleans() {
        let def = ChannelDefinition::boolean(
            ChannelId::new(2),
            BooleanParams {
                toggle_probability: 1.0,
            },
        );
        let mut state = ChannelState::Boolean(BooleanState {
            current_value: false,
        });
        let mut rng = SmallRng::seed_from_u64(12);
        assert_eq!(evolve(&def, &mut state, &mut rng), Ok(1.0));
        assert_eq!(evolve(&def, &mut state, &mut rng), Ok(0.0));
    }

    #[test]
    fn dispatch_rejects_mismatched_state() {
        let def = ChannelDefinition::boolean(ChannelId::new(3), BooleanParams::default());
        let mut state = ChannelState::Numeric(NumericState {
            current_value: 1.0,
            target_value: 1.0,
        });
        let mut rng = SmallRng::seed_from_u64(13);
        let err = evolve(&def, &mut state, &mut rng).unwrap_err();
        assert_eq!(
            err,
            EvolutionError::KindMismatch {
                id: ChannelId::new(3),
                expected: "boolean",
                found: "numeric",
            }
        );
    }
}
