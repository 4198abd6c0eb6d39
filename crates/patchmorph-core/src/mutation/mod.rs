//! Genetic patch exploration: mutation, recombination, opposite and morph.
//!
//! Every operator walks its key list and silently skips keys that are missing
//! from a participating model, are not free integers, or have `min >= max`.
//! After each key the model's fixer runs once more. The whole operator runs
//! inside one [`UndoBatch`](crate::UndoBatch), so it is a single undo step.
//!
//! Keys with a metric range are handled arithmetically while their value is
//! inside that range; everything else is treated as a categorical choice.

mod morph;
mod mutate;
mod opposite;
mod recombine;

pub use morph::{morph, CategoricalStrategy, Morpher};
pub use mutate::mutate;
pub use opposite::opposite;
pub use recombine::{crossover, recombine};

use crate::model::Model;

/// Attempts at finding a categorical value distinct from the metric range, or
/// from the current value.
pub const CATEGORICAL_TRIES: usize = 10;

/// Scales the gaussian spread of a metric draw relative to the range width.
pub const GAUSSIAN_CUT: f64 = 0.5;

/// Rejection-sampling attempts for a gaussian draw before falling back to uniform.
pub const GAUSSIAN_TRIES: usize = 64;

/// Integer value of `key` in `other`, if the key exists there as an integer.
#[inline]
pub(crate) fn other_int(other: &Model, key: &str) -> Option<i32> {
    other.get(key).and_then(|v| v.as_int())
}

/// Revise `proposed` through the model's hook, then store it.
#[inline]
pub(crate) fn store_mutated(model: &mut Model, key: &str, old: i32, proposed: i32) {
    let value = model.revise(key, old, proposed);
    model.set_int(key, value);
}

/// Round `x` toward `target`.
#[inline]
pub(crate) fn round_toward(x: f64, target: f64) -> i32 {
    if target > x {
        x.ceil() as i32
    } else if target < x {
        x.floor() as i32
    } else {
        x.round() as i32
    }
}

/// Round `x` away from `from`.
#[inline]
pub(crate) fn round_away(x: f64, from: f64) -> i32 {
    if x > from {
        x.ceil() as i32
    } else if x < from {
        x.floor() as i32
    } else {
        x.round() as i32
    }
}
