use super::{other_int, round_toward, store_mutated};
use crate::model::Model;
use crate::rng::{coin_toss, uniform_inclusive};
use rand::Rng;

/// Blend `model` toward `other` with strength `weight` in `[0, 1]`.
///
/// When both values lie in the metric range, the result is a random point
/// between the current value and the point `weight` of the way toward
/// `other`, so it never passes `other`. Otherwise `other`'s value is adopted
/// with probability `weight / 2`; the extra coin flip keeps categorical keys
/// from changing much faster than metric ones.
pub fn recombine<R, K>(model: &mut Model, rng: &mut R, other: &Model, keys: &[K], weight: f64)
where
    R: Rng + ?Sized,
    K: AsRef<str>,
{
    let weight = weight.clamp(0.0, 1.0);
    let mut model = model.begin_batch();

    for key in keys {
        let key = key.as_ref();
        let Some((min, max)) = model.mutable_bounds(key) else {
            continue;
        };
        let Some(theirs) = other_int(other, key) else {
            continue;
        };
        let current = model.get_int(key, min);

        let both_metric = model
            .metric_bounds(key)
            .is_some_and(|(lo, hi)| (lo..=hi).contains(&current) && (lo..=hi).contains(&theirs));

        let proposed = if both_metric {
            let point = f64::from(current) + (f64::from(theirs) - f64::from(current)) * weight;
            let target = round_toward(point, f64::from(theirs));
            Some(uniform_inclusive(rng, current, target))
        } else if coin_toss(rng, weight) && rng.gen_bool(0.5) {
            Some(theirs.clamp(min, max))
        } else {
            None
        };

        if let Some(proposed) = proposed {
            store_mutated(&mut model, key, current, proposed);
        }
        model.fix(key);
    }
}

/// Copy `other`'s value with probability `weight` (halved again when
/// `post_coin_toss` is set), regardless of metric ranges.
///
/// At `weight == 1` without the coin toss every eligible key ends up equal to `other`.
pub fn crossover<R, K>(
    model: &mut Model,
    rng: &mut R,
    other: &Model,
    keys: &[K],
    weight: f64,
    post_coin_toss: bool,
) where
    R: Rng + ?Sized,
    K: AsRef<str>,
{
    let weight = weight.clamp(0.0, 1.0);
    let mut model = model.begin_batch();

    for key in keys {
        let key = key.as_ref();
        if model.mutable_bounds(key).is_none() {
            continue;
        }
        let Some(theirs) = other_int(other, key) else {
            continue;
        };

        if coin_toss(rng, weight) && (!post_coin_toss || rng.gen_bool(0.5)) {
            model.set_int(key, theirs);
        }
        model.fix(key);
    }
}
