use super::{other_int, round_away, store_mutated, CATEGORICAL_TRIES};
use crate::model::Model;
use crate::rng::{coin_toss, uniform_inclusive};
use rand::Rng;

/// Push `model` away from `other` with strength `weight` in `[0, 1]`.
///
/// With no `other`, or when both hold the same value and `flee_if_same` is
/// set, a metric value is nudged by one step and a categorical value jumps
/// to a different random value with probability `weight`. When both values
/// lie in the metric range, the value moves to a random point between itself
/// and its reflection away from `other`, scaled by `weight`. Keys whose values
/// disagree on being metric are left alone.
pub fn opposite<R, K>(
    model: &mut Model,
    rng: &mut R,
    other: Option<&Model>,
    keys: &[K],
    weight: f64,
    flee_if_same: bool,
) where
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
        let other_value = match other {
            Some(other) => match other_int(other, key) {
                Some(v) => Some(v),
                None => continue,
            },
            None => None,
        };
        let current = model.get_int(key, min);
        let metric = model.metric_bounds(key);
        let current_is_metric = metric.is_some_and(|(lo, hi)| (lo..=hi).contains(&current));

        let flee = match other_value {
            None => true,
            Some(theirs) => theirs == current && flee_if_same,
        };

        let proposed = match other_value {
            _ if flee => match metric {
                Some((lo, hi)) if current_is_metric => nudge(rng, current, lo, hi),
                _ => coin_toss(rng, weight)
                    .then(|| distinct_draw(rng, current, min, max))
                    .flatten(),
            },
            None => None,
            Some(theirs) if theirs == current => None,
            Some(theirs) => {
                let theirs_is_metric =
                    metric.is_some_and(|(lo, hi)| (lo..=hi).contains(&theirs));
                match metric {
                    Some((lo, hi)) if current_is_metric && theirs_is_metric => {
                        let reflected = f64::from(current)
                            + (f64::from(current) - f64::from(theirs)) * weight;
                        let reflected = reflected.clamp(f64::from(lo), f64::from(hi));
                        let target = round_away(reflected, f64::from(theirs)).clamp(lo, hi);
                        Some(uniform_inclusive(rng, current, target))
                    }
                    // Mixed metric membership, or two different categorical
                    // values: already divergent.
                    _ => None,
                }
            }
        };

        if let Some(proposed) = proposed {
            store_mutated(&mut model, key, current, proposed);
        }
        model.fix(key);
    }
}

/// Step one away from `current`, flipping direction at the edge of `[lo, hi]`.
fn nudge<R: Rng + ?Sized>(rng: &mut R, current: i32, lo: i32, hi: i32) -> Option<i32> {
    let (up, down) = (current.checked_add(1), current.checked_sub(1));
    let order = if rng.gen_bool(0.5) { [up, down] } else { [down, up] };
    order
        .into_iter()
        .flatten()
        .find(|v| (lo..=hi).contains(v))
}

/// Uniform value in `[min, max]` different from `current`.
fn distinct_draw<R: Rng + ?Sized>(rng: &mut R, current: i32, min: i32, max: i32) -> Option<i32> {
    (0..CATEGORICAL_TRIES)
        .map(|_| uniform_inclusive(rng, min, max))
        .find(|v| *v != current)
}
