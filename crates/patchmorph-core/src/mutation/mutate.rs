use super::{store_mutated, CATEGORICAL_TRIES, GAUSSIAN_CUT, GAUSSIAN_TRIES};
use crate::model::Model;
use crate::rng::{coin_toss, gaussian, uniform_inclusive};
use rand::Rng;

/// Randomly perturb `keys` with strength `weight` in `[0, 1]`.
///
/// Each key changes with probability `weight`, so `weight == 0` leaves the
/// model untouched. How a key changes depends on its metric range:
///
/// - fully metric: gaussian draw around the current value
/// - metric range, value inside it: gaussian draw over `[min, max]`, or a uniform
///   jump within the metric range
/// - metric range, value outside it: jump into the range, or a different categorical value
/// - no metric range: uniform draw over `[min, max]`
pub fn mutate<R, K>(model: &mut Model, rng: &mut R, keys: &[K], weight: f64)
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
        let current = model.get_int(key, min);

        let proposed = match model.metric_bounds(key) {
            Some((lo, hi)) if lo == min && hi == max => {
                coin_toss(rng, weight).then(|| metric_draw(rng, current, min, max, weight))
            }
            Some((lo, hi)) if (lo..=hi).contains(&current) => {
                if rng.gen_bool(0.5) {
                    coin_toss(rng, weight).then(|| metric_draw(rng, current, min, max, weight))
                } else {
                    coin_toss(rng, weight).then(|| uniform_inclusive(rng, lo, hi))
                }
            }
            Some((lo, hi)) => {
                if rng.gen_bool(0.5) {
                    coin_toss(rng, weight).then(|| uniform_inclusive(rng, lo, hi))
                } else if coin_toss(rng, weight) {
                    categorical_draw(rng, min, max, lo, hi)
                } else {
                    None
                }
            }
            None => coin_toss(rng, weight).then(|| uniform_inclusive(rng, min, max)),
        };

        if let Some(proposed) = proposed {
            store_mutated(&mut model, key, current, proposed);
        }
        model.fix(key);
    }
}

/// Gaussian draw centred on `current`, rejection-sampled into `[lo, hi]`.
///
/// The spread grows as `1 / (1 - weight) - 1`; at `weight == 1` the draw is uniform.
pub(crate) fn metric_draw<R: Rng + ?Sized>(
    rng: &mut R,
    current: i32,
    lo: i32,
    hi: i32,
    weight: f64,
) -> i32 {
    if weight >= 1.0 {
        return uniform_inclusive(rng, lo, hi);
    }
    let spread = (1.0 / (1.0 - weight) - 1.0) * GAUSSIAN_CUT;
    let stddev = spread * (f64::from(hi) - f64::from(lo) + 1.0);
    if stddev <= 0.0 {
        return current.clamp(lo, hi);
    }

    let centre = f64::from(current);
    for _ in 0..GAUSSIAN_TRIES {
        let candidate = (centre + gaussian(rng) * stddev).round();
        if candidate >= f64::from(lo) && candidate <= f64::from(hi) {
            return candidate as i32;
        }
    }
    uniform_inclusive(rng, lo, hi)
}

/// Uniform value in `[min, lo) ∪ (hi, max]`, or `None` if none turned up.
fn categorical_draw<R: Rng + ?Sized>(
    rng: &mut R,
    min: i32,
    max: i32,
    lo: i32,
    hi: i32,
) -> Option<i32> {
    (0..CATEGORICAL_TRIES)
        .map(|_| uniform_inclusive(rng, min, max))
        .find(|v| *v < lo || *v > hi)
}
