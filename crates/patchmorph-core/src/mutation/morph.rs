use super::{other_int, round_toward, store_mutated};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::rng::coin_toss;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How `morph` treats keys without a metric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoricalStrategy {
    /// Probabilistically adopt values of models the weights are moving toward.
    #[default]
    Morph,
    /// Always take the highest-weight model's value.
    Strongest,
    /// Always take the default model's value.
    Default,
    /// Always take the value of the model at this index.
    Model(usize),
}

/// Nudge `model` toward the weighted blend of `models`.
///
/// Meant to be called repeatedly as `weights` change smoothly. Weights are
/// normalized to sum to 1 (uniform if they sum to 0). Metric keys become the
/// weighted average of the models' values, rounded toward the strongest
/// model. Categorical keys follow `strategy`.
///
/// `previous_weights` must be the vector left behind by the previous call
/// (empty on the first); it is overwritten with this call's normalized weights.
#[allow(clippy::too_many_arguments)]
pub fn morph<R, K>(
    model: &mut Model,
    rng: &mut R,
    models: &[&Model],
    default_model: Option<&Model>,
    keys: &[K],
    weights: &[f64],
    previous_weights: &mut Vec<f64>,
    strategy: CategoricalStrategy,
) -> Result<()>
where
    R: Rng + ?Sized,
    K: AsRef<str>,
{
    if models.is_empty() {
        return Err(Error::NoMorphModels);
    }
    if weights.len() != models.len() {
        return Err(Error::MorphWeightMismatch {
            weights: weights.len(),
            models: models.len(),
        });
    }

    let weights = normalize(weights);
    if previous_weights.len() != weights.len() {
        previous_weights.clear();
        previous_weights.resize(weights.len(), 0.0);
    }

    let mut order: Vec<usize> = (0..models.len()).collect();
    order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]));
    let strongest = order[0];

    let mut model = model.begin_batch();
    for key in keys {
        let key = key.as_ref();
        let Some((min, max)) = model.mutable_bounds(key) else {
            continue;
        };
        let current = model.get_int(key, min);

        let proposed = if model.metric_bounds(key).is_some() {
            metric_blend(models, &weights, strongest, key).map(|v| v.clamp(min, max))
        } else {
            match strategy {
                CategoricalStrategy::Morph => {
                    morph_categorical(rng, models, &order, &weights, previous_weights, key, current)
                }
                CategoricalStrategy::Strongest => other_int(models[strongest], key),
                CategoricalStrategy::Default => default_model.and_then(|m| other_int(m, key)),
                CategoricalStrategy::Model(index) => {
                    models.get(index).and_then(|m| other_int(m, key))
                }
            }
        };

        if let Some(proposed) = proposed.filter(|v| *v != current) {
            store_mutated(&mut model, key, current, proposed);
        }
        model.fix(key);
    }

    previous_weights.copy_from_slice(&weights);
    Ok(())
}

/// Negative weights count as zero; an all-zero set becomes uniform.
fn normalize(weights: &[f64]) -> Vec<f64> {
    let clean: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 })
        .collect();
    let sum: f64 = clean.iter().sum();
    if sum <= 0.0 {
        let uniform = 1.0 / clean.len() as f64;
        return vec![uniform; clean.len()];
    }
    clean.iter().map(|w| w / sum).collect()
}

/// Weighted average over the models holding `key`, rounded toward the strongest.
fn metric_blend(models: &[&Model], weights: &[f64], strongest: usize, key: &str) -> Option<i32> {
    let (total, weight_sum) = models
        .iter()
        .zip(weights)
        .filter_map(|(m, w)| other_int(m, key).map(|v| (f64::from(v) * w, *w)))
        .fold((0.0, 0.0), |(t, s), (v, w)| (t + v, s + w));
    if weight_sum <= 0.0 {
        return None;
    }
    let average = total / weight_sum;
    let toward = other_int(models[strongest], key).map_or(average, f64::from);
    Some(round_toward(average, toward))
}

/// Strongest-first walk: a model may claim the key only while the weights
/// move toward it (or it holds all the weight). The first model that already
/// matches, or whose coin toss commits, ends the walk.
///
/// Two commit rules are mixed by a `weight^4` coin: committing with
/// probability `weight` guarantees arrival as the weight nears 1, committing
/// with probability `weight - previous` keeps slow movement from jumping.
fn morph_categorical<R: Rng + ?Sized>(
    rng: &mut R,
    models: &[&Model],
    order: &[usize],
    weights: &[f64],
    previous: &[f64],
    key: &str,
    current: i32,
) -> Option<i32> {
    for &index in order {
        let Some(theirs) = other_int(models[index], key) else {
            continue;
        };
        if theirs == current {
            return None;
        }
        let weight = weights[index];
        let previous_weight = previous[index];
        if !(weight > previous_weight || weight >= 1.0) {
            continue;
        }
        let probability = if coin_toss(rng, weight.powi(4)) {
            weight
        } else {
            weight - previous_weight
        };
        if coin_toss(rng, probability) {
            return Some(theirs);
        }
    }
    None
}

/// Stateful morph driver that keeps the previous weights between calls.
#[derive(Debug, Clone, Default)]
pub struct Morpher {
    previous_weights: Vec<f64>,
    strategy: CategoricalStrategy,
}

impl Morpher {
    pub fn new(strategy: CategoricalStrategy) -> Self {
        Self {
            previous_weights: Vec::new(),
            strategy,
        }
    }

    pub fn strategy(&self) -> CategoricalStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: CategoricalStrategy) {
        self.strategy = strategy;
    }

    pub fn previous_weights(&self) -> &[f64] {
        &self.previous_weights
    }

    /// Forget movement history, e.g. when the reference models change.
    pub fn reset(&mut self) {
        self.previous_weights.clear();
    }

    pub fn morph<R, K>(
        &mut self,
        model: &mut Model,
        rng: &mut R,
        models: &[&Model],
        default_model: Option<&Model>,
        keys: &[K],
        weights: &[f64],
    ) -> Result<()>
    where
        R: Rng + ?Sized,
        K: AsRef<str>,
    {
        morph(
            model,
            rng,
            models,
            default_model,
            keys,
            weights,
            &mut self.previous_weights,
            self.strategy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;
    use approx::assert_relative_eq;

    fn synth(cutoff: i32, wave: i32) -> Model {
        let mut m = Model::new();
        m.set_int("cutoff", cutoff);
        m.set_bounds("cutoff", 0, 127);
        m.set_metric_bounds("cutoff", 0, 127);
        m.set_int("wave", wave);
        m.set_bounds("wave", 0, 7);
        m.clear_last_key();
        m
    }

    #[test]
    fn test_normalize() {
        let w = normalize(&[1.0, 3.0]);
        assert_relative_eq!(w[0], 0.25);
        assert_relative_eq!(w[1], 0.75);
        let w = normalize(&[0.0, 0.0, 0.0, 0.0]);
        assert!(w.iter().all(|v| (*v - 0.25).abs() < 1e-12));
        let w = normalize(&[-1.0, 2.0]);
        assert_relative_eq!(w[1], 1.0);
    }

    #[test]
    fn test_metric_average() {
        let mut rng = create_rng(41);
        let a = synth(0, 0);
        let b = synth(100, 7);
        let mut model = synth(50, 0);
        let mut prev = Vec::new();
        morph(
            &mut model,
            &mut rng,
            &[&a, &b],
            None,
            &["cutoff"],
            &[1.0, 3.0],
            &mut prev,
            CategoricalStrategy::Morph,
        )
        .unwrap();
        assert_eq!(model.get_int("cutoff", -1), 75);
        assert_eq!(prev.len(), 2);
        assert_relative_eq!(prev[1], 0.75);
    }

    #[test]
    fn test_metric_rounds_toward_strongest() {
        let mut rng = create_rng(42);
        let a = synth(0, 0);
        let b = synth(10, 7);
        let c = synth(11, 7);
        let mut model = synth(50, 0);
        let mut prev = Vec::new();
        morph(
            &mut model,
            &mut rng,
            &[&a, &b, &c],
            None,
            &["cutoff"],
            &[1.0, 2.0, 0.0],
            &mut prev,
            CategoricalStrategy::Morph,
        )
        .unwrap();
        // 20/3 = 6.67, strongest is b (10) so rounds up
        assert_eq!(model.get_int("cutoff", -1), 7);

        morph(
            &mut model,
            &mut rng,
            &[&a, &b, &c],
            None,
            &["cutoff"],
            &[2.0, 1.0, 0.0],
            &mut prev,
            CategoricalStrategy::Morph,
        )
        .unwrap();
        // 10/3 = 3.33, strongest is a (0) so rounds down
        assert_eq!(model.get_int("cutoff", -1), 3);
    }

    #[test]
    fn test_strongest_default_and_index() {
        let mut rng = create_rng(43);
        let a = synth(0, 2);
        let b = synth(0, 5);
        let fallback = synth(0, 6);
        let mut model = synth(0, 0);
        let mut prev = Vec::new();
        let models = [&a, &b];

        morph(
            &mut model,
            &mut rng,
            &models,
            Some(&fallback),
            &["wave"],
            &[0.2, 0.8],
            &mut prev,
            CategoricalStrategy::Strongest,
        )
        .unwrap();
        assert_eq!(model.get_int("wave", -1), 5);

        morph(
            &mut model,
            &mut rng,
            &models,
            Some(&fallback),
            &["wave"],
            &[0.2, 0.8],
            &mut prev,
            CategoricalStrategy::Default,
        )
        .unwrap();
        assert_eq!(model.get_int("wave", -1), 6);

        morph(
            &mut model,
            &mut rng,
            &models,
            Some(&fallback),
            &["wave"],
            &[0.2, 0.8],
            &mut prev,
            CategoricalStrategy::Model(0),
        )
        .unwrap();
        assert_eq!(model.get_int("wave", -1), 2);
    }

    #[test]
    fn test_full_weight_converges_categorical() {
        let mut rng = create_rng(44);
        let a = synth(0, 2);
        let b = synth(0, 5);
        let mut model = synth(0, 0);
        let mut morpher = Morpher::default();
        morpher
            .morph(&mut model, &mut rng, &[&a, &b], None, &["wave"], &[0.0, 1.0])
            .unwrap();
        assert_eq!(model.get_int("wave", -1), 5);
    }

    #[test]
    fn test_lock_in_toward_strongest() {
        let mut rng = create_rng(45);
        let a = synth(0, 2);
        let b = synth(0, 5);
        let mut model = synth(0, 2);
        let mut morpher = Morpher::new(CategoricalStrategy::Morph);
        let mut locked = false;
        for step in 0..=100 {
            let t = step as f64 / 100.0;
            morpher
                .morph(&mut model, &mut rng, &[&a, &b], None, &["wave"], &[1.0 - t, t])
                .unwrap();
            let wave = model.get_int("wave", -1);
            if locked {
                assert_eq!(wave, 5, "reverted at step {step}");
            } else if wave == 5 && t > 0.5 {
                locked = true;
            }
        }
        assert!(locked);
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut rng = create_rng(46);
        let a = synth(0, 2);
        let mut model = synth(0, 0);
        let mut prev = Vec::new();
        assert_eq!(
            morph(&mut model, &mut rng, &[], None, &["wave"], &[], &mut prev, CategoricalStrategy::Morph),
            Err(Error::NoMorphModels)
        );
        assert_eq!(
            morph(&mut model, &mut rng, &[&a], None, &["wave"], &[0.5, 0.5], &mut prev, CategoricalStrategy::Morph),
            Err(Error::MorphWeightMismatch { weights: 2, models: 1 })
        );
    }
}
