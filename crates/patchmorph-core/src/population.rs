//! Hill-climbing population support.
//!
//! Each generation the user picks up to three favourite candidates; the next
//! population is bred from them with `copy()` plus the mutation operators.
//! The picks are kept on three parallel history stacks so the climb can back
//! up one generation.

use crate::model::Model;
use crate::mutation::{mutate, opposite, recombine};
use rand::Rng;
use tracing::debug;

pub const DEFAULT_POPULATION_SIZE: usize = 16;

/// Parents kept per generation.
pub const PARENTS: usize = 3;

#[derive(Debug)]
pub struct HillClimb {
    history: [Vec<Option<Model>>; PARENTS],
    population_size: usize,
    history_depth: usize,
}

impl Default for HillClimb {
    fn default() -> Self {
        Self::new(DEFAULT_POPULATION_SIZE, 32)
    }
}

impl HillClimb {
    pub fn new(population_size: usize, history_depth: usize) -> Self {
        Self {
            history: Default::default(),
            population_size: population_size.max(1),
            history_depth: history_depth.max(1),
        }
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// Generations currently on the history stacks.
    pub fn generations(&self) -> usize {
        self.history[0].len()
    }

    /// Record `selected` (at most three are used) and breed the next population.
    ///
    /// Every candidate is an independent `copy()`; the parents are never modified.
    pub fn climb<R, K>(
        &mut self,
        rng: &mut R,
        selected: &[&Model],
        keys: &[K],
        weight: f64,
    ) -> Vec<Model>
    where
        R: Rng + ?Sized,
        K: AsRef<str>,
    {
        let parents: Vec<&Model> = selected.iter().take(PARENTS).copied().collect();
        if parents.is_empty() {
            return Vec::new();
        }

        for (slot, stack) in self.history.iter_mut().enumerate() {
            stack.push(parents.get(slot).map(|m| m.copy()));
            if stack.len() > self.history_depth {
                stack.remove(0);
            }
        }
        debug!(
            "Hill-climb generation {} from {} parents",
            self.generations(),
            parents.len()
        );

        self.breed(rng, &parents, keys, weight)
    }

    fn breed<R, K>(&self, rng: &mut R, parents: &[&Model], keys: &[K], weight: f64) -> Vec<Model>
    where
        R: Rng + ?Sized,
        K: AsRef<str>,
    {
        let n = parents.len();
        (0..self.population_size)
            .map(|i| {
                let a = parents[i % n];
                let b = parents[(i + 1) % n];
                let mut child = a.copy();
                match i % 4 {
                    // plain mutation
                    0 => mutate(&mut child, rng, keys, weight),
                    // cross with the next parent, then a light mutation
                    1 if n > 1 => {
                        recombine(&mut child, rng, b, keys, 0.5);
                        mutate(&mut child, rng, keys, weight / 2.0);
                    }
                    // stronger cross
                    2 if n > 1 => recombine(&mut child, rng, b, keys, 0.75 + weight / 4.0),
                    // diverge from the next parent (or from nothing)
                    3 => {
                        let other = (n > 1).then_some(b);
                        opposite(&mut child, rng, other, keys, weight, true);
                    }
                    _ => mutate(&mut child, rng, keys, weight),
                }
                child
            })
            .collect()
    }

    /// Drop the current generation and return the previous generation's
    /// parents, to be passed to [`climb`](Self::climb) again.
    ///
    /// `None` when there is no earlier generation to return to.
    pub fn back_up(&mut self) -> Option<Vec<Model>> {
        if self.generations() < 2 {
            return None;
        }
        for stack in &mut self.history {
            stack.pop();
        }
        let previous: Vec<Model> = self
            .history
            .iter_mut()
            .filter_map(|stack| stack.pop().flatten())
            .collect();
        Some(previous)
    }

    pub fn reset(&mut self) {
        for stack in &mut self.history {
            stack.clear();
        }
    }
}
