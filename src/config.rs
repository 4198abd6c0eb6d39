//! Editor session configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a [`PatchEditor`](crate::PatchEditor) session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub undo_depth: usize,
    /// Candidates per hill-climb generation.
    pub population_size: usize,
    /// Hill-climb generations kept for backing up.
    pub history_depth: usize,
    /// Capacity of the MIDI controller inbox.
    pub inbox_capacity: usize,
    pub default_mutation_weight: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            undo_depth: 100,
            population_size: 16,
            history_depth: 32,
            inbox_capacity: 256,
            default_mutation_weight: 0.1,
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.undo_depth == 0 {
            return Err(Error::InvalidConfig("undo_depth must be > 0".into()));
        }
        if self.population_size < 2 {
            return Err(Error::InvalidConfig(format!(
                "population_size {} too small (need at least 2)",
                self.population_size
            )));
        }
        if self.history_depth == 0 {
            return Err(Error::InvalidConfig("history_depth must be > 0".into()));
        }
        if self.inbox_capacity == 0 {
            return Err(Error::InvalidConfig("inbox_capacity must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.default_mutation_weight) {
            return Err(Error::InvalidConfig(format!(
                "default_mutation_weight {} out of range (0-1)",
                self.default_mutation_weight
            )));
        }
        Ok(())
    }
}
