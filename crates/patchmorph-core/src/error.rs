//! Error types for patchmorph-core.
//!
//! Most contract violations in the parameter model are logged and answered
//! with a safe default instead of an error; only caller-visible failures live here.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unknown synth: {0}")]
    UnknownSynth(String),

    #[error("Synth already registered: {0}")]
    DuplicateSynth(String),

    #[error("Morph needs at least one model")]
    NoMorphModels,

    #[error("Morph weights ({weights}) do not match models ({models})")]
    MorphWeightMismatch { weights: usize, models: usize },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
