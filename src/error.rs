//! Centralized error type for the patchmorph umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] patchmorph_core::Error),

    #[cfg(feature = "midi")]
    #[error("MIDI: {0}")]
    Midi(#[from] patchmorph_midi::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
