//! Error types for MIDI controller input.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid MIDI channel: {0} (expected 0-15)")]
    InvalidChannel(u8),

    #[error("Invalid controller number: {0}")]
    InvalidController(u16),

    #[error("Unknown binding: {0}")]
    UnknownBinding(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
