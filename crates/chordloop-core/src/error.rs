//! Error types for chordloop

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChordloopError {
    #[error("Unknown chord type: {0}")]
    UnknownChordType(String),
    #[error("Unknown scale: {0}")]
    UnknownScale(String),
}

pub type Result<T> = std::result::Result<T, ChordloopError>;
