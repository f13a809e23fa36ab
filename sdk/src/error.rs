use thiserror::Error;

use crate::state::State;

/// Errors returned by session control operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QsoError {
    #[error("Session not initialized: configuration incomplete")]
    NotInitialized,

    #[error("Operation not allowed in state {0}")]
    InvalidState(State),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Session task stopped")]
    Closed,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config variable {0} not set")]
    MissingField(&'static str),

    #[error("Config variable {0} must be greater than zero")]
    ZeroPeriod(&'static str),
}

/// Speech codec geometry violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("PCM block length mismatch: expected {expected} samples, got {got}")]
    PcmLength { expected: usize, got: usize },

    #[error("Coded frame length mismatch: expected {expected} bytes, got {got}")]
    FrameLength { expected: usize, got: usize },
}
