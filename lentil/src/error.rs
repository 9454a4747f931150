//! Error types for lentil

use thiserror::Error;

/// Result type alias for fitting, sampling and summarizing
pub type Result<T> = std::result::Result<T, LentilError>;

#[derive(Error, Debug)]
pub enum LentilError {
    /// Mismatched, empty or non-finite input data
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Non-finite loss or sample
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    /// Learning rate, epoch, sample or quantile settings out of range
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Candle(#[from] candle_util::candle_core::Error),
}

impl LentilError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
