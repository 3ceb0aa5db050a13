//! Error types for the forecasting engine

use thiserror::Error;

/// Errors raised by the scoring, blending and simulation stages.
///
/// Every variant is a clean failure of the current run; nothing is retried
/// inside the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RaceOddsError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate distribution: total probability mass is {total}")]
    DegenerateDistribution { total: f64 },

    #[error("Data source error: {0}")]
    Source(String),
}

impl RaceOddsError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        RaceOddsError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RaceOddsError>;
