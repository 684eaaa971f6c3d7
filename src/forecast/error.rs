use thiserror::Error;

use crate::domain::SeriesKind;

/// Failures of the forecast pipeline, from input validation to prediction
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("{series} record {index} is missing '{field}'")]
    MissingField {
        series: SeriesKind,
        index: usize,
        field: &'static str,
    },

    #[error("{series} record {index} has an unparseable timestamp: {value}")]
    InvalidTimestamp {
        series: SeriesKind,
        index: usize,
        value: String,
    },

    #[error("{series} record {index} has a non-numeric value")]
    InvalidValue { series: SeriesKind, index: usize },

    #[error("No matching timestamps in generation and weather data")]
    NoOverlap,

    #[error("Model not loaded: {0}")]
    ModelUnavailable(String),

    #[error("Prediction failed at step {step}: {message}")]
    Prediction { step: usize, message: String },

    #[error("Forecast timestamp out of range at step {step}")]
    TimeOverflow { step: usize },
}

impl ForecastError {
    /// True for errors caused by the request payload
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::InvalidTimestamp { .. }
                | Self::InvalidValue { .. }
                | Self::NoOverlap
        )
    }
}
