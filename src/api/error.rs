use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::forecast::ForecastError;

/// Message returned whenever the model could not be loaded
pub const MODEL_NOT_LOADED: &str = "Model not loaded";

/// Message returned when the model fails to produce a prediction
pub const FORECAST_FAILED: &str = "Forecast failed";

/// Message returned when a forecast step falls outside the representable dates
pub const FORECAST_OUT_OF_RANGE: &str = "Forecast timestamps out of range";

pub const REQUEST_TIMED_OUT: &str = "Request timed out";

pub const PAYLOAD_TOO_LARGE: &str = "Request body too large";

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Request timed out")]
    RequestTimeout,

    /// `message` is returned to the client, `detail` is only logged
    #[error("Internal server error: {detail}")]
    InternalError {
        message: &'static str,
        detail: String,
    },
}

/// Error response that gets serialized to JSON
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    /// Internal failure reported to the client as "Forecast failed"
    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::InternalError {
            message: FORECAST_FAILED,
            detail: detail.into(),
        }
    }

    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            // a missing model is reported as 500, not 503
            ApiError::ServiceUnavailable(_) | ApiError::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing message; internal detail is never echoed back
    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(message) => message.clone(),
            ApiError::PayloadTooLarge(_) => PAYLOAD_TOO_LARGE.to_string(),
            ApiError::RequestTimeout => REQUEST_TIMED_OUT.to_string(),
            ApiError::ServiceUnavailable(_) => MODEL_NOT_LOADED.to_string(),
            ApiError::InternalError { message, .. } => message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::BadRequest(_) | ApiError::PayloadTooLarge(_) => {
                tracing::warn!(error = %self, "Rejected request")
            }
            ApiError::RequestTimeout => tracing::warn!("Request timed out"),
            ApiError::ServiceUnavailable(_) => tracing::error!(error = %self, "Model unavailable"),
            ApiError::InternalError { .. } => tracing::error!(error = %self, "API error occurred"),
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<ForecastError> for ApiError {
    fn from(error: ForecastError) -> Self {
        match error {
            ForecastError::ModelUnavailable(reason) => ApiError::ServiceUnavailable(reason),
            e if e.is_input_error() => ApiError::BadRequest(e.to_string()),
            e @ ForecastError::TimeOverflow { .. } => ApiError::InternalError {
                message: FORECAST_OUT_OF_RANGE,
                detail: e.to_string(),
            },
            e => ApiError::internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::BadRequest("No JSON received".to_string())
            }
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                ApiError::PayloadTooLarge(other.body_text())
            }
            other => ApiError::BadRequest(format!("Invalid JSON payload: {}", other.body_text())),
        }
    }
}
