use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::{
    api::error::ApiError,
    config::ForecastConfig,
    domain::{ForecastStep, RawPoint},
    ml::ModelHandle,
    state::AppState,
};

/// POST /forecast request body
#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    /// Integer, numeric string or absent
    #[serde(default)]
    pub horizon: Option<Value>,
    #[serde(default)]
    pub generation: Option<Vec<RawPoint>>,
    #[serde(default)]
    pub weather: Option<Vec<RawPoint>>,
}

/// POST /forecast response body
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub forecast: Vec<ForecastStep>,
}

/// POST /forecast - Recursive hourly generation forecast
///
/// The model check runs before the body is looked at, so a service without a
/// model answers every request the same way.
pub async fn post_forecast(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    if let ModelHandle::Unavailable { reason } = state.model() {
        return Err(ApiError::ServiceUnavailable(reason.clone()));
    }

    let Json(body) = payload?;
    match &body {
        Value::Object(fields) if !fields.is_empty() => {}
        Value::Null | Value::Object(_) => {
            return Err(ApiError::BadRequest("No JSON received".to_string()))
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Request body must be a JSON object".to_string(),
            ))
        }
    }

    let request: ForecastRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid forecast request: {e}")))?;

    let horizon = resolve_horizon(request.horizon.as_ref(), &state.cfg.forecast)?;

    let (generation, weather) = match (request.generation, request.weather) {
        (Some(generation), Some(weather)) if !generation.is_empty() && !weather.is_empty() => {
            (generation, weather)
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Both generation and weather data are required".to_string(),
            ))
        }
    };

    let generation_points = generation.len();
    let weather_points = weather.len();
    let engine = Arc::clone(&state.engine);

    // off the async workers so the request timeout can interrupt a long run
    let started = Instant::now();
    let forecast = tokio::task::spawn_blocking(move || engine.forecast(&generation, &weather, horizon))
        .await
        .map_err(|e| ApiError::internal(format!("forecast task failed: {e}")))??;

    info!(
        horizon,
        generation_points,
        weather_points,
        duration_ms = started.elapsed().as_millis() as u64,
        "forecast completed"
    );

    Ok(Json(ForecastResponse { forecast }))
}

/// Absent means the configured default; zero or negative means no steps.
pub fn resolve_horizon(raw: Option<&Value>, cfg: &ForecastConfig) -> Result<usize, ApiError> {
    let requested: i64 = match raw {
        None | Some(Value::Null) => return Ok(cfg.default_horizon as usize),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(whole) => whole,
            // fractional horizons truncate toward zero
            None => number.as_f64().map(|f| f.trunc() as i64).unwrap_or(i64::MAX),
        },
        Some(Value::String(text)) => text.trim().parse().map_err(|_| {
            ApiError::BadRequest(format!("horizon must be an integer, got {text:?}"))
        })?,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "horizon must be an integer, got {other}"
            )))
        }
    };

    if requested <= 0 {
        return Ok(0);
    }
    if requested > i64::from(cfg.max_horizon) {
        return Err(ApiError::BadRequest(format!(
            "horizon must not exceed {} hours",
            cfg.max_horizon
        )));
    }
    Ok(requested as usize)
}
