use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::{ml::ModelHandle, state::AppState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    model: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(model_id: String, version: String) -> Self {
        Self {
            status: "healthy".to_string(),
            model_id: Some(model_id),
            version: Some(version),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            model_id: None,
            version: None,
            error: Some(error),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

fn check_model(model: &ModelHandle) -> ComponentHealth {
    match model.metadata() {
        Some(metadata) => {
            ComponentHealth::healthy(metadata.model_id.clone(), metadata.version.clone())
        }
        None => ComponentHealth::unhealthy(super::error::MODEL_NOT_LOADED.to_string()),
    }
}

/// GET /health - Health check endpoint
///
/// Reports whether the forecast model is loaded
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let model_health = check_model(state.model());
    let all_healthy = model_health.is_healthy();

    let response = HealthResponse {
        status: if all_healthy {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: chrono::Utc::now(),
        checks: HealthChecks {
            model: model_health,
        },
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(healthy = all_healthy, "Health check completed");

    (status_code, Json(response))
}

/// GET /health/ready - Readiness probe
///
/// Returns 200 once a model is loaded
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.model().is_available() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe
///
/// Returns 200 if the application is running
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::LinearRegressionModel;

    #[test]
    fn test_check_model_available() {
        let handle = ModelHandle::available(LinearRegressionModel::with_features(&["f"], vec![1.0], 0.0));
        let health = check_model(&handle);
        assert!(health.is_healthy());
        assert_eq!(health.model_id.as_deref(), Some("linear"));
        assert!(health.error.is_none());
    }

    #[test]
    fn test_check_model_unavailable_hides_reason() {
        let health = check_model(&ModelHandle::unavailable("/srv/models/pv.bin: no such file"));
        assert!(!health.is_healthy());
        assert!(health.model_id.is_none());
        assert_eq!(health.error.as_deref(), Some("Model not loaded"));
    }
}
