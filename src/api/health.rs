//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use super::types::Json;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignments: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Liveness: 200 whenever the process is serving
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        assignments: None,
        message: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness: the assignment store answers
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status, code, assignments, message) = match state.assignments.count().await {
        Ok(count) => (HealthStatus::Healthy, StatusCode::OK, Some(count), None),
        Err(e) => (
            HealthStatus::Unhealthy,
            StatusCode::SERVICE_UNAVAILABLE,
            None,
            Some(e.to_string()),
        ),
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        assignments,
        message,
    };

    (code, Json(response))
}
