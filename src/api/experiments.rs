//! Experiment assignment endpoints
//!
//! Condition and variable values are arbitrary JSON.

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::experiment::{
    Assignment, ExperimentKind, ExperimentName, StoredAssignment, Variables, WeightedSet,
    DEFAULT_INCLUSION_PROBABILITY,
};
use crate::domain::DomainError;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SplitRequest {
    pub conditions: Vec<ConditionRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionRequest {
    pub value: Value,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinaryRequest {
    pub a: Value,
    pub b: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultivariateRequest {
    pub variables: Vec<VariableRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableRequest {
    pub value: Value,
    #[serde(default = "default_probability")]
    pub probability: f64,
}

/// Reject a bad path name before the body is looked at
fn validate_name(name: &str) -> Result<(), ApiError> {
    ExperimentName::new(name)
        .map(|_| ())
        .map_err(|e| ApiError::from(DomainError::from(e)).with_param("name"))
}

/// Attach `param` to input errors only
fn invalid_param(err: DomainError, param: &str) -> ApiError {
    if err.is_invalid_input() {
        ApiError::from(err).with_param(param)
    } else {
        ApiError::from(err)
    }
}

fn default_weight() -> f64 {
    1.0
}

fn default_probability() -> f64 {
    DEFAULT_INCLUSION_PROBABILITY
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ConditionResponse {
    pub name: String,
    pub kind: ExperimentKind,
    pub condition: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariablesResponse {
    pub name: String,
    pub kind: ExperimentKind,
    pub variables: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResponse {
    pub name: String,
    pub kind: ExperimentKind,
    pub assignment: Assignment,
    pub assigned_at: String,
}

impl From<StoredAssignment> for AssignmentResponse {
    fn from(record: StoredAssignment) -> Self {
        Self {
            name: record.name().to_string(),
            kind: record.kind(),
            assigned_at: record.assigned_at().to_rfc3339(),
            assignment: record.into_assignment(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListAssignmentsResponse {
    pub assignments: Vec<AssignmentResponse>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub name: String,
    pub reset: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /experiments
pub async fn list_assignments(
    State(state): State<AppState>,
) -> Result<Json<ListAssignmentsResponse>, ApiError> {
    debug!("Listing stored assignments");

    let mut records = state.assignments.list().await?;
    records.sort_by(|a, b| a.name().cmp(b.name()));

    let assignments: Vec<AssignmentResponse> = records.into_iter().map(Into::into).collect();
    let total = assignments.len();

    Ok(Json(ListAssignmentsResponse { assignments, total }))
}

/// GET /experiments/{name}
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    debug!(experiment = %name, "Getting stored assignment");

    let record = state
        .engine
        .assignment(&name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No assignment for experiment '{}'", name)))?;

    Ok(Json(record.into()))
}

/// POST /experiments/{name}/split
pub async fn resolve_split(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<SplitRequest>,
) -> Result<Json<ConditionResponse>, ApiError> {
    validate_name(&name)?;

    let conditions: WeightedSet<Value> = request
        .conditions
        .into_iter()
        .map(|c| (c.value, c.weight))
        .collect();

    let condition = state
        .engine
        .resolve_split(&name, &conditions)
        .await
        .map_err(|e| invalid_param(e, "conditions"))?;

    Ok(Json(ConditionResponse {
        name,
        kind: ExperimentKind::WeightedSplit,
        condition,
    }))
}

/// POST /experiments/{name}/binary
pub async fn resolve_binary(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<BinaryRequest>,
) -> Result<Json<ConditionResponse>, ApiError> {
    validate_name(&name)?;

    let condition = state
        .engine
        .resolve_binary(&name, request.a, request.b)
        .await?;

    Ok(Json(ConditionResponse {
        name,
        kind: ExperimentKind::Binary,
        condition,
    }))
}

/// POST /experiments/{name}/multivariate
pub async fn resolve_multivariate(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<MultivariateRequest>,
) -> Result<Json<VariablesResponse>, ApiError> {
    validate_name(&name)?;

    let variables: Variables<Value> = request
        .variables
        .into_iter()
        .map(|v| (v.value, v.probability))
        .collect();

    let included = state
        .engine
        .resolve_multivariate(&name, &variables)
        .await
        .map_err(|e| invalid_param(e, "variables"))?;

    Ok(Json(VariablesResponse {
        name,
        kind: ExperimentKind::Multivariate,
        variables: included.into_vec(),
    }))
}

/// DELETE /experiments/{name}
pub async fn reset_experiment(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ResetResponse>, ApiError> {
    let reset = state.engine.reset(&name).await?;

    Ok(Json(ResetResponse { name, reset }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::api::{create_router, AppState};
    use crate::domain::storage::mock::MockStorage;
    use crate::domain::storage::Storage;
    use crate::domain::StoredAssignment;
    use crate::infrastructure::experiment::{StorageAssignmentStore, WeightedSampler};
    use crate::infrastructure::services::AssignmentEngine;
    use crate::infrastructure::storage::InMemoryStorage;

    fn app_with_storage(storage: Arc<dyn Storage<StoredAssignment>>) -> Router {
        let store = Arc::new(StorageAssignmentStore::new(storage.clone()));
        let engine = AssignmentEngine::new(store).with_sampler(WeightedSampler::seeded(42));
        create_router(AppState::new(storage, engine))
    }

    fn app() -> Router {
        app_with_storage(Arc::new(InMemoryStorage::<StoredAssignment>::new()))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_ready_reports_store_failure() {
        let storage = Arc::new(MockStorage::<StoredAssignment>::new().with_error("offline"));
        let (status, body) = send(&app_with_storage(storage), Method::GET, "/ready", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_split_is_sticky() {
        let app = app();
        let uri = "/experiments/layout/split";

        let (status, first) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({ "conditions": [{ "value": "grid" }, { "value": {"cols": 3} }] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["kind"], "weighted_split");

        let (_, second) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({ "conditions": [{ "value": "something else" }] })),
        )
        .await;
        assert_eq!(first["condition"], second["condition"]);
    }

    #[tokio::test]
    async fn test_split_zero_weight_excluded() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/experiments/flag/split",
            Some(json!({ "conditions": [
                { "value": false, "weight": 0.0 },
                { "value": true, "weight": 2.0 }
            ] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["condition"], true);
    }

    #[tokio::test]
    async fn test_empty_split_is_bad_request() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/experiments/empty/split",
            Some(json!({ "conditions": [] })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(body["error"]["param"], "conditions");
    }

    #[tokio::test]
    async fn test_invalid_name_is_reported_as_name() {
        let long = "n".repeat(256);
        let app = app();

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/experiments/{}/split", long),
            Some(json!({ "conditions": [{ "value": "a" }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "name");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/experiments/{}/multivariate", long),
            Some(json!({ "variables": [{ "value": "x" }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "name");
    }

    #[tokio::test]
    async fn test_binary() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/experiments/cta/binary",
            Some(json!({ "a": "Buy now", "b": "Add to cart" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "binary");
        assert!(body["condition"] == "Buy now" || body["condition"] == "Add to cart");
    }

    #[tokio::test]
    async fn test_multivariate() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/experiments/home/multivariate",
            Some(json!({ "variables": [
                { "value": "banner", "probability": 1.0 },
                { "value": "badge", "probability": 0.0 },
                { "value": "tooltip" }
            ] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let variables = body["variables"].as_array().unwrap();
        assert!(variables.contains(&json!("banner")));
        assert!(!variables.contains(&json!("badge")));
    }

    #[tokio::test]
    async fn test_multivariate_probability_out_of_range() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/experiments/home/multivariate",
            Some(json!({ "variables": [{ "value": "x", "probability": 1.5 }] })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "variables");
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_conflict() {
        let app = app();
        send(
            &app,
            Method::POST,
            "/experiments/shared/binary",
            Some(json!({ "a": 1, "b": 2 })),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/experiments/shared/multivariate",
            Some(json!({ "variables": [{ "value": "x" }] })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["type"], "conflict_error");
    }

    #[tokio::test]
    async fn test_get_list_and_reset() {
        let app = app();

        let (status, _) = send(&app, Method::GET, "/experiments/cta", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, resolved) = send(
            &app,
            Method::POST,
            "/experiments/cta/binary",
            Some(json!({ "a": "A", "b": "B" })),
        )
        .await;

        let (status, stored) = send(&app, Method::GET, "/experiments/cta", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["assignment"]["type"], "condition");
        assert_eq!(stored["assignment"]["value"], resolved["condition"]);

        let (_, listed) = send(&app, Method::GET, "/experiments", None).await;
        assert_eq!(listed["total"], 1);
        assert_eq!(listed["assignments"][0]["name"], "cta");

        let (status, reset) = send(&app, Method::DELETE, "/experiments/cta", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reset, json!({ "name": "cta", "reset": true }));

        let (_, reset) = send(&app, Method::DELETE, "/experiments/cta", None).await;
        assert_eq!(reset["reset"], false);

        let (_, listed) = send(&app, Method::GET, "/experiments", None).await;
        assert_eq!(listed["total"], 0);
    }

    #[tokio::test]
    async fn test_event_stream_content_type() {
        let request = Request::builder()
            .uri("/events")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn test_resolution_published_to_subscribers() {
        let storage: Arc<dyn Storage<StoredAssignment>> =
            Arc::new(InMemoryStorage::<StoredAssignment>::new());
        let store = Arc::new(StorageAssignmentStore::new(storage.clone()));
        let state = AppState::new(storage, AssignmentEngine::new(store));
        let mut rx = state.events.subscribe();

        state.engine.resolve_binary("cta", 'A', 'B').await.unwrap();

        assert_eq!(rx.recv().await.unwrap().event_type(), "will_resolve");
        assert_eq!(rx.recv().await.unwrap().event_type(), "did_resolve");
    }

    #[tokio::test]
    async fn test_store_failure_is_unavailable() {
        let storage = Arc::new(MockStorage::<StoredAssignment>::new().with_error("offline"));
        let (status, body) = send(
            &app_with_storage(storage),
            Method::POST,
            "/experiments/cta/binary",
            Some(json!({ "a": "A", "b": "B" })),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["type"], "service_unavailable_error");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/experiments/cta/binary",
            Some(json!({ "a": "only one" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }
}
