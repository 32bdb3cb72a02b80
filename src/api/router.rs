use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::events;
use super::experiments;
use super::health;
use super::state::AppState;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/events", get(events::stream_events))
        .route("/experiments", get(experiments::list_assignments))
        .route(
            "/experiments/{name}",
            get(experiments::get_assignment).delete(experiments::reset_experiment),
        )
        .route("/experiments/{name}/split", post(experiments::resolve_split))
        .route("/experiments/{name}/binary", post(experiments::resolve_binary))
        .route(
            "/experiments/{name}/multivariate",
            post(experiments::resolve_multivariate),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
