use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{audit, calls, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Calls
        .route("/calls", post(calls::submit_call))
        .route("/calls", get(calls::list_calls))
        .route("/calls/{id}", get(calls::get_call))
        .route("/calls/{id}/action", post(calls::call_action))
        .route("/calls/{id}/priority", post(calls::set_priority))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
