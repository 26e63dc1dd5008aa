use crate::handlers::health::{liveness_check, readiness_check};
use crate::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Public probes; no authentication.
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
}
