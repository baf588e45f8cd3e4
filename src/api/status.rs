use crate::state::{TrainRegistry, WorldState};
use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Shared state for the status endpoints
pub struct StatusAppState {
    pub registry: Arc<TrainRegistry>,
}

/// Service identity returned by GET /
#[derive(Serialize)]
struct ServiceInfo {
    service: &'static str,
    status: &'static str,
    timestamp: f64,
}

/// Create router for the read-only endpoints
pub fn create_status_router(state: Arc<StatusAppState>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/status", get(get_status))
        .with_state(state)
}

/// GET / - Service identity/health
async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "TrainSafe Backend",
        status: "ok",
        timestamp: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
    })
}

/// GET /status - Current full state
async fn get_status(State(state): State<Arc<StatusAppState>>) -> Json<WorldState> {
    Json(state.registry.snapshot())
}
