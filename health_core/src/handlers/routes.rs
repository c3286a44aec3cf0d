//! Route table for the health surface

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use super::health::{
    handle_circuit_breakers, handle_component_health, handle_health, handle_liveness,
    handle_readiness, handle_reset_circuit_breakers,
};
use super::queue::{handle_deregister_worker, handle_heartbeat};
use crate::{models::ApiResponse, AppState};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/health/circuit-breakers", get(handle_circuit_breakers))
        .route(
            "/health/circuit-breakers/reset",
            post(handle_reset_circuit_breakers),
        )
        .route("/health/:component", get(handle_component_health))
        .route("/live", get(handle_liveness))
        .route("/ready", get(handle_readiness))
        .route("/queue/heartbeat", post(handle_heartbeat))
        .route("/queue/workers/:worker_id", delete(handle_deregister_worker))
}

async fn handle_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(serde_json::json!({
        "app": state.app_name,
        "version": state.version,
        "components": state.monitor.component_names(),
        "endpoints": {
            "health": "/health",
            "component": "/health/{component}",
            "circuit_breakers": "/health/circuit-breakers",
            "reset": "/health/circuit-breakers/reset",
            "live": "/live",
            "ready": "/ready",
            "heartbeat": "/queue/heartbeat",
            "deregister": "/queue/workers/{worker_id}"
        }
    })))
}
