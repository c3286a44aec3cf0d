//! Health check handlers and the exposure adapter

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    error::{AppError, Result},
    health::{HealthMonitor, HealthStatus, SystemHealth},
    models::ApiResponse,
    AppState,
};

/// What `GET /health` answers with: the full report, or a minimal failure
/// body when the aggregation itself did not finish.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HealthResponseBody {
    Report(SystemHealth),
    Failure {
        overall: HealthStatus,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl HealthResponseBody {
    pub fn overall(&self) -> HealthStatus {
        match self {
            HealthResponseBody::Report(health) => health.overall,
            HealthResponseBody::Failure { overall, .. } => *overall,
        }
    }
}

pub fn status_code_for(status: HealthStatus) -> StatusCode {
    if status.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Runs a full aggregation and maps it to a transport status. Never fails:
/// a panic inside the aggregation becomes a 503 with a failure body.
pub async fn system_health_response(
    monitor: Arc<HealthMonitor>,
) -> (StatusCode, HealthResponseBody) {
    respond_with(async move { monitor.check_system_health().await }).await
}

pub(crate) async fn respond_with<F>(aggregation: F) -> (StatusCode, HealthResponseBody)
where
    F: Future<Output = SystemHealth> + Send + 'static,
{
    match tokio::spawn(aggregation).await {
        Ok(health) => {
            if health.overall == HealthStatus::Degraded {
                warn!("System health is degraded");
            } else if health.overall == HealthStatus::Unhealthy {
                warn!("System health is unhealthy");
            }
            (status_code_for(health.overall), HealthResponseBody::Report(health))
        }
        Err(err) => {
            error!("Health aggregation failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthResponseBody::Failure {
                    overall: HealthStatus::Unhealthy,
                    error: err.to_string(),
                    timestamp: Utc::now(),
                },
            )
        }
    }
}

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /health - Running health checks");

    let (status_code, body) = system_health_response(state.monitor.clone()).await;
    (status_code, Json(body))
}

pub async fn handle_component_health(
    State(state): State<AppState>,
    Path(component): Path<String>,
) -> Result<impl IntoResponse> {
    info!("GET /health/{} - Checking specific component", component);

    let result = state
        .monitor
        .check_component(&component)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Component '{}' not found", component)))?;

    Ok((status_code_for(result.status), Json(ApiResponse::success(result))))
}

pub async fn handle_circuit_breakers(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.monitor.circuit_breaker_states()))
}

pub async fn handle_reset_circuit_breakers(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /health/circuit-breakers/reset");
    state.monitor.reset();
    StatusCode::NO_CONTENT
}

pub async fn handle_readiness(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /ready - Readiness probe");

    let (status_code, body) = system_health_response(state.monitor.clone()).await;
    let overall = body.overall();

    if status_code.is_success() {
        (
            status_code,
            Json(ApiResponse::success(serde_json::json!({
                "status": "ready",
                "overall": overall,
                "timestamp": Utc::now().timestamp()
            }))),
        )
    } else {
        (
            status_code,
            Json(ApiResponse::error(format!("Service not ready: {}", overall))),
        )
    }
}

pub async fn handle_liveness() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "status": "alive",
            "timestamp": Utc::now().timestamp()
        }))),
    )
}
