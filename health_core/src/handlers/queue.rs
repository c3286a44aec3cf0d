//! Queue worker heartbeat handler

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::{
    error::{AppError, Result},
    models::ApiResponse,
    queue::HeartbeatRequest,
    AppState,
};

pub async fn handle_heartbeat(
    State(state): State<AppState>,
    Json(request): Json<HeartbeatRequest>,
) -> Result<impl IntoResponse> {
    if request.worker_id.trim().is_empty() {
        return Err(AppError::BadRequest("worker_id cannot be empty".to_string()));
    }
    if request.queue.trim().is_empty() {
        return Err(AppError::BadRequest("queue cannot be empty".to_string()));
    }

    info!("POST /queue/heartbeat - worker '{}'", request.worker_id);
    state.workers.record(&request);

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(serde_json::json!({
            "worker_id": request.worker_id,
            "registered_workers": state.workers.len()
        }))),
    ))
}

pub async fn handle_deregister_worker(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> Result<impl IntoResponse> {
    info!("DELETE /queue/workers/{}", worker_id);

    if state.workers.deregister(&worker_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Worker '{}' not found", worker_id)))
    }
}
