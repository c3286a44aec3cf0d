//! Application and probe error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    InternalServerError,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache service error: {0}")]
    CacheService(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string())
            }
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::CacheService(msg) => {
                tracing::error!("Cache service error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Cache service error".to_string())
            }
            AppError::IoError(err) => {
                tracing::error!("IO error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::JsonError(err) => {
                tracing::error!("JSON error: {:?}", err);
                (StatusCode::BAD_REQUEST, "Invalid JSON data".to_string())
            }
            AppError::Other(err) => {
                tracing::error!("Unexpected error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

/// Failure modes of a single dependency probe.
///
/// Every variant maps the component to `Unhealthy`. Slow responses and
/// partial fan-out failures are not errors; probes report those as
/// `Degraded` results instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("{0}")]
    Connectivity(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("probe timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("circuit breaker open")]
    CircuitOpen,
}

impl ProbeError {
    pub fn connectivity(err: impl std::fmt::Display) -> Self {
        ProbeError::Connectivity(err.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Connectivity(_) => "connectivity",
            ProbeError::Configuration(_) => "configuration",
            ProbeError::Timeout(_) => "timeout",
            ProbeError::CircuitOpen => "circuit_open",
        }
    }
}

impl From<sqlx::Error> for ProbeError {
    fn from(err: sqlx::Error) -> Self {
        ProbeError::Connectivity(format!("database call failed: {}", err))
    }
}

impl From<redis::RedisError> for ProbeError {
    fn from(err: redis::RedisError) -> Self {
        ProbeError::Connectivity(format!("cache service unreachable: {}", err))
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        ProbeError::Connectivity(err.to_string())
    }
}
