//! Request logging for the health surface

use std::time::Duration;

use axum::body::Body;
use axum::Router;
use http::{Request, Response, StatusCode};
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;
use tracing::{info_span, Span};

/// Wraps `router` in a `TraceLayer` that treats 503 as a reported health
/// state rather than a server failure: unhealthy reports are logged at
/// `warn`, everything else in the 5xx range at `error`.
pub fn with_request_logging<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            })
            .on_request(|request: &Request<Body>, _span: &Span| {
                tracing::debug!("started {} {}", request.method(), request.uri().path());
            })
            .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                let status = response.status();
                let latency_ms = latency.as_millis();

                if status.is_success() {
                    tracing::info!(status = status.as_u16(), latency_ms, "request completed");
                } else if status == StatusCode::SERVICE_UNAVAILABLE {
                    tracing::warn!(status = status.as_u16(), latency_ms, "reported unavailable");
                } else if status.is_client_error() {
                    tracing::warn!(status = status.as_u16(), latency_ms, "client error response");
                } else {
                    tracing::error!(status = status.as_u16(), latency_ms, "server error response");
                }
            })
            .on_failure(
                |failure: ServerErrorsFailureClass, latency: Duration, _span: &Span| match failure {
                    ServerErrorsFailureClass::StatusCode(StatusCode::SERVICE_UNAVAILABLE) => {}
                    other => {
                        tracing::error!(
                            latency_ms = latency.as_millis(),
                            error = %other,
                            "request failed"
                        );
                    }
                },
            ),
    )
}
