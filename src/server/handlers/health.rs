use crate::metrics;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Liveness probe. 200 with an empty body.
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Prometheus text exposition.
pub async fn serve_metrics() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
        .into_response()
}
