pub mod health;
pub mod live;
pub mod vod;

use crate::config;
use crate::error::{ReliveError, Result};
use crate::server::url_validation::validate_stream_url;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::time::{SystemTime, UNIX_EPOCH};

/// Playlist response: HLS content type plus the permissive CORS set web
/// players need for range requests.
pub(crate) fn playlist_response(body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/vnd.apple.mpegurl"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Range"),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                "Content-Length, Content-Range",
            ),
        ],
        body,
    )
        .into_response()
}

/// Resolve the `stream` query parameter to an upstream URL: an absolute
/// URL (validated against SSRF) or a registry name, defaulting to the
/// registry's `default` entry.
pub(crate) fn resolve_stream(param: Option<&str>) -> Result<String> {
    match param {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            validate_stream_url(url)?;
            Ok(url.to_string())
        }
        Some(name) => config::registry_url(name)
            .map(str::to_string)
            .ok_or_else(|| ReliveError::Internal(format!("unknown stream '{name}'"))),
        None => config::registry_url(config::DEFAULT_STREAM)
            .map(str::to_string)
            .ok_or_else(|| {
                ReliveError::Internal("stream registry has no default entry".to_string())
            }),
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
