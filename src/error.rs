use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ReliveError>;

/// All failure modes surfaced by the gateway.
///
/// Every variant renders as an HTTP response with the error message as the
/// body. Transformation and fetch failures are `500`; rejection of a
/// user-supplied stream URL is `400`.
#[derive(Debug, thiserror::Error)]
pub enum ReliveError {
    /// The playlist body is structurally invalid.
    #[error("playlist parse error: {0}")]
    Parse(String),

    /// The upstream fetch failed. `code` is the HTTP status, `"timeout"`,
    /// or `"error"` for transport-level failures.
    #[error("upstream fetch failed ({code}): {message}")]
    Upstream { code: String, message: String },

    /// The requested variant index does not exist in the master playlist.
    #[error("variant index {index} out of range: master exposes {available} renditions")]
    VariantIndex { index: usize, available: usize },

    /// The `ad` query parameter could not be parsed.
    #[error("invalid ad config: {0}")]
    AdConfig(String),

    /// A user-supplied stream URL was rejected (scheme or private address).
    #[error("stream URL rejected: {0}")]
    InvalidStream(String),

    /// Anything that should not happen in a well-configured deployment.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ReliveError {
    pub fn upstream(code: impl Into<String>, message: impl Into<String>) -> Self {
        ReliveError::Upstream {
            code: code.into(),
            message: message.into(),
        }
    }

    /// HTTP status this error renders as.
    pub fn status(&self) -> StatusCode {
        match self {
            ReliveError::InvalidStream(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ReliveError {
    fn from(e: reqwest::Error) -> Self {
        let code = if e.is_timeout() {
            "timeout".to_string()
        } else if let Some(status) = e.status() {
            status.as_u16().to_string()
        } else {
            "error".to_string()
        };
        ReliveError::Upstream {
            code,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ReliveError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
