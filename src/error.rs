use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const UPSTREAM_FAILED: &str = "Failed to fetch movies from external API.";

/// Failures at the proxy boundary. Every variant renders as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Server configuration error: MOVIE_API_KEY is missing.")]
    MissingCredential,
    #[error("{0}")]
    BadRequest(String),
    #[error("Request body exceeds {0} bytes.")]
    PayloadTooLarge(usize),
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
    #[error("Internal server error during data fetching.")]
    Internal(#[source] anyhow::Error),
}

impl ProxyError {
    pub fn upstream(status: u16, message: Option<String>) -> Self {
        let status = StatusCode::from_u16(status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        ProxyError::Upstream {
            status,
            message: message.unwrap_or_else(|| UPSTREAM_FAILED.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingCredential | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Upstream { status, .. } => *status,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
