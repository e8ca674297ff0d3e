//! Gateway error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::client::ForwardError;

/// Why a routed request could not be answered by a backend.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No configured prefix covers the request path.
    #[error("no route matches {path}")]
    NotFound { path: String },

    /// The inbound request cannot be routed as received.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The inbound body exceeds the configured limit.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The backend could not be reached or did not answer in time.
    #[error("backend for route {route} unavailable: {source}")]
    BackendUnavailable {
        route: String,
        #[source]
        source: ForwardError,
    },
}

impl ProxyError {
    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NotFound { .. } => StatusCode::NOT_FOUND,
            ProxyError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::BackendUnavailable { source, .. } if source.is_timeout() => {
                StatusCode::GATEWAY_TIMEOUT
            }
            ProxyError::BackendUnavailable { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::NotFound { .. } => "not_found",
            ProxyError::MalformedRequest(_) => "malformed",
            ProxyError::PayloadTooLarge { .. } => "payload_too_large",
            ProxyError::BackendUnavailable { source, .. } => source.kind(),
        }
    }
}
