//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay a buffered backend response to the client
//! - Map gateway errors to synthesized plain-text responses
//!
//! # Design Decisions
//! - Backend bodies are fully buffered, so the caller gets either the whole
//!   relayed response or one error response, never a mix
//! - Hop-by-hop headers are stripped before the response reaches this module
//! - Backend timeouts result in 504 Gateway Timeout

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;

/// A backend response, relayed verbatim.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ProxyError::NotFound { .. } => "No matching route found".to_string(),
            ProxyError::BackendUnavailable { .. } if status == StatusCode::GATEWAY_TIMEOUT => {
                "Upstream request timed out".to_string()
            }
            ProxyError::BackendUnavailable { .. } => "Upstream request failed".to_string(),
            other => other.to_string(),
        };

        (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            message,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::ForwardError;
    use std::time::Duration;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn relays_status_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/json"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let response = ProxyResponse {
            status: StatusCode::ACCEPTED,
            headers,
            body: Bytes::from_static(b"Tester"),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/json");
        assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);
        assert_eq!(body_text(response).await, "Tester");
    }

    #[tokio::test]
    async fn errors_become_plain_text() {
        let response = ProxyError::NotFound {
            path: "/unknown".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "No matching route found");

        let response = ProxyError::BackendUnavailable {
            route: "user".into(),
            source: ForwardError::Timeout(Duration::from_secs(1)),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_text(response).await, "Upstream request timed out");
    }
}
