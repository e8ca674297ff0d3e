//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Send the prepared outbound request to the backend
//! - Buffer the complete backend response (no partial relays)
//! - Classify failures as connect / timeout / transport
//!
//! # Design Decisions
//! - `Forwarder` is the seam between routing and the network; routing logic is
//!   tested against an in-memory implementation
//! - Connect timeout lives on the connector, the overall deadline wraps
//!   send + body read
//! - No retries

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Uri};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::{LimitsConfig, TimeoutConfig};
use crate::http::response::ProxyResponse;
use crate::resilience::timeouts::with_deadline;

/// Failure talking to a backend.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// TCP connect failed (refused, unreachable, connect timeout).
    #[error("connect failed: {0}")]
    Connect(String),

    /// The backend did not produce a full response in time.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The connection broke after it was established.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend response body exceeds the configured limit.
    #[error("response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },
}

impl ForwardError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ForwardError::Timeout(_))
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Connect(_) => "connect",
            ForwardError::Timeout(_) => "timeout",
            ForwardError::Transport(_) => "transport",
            ForwardError::ResponseTooLarge { .. } => "response_too_large",
        }
    }
}

/// A fully prepared request for a backend.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Absolute URI: backend base + forwarded path + raw query.
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Sends outbound requests and returns buffered responses.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, request: OutboundRequest) -> Result<ProxyResponse, ForwardError>;
}

/// `Forwarder` backed by a pooled hyper client.
#[derive(Clone)]
pub struct HyperForwarder {
    client: Client<HttpConnector, Body>,
    upstream_timeout: Duration,
    max_response_bytes: usize,
}

impl HyperForwarder {
    pub fn new(timeouts: &TimeoutConfig, limits: &LimitsConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            upstream_timeout: Duration::from_millis(timeouts.upstream_ms),
            max_response_bytes: limits.max_response_bytes,
        }
    }
}

#[async_trait]
impl Forwarder for HyperForwarder {
    async fn forward(&self, outbound: OutboundRequest) -> Result<ProxyResponse, ForwardError> {
        let mut request = Request::builder()
            .method(outbound.method)
            .uri(outbound.uri)
            .body(Body::from(outbound.body))
            .map_err(|e| ForwardError::Transport(e.to_string()))?;
        *request.headers_mut() = outbound.headers;

        let limit = self.max_response_bytes;
        with_deadline(self.upstream_timeout, async {
            let response = self.client.request(request).await.map_err(|e| {
                if e.is_connect() {
                    ForwardError::Connect(describe(&e))
                } else {
                    ForwardError::Transport(describe(&e))
                }
            })?;

            let (parts, body) = response.into_parts();
            let body = Limited::new(body, limit)
                .collect()
                .await
                .map_err(|e| {
                    if e.downcast_ref::<LengthLimitError>().is_some() {
                        ForwardError::ResponseTooLarge { limit }
                    } else {
                        ForwardError::Transport(describe(e.as_ref()))
                    }
                })?
                .to_bytes();

            Ok::<_, ForwardError>(ProxyResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        })
        .await
    }
}

/// Flatten an error and its sources into one line.
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
