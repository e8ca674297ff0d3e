//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Capture the inbound request into a framework-independent `ProxyRequest`
//! - Enforce the body size limit while buffering
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The raw query string is kept verbatim so order and duplicates survive
//! - Original request preserved for logging; modified copy forwarded

use std::error::Error as StdError;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response};
use http_body_util::LengthLimitError;
use tower::{Layer, Service};
use uuid::Uuid;

use crate::error::ProxyError;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation ID attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access the request ID stored by `RequestIdLayer`.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&RequestId>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&RequestId> {
        self.extensions().get::<RequestId>()
    }
}

/// Tower layer that assigns `x-request-id`.
///
/// An incoming ID is kept; otherwise a fresh UUID is generated. The ID is
/// stored in the request extensions and echoed on the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B, ResB> Service<Request<B>> for RequestIdService<S>
where
    S: Service<Request<B>, Response = Response<ResB>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    B: 'static,
    ResB: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let id = req
            .headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| RequestId(v.to_string()))
            .unwrap_or_default();

        let value = HeaderValue::from_str(id.as_str()).ok();
        if let Some(value) = &value {
            req.headers_mut().insert(X_REQUEST_ID, value.clone());
        }
        req.extensions_mut().insert(id);

        let future = self.inner.call(req);
        Box::pin(async move {
            let mut response = future.await?;
            if let Some(value) = value {
                response.headers_mut().insert(X_REQUEST_ID, value);
            }
            Ok(response)
        })
    }
}

/// An inbound request, fully captured before dispatch.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Authority from the request target (HTTP/2 `:authority`), when present.
    pub authority: Option<String>,
    /// Peer address of the caller, when known.
    pub client_addr: Option<SocketAddr>,
}

impl ProxyRequest {
    /// Buffer an axum request, rejecting bodies over `max_body_bytes`.
    pub async fn capture(request: Request<Body>, max_body_bytes: usize) -> Result<Self, ProxyError> {
        let client_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);

        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();
        if !path.starts_with('/') {
            return Err(ProxyError::MalformedRequest(format!(
                "request target {} is not an absolute path",
                parts.uri
            )));
        }

        let body = axum::body::to_bytes(body, max_body_bytes)
            .await
            .map_err(|e| {
                if exceeds_limit(&e) {
                    ProxyError::PayloadTooLarge {
                        limit: max_body_bytes,
                    }
                } else {
                    ProxyError::MalformedRequest(format!("unreadable body: {e}"))
                }
            })?;

        Ok(Self {
            method: parts.method,
            path,
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
            authority: parts.uri.authority().map(|a| a.to_string()),
            client_addr,
        })
    }

    /// The host the caller addressed: `Host`, else the URI authority.
    pub fn original_host(&self) -> Option<HeaderValue> {
        if let Some(host) = self.headers.get(axum::http::header::HOST) {
            return Some(host.clone());
        }
        self.authority
            .as_deref()
            .and_then(|authority| HeaderValue::from_str(authority).ok())
    }

    /// Decoded query parameters in their original order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }
}

fn exceeds_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::ServiceExt;

    #[tokio::test]
    async fn captures_method_path_query_and_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/user/horse?FireHouse=test_search_param&a=1&a=2")
            .header("x-custom", "yes")
            .body(Body::from("payload"))
            .unwrap();

        let captured = ProxyRequest::capture(request, 1024).await.unwrap();

        assert_eq!(captured.method, Method::POST);
        assert_eq!(captured.path, "/user/horse");
        assert_eq!(
            captured.query.as_deref(),
            Some("FireHouse=test_search_param&a=1&a=2")
        );
        assert_eq!(
            captured.query_pairs(),
            vec![
                ("FireHouse".to_string(), "test_search_param".to_string()),
                ("a".to_string(), "1".to_string()),
                ("a".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(captured.headers["x-custom"], "yes");
        assert_eq!(&captured.body[..], b"payload");
        assert_eq!(captured.authority, None);
        assert_eq!(captured.client_addr, None);
    }

    #[tokio::test]
    async fn original_host_falls_back_to_uri_authority() {
        let request = Request::builder()
            .uri("http://gateway.local:8080/user/horse")
            .body(Body::empty())
            .unwrap();

        let captured = ProxyRequest::capture(request, 16).await.unwrap();
        assert_eq!(captured.path, "/user/horse");
        assert_eq!(captured.authority.as_deref(), Some("gateway.local:8080"));
        assert_eq!(captured.original_host().unwrap(), "gateway.local:8080");

        let request = Request::builder()
            .uri("http://gateway.local:8080/user")
            .header("host", "public.example")
            .body(Body::empty())
            .unwrap();

        let captured = ProxyRequest::capture(request, 16).await.unwrap();
        assert_eq!(captured.original_host().unwrap(), "public.example");
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let request = Request::builder()
            .uri("/user")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();

        let err = ProxyRequest::capture(request, 16).await.unwrap_err();
        assert!(matches!(err, ProxyError::PayloadTooLarge { limit: 16 }), "{err:?}");
    }

    #[tokio::test]
    async fn authority_form_target_is_malformed() {
        let request = Request::builder()
            .method(Method::CONNECT)
            .uri("backend.local:443")
            .body(Body::empty())
            .unwrap();

        let err = ProxyRequest::capture(request, 16).await.unwrap_err();
        assert!(matches!(err, ProxyError::MalformedRequest(_)), "{err:?}");
    }

    #[tokio::test]
    async fn request_id_is_generated_and_echoed() {
        let service = RequestIdLayer.layer(tower::service_fn(|req: Request<Body>| async move {
            let id = req.request_id().cloned().unwrap();
            assert_eq!(req.headers()[X_REQUEST_ID], id.as_str());
            Ok::<_, Infallible>(Response::new(Body::empty()))
        }));

        let response = service
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers()[X_REQUEST_ID].to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn request_id_is_preserved() {
        let service = RequestIdLayer.layer(tower::service_fn(|req: Request<Body>| async move {
            assert_eq!(req.request_id().unwrap().as_str(), "abc-123");
            Ok::<_, Infallible>(Response::new(Body::empty()))
        }));

        let request = Request::builder()
            .uri("/")
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(request).await.unwrap();

        assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
    }
}
