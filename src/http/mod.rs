//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, static pages)
//!     → request.rs (request ID, capture path/query/headers/body)
//!     → [routing layer picks route and rewrites the path]
//!     → client.rs (forward to backend, buffer response)
//!     → response.rs (relay status/headers/body or map the error)
//!     → Send to client
//! ```

pub mod client;
pub mod pages;
pub mod request;
pub mod response;
pub mod server;

pub use client::{ForwardError, Forwarder, HyperForwarder, OutboundRequest};
pub use request::{ProxyRequest, RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use response::ProxyResponse;
pub use server::{AppState, HttpServer};
