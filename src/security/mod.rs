//! Request hygiene for forwarded traffic.
//!
//! # Design Decisions
//! - Hop-by-hop headers never cross the gateway in either direction
//! - Per-route sensitive headers are dropped before forwarding
//! - X-Forwarded-* headers describe the original request to the backend

pub mod headers;
