//! Header manipulation on the forwarding path.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Drop `Host` and route-sensitive headers from forwarded requests
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host, X-Forwarded-Prefix
//!
//! # Design Decisions
//! - Preserve original client IP chain in X-Forwarded-For (append, never replace)
//! - End-to-end headers are forwarded untouched, including duplicates

use std::net::SocketAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_PREFIX: HeaderName = HeaderName::from_static("x-forwarded-prefix");

/// Headers that only apply to a single transport hop (RFC 9110 §7.6.1).
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

/// Context for the X-Forwarded-* headers of one request.
#[derive(Debug, Clone, Copy)]
pub struct ForwardedFor<'a> {
    /// Inbound `Host` header, if any.
    pub host: Option<&'a HeaderValue>,
    /// Prefix removed from the path, if it was stripped.
    pub prefix: Option<&'a str>,
    /// Peer address of the caller.
    pub client: Option<SocketAddr>,
}

/// Add the X-Forwarded-* family to an outbound header map.
pub fn add_forwarded(headers: &mut HeaderMap, ctx: ForwardedFor<'_>) {
    if let Some(host) = ctx.host {
        headers.insert(X_FORWARDED_HOST, host.clone());
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));

    if let Some(prefix) = ctx.prefix.filter(|p| *p != "/") {
        if let Ok(value) = HeaderValue::from_str(prefix) {
            headers.insert(X_FORWARDED_PREFIX, value);
        }
    }

    if let Some(client) = ctx.client {
        let ip = client.ip().to_string();
        let chain = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.is_empty() => format!("{existing}, {ip}"),
            _ => ip,
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
}
