//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Look up the matching route for a captured request
//! - Build the outbound request (URI rewrite, header filtering)
//! - Forward it and relay the backend response
//!
//! # Design Decisions
//! - The route table is passed in per call; the caller owns reload
//! - Explicit NotFound rather than silent default
//! - One outbound call per inbound request, never retried

use std::sync::Arc;

use axum::http::{header, Uri};
use url::Position;

use crate::config::ForwardingConfig;
use crate::error::ProxyError;
use crate::http::client::{Forwarder, OutboundRequest};
use crate::http::request::ProxyRequest;
use crate::http::response::ProxyResponse;
use crate::routing::table::{RouteMatch, RouteTable};
use crate::security::headers::{add_forwarded, strip_hop_by_hop, ForwardedFor};

/// Dispatches captured requests to backends.
#[derive(Clone)]
pub struct Router {
    forwarder: Arc<dyn Forwarder>,
    forwarding: ForwardingConfig,
}

impl Router {
    pub fn new(forwarder: Arc<dyn Forwarder>, forwarding: ForwardingConfig) -> Self {
        Self {
            forwarder,
            forwarding,
        }
    }

    /// Route one request through `table`.
    pub async fn route(
        &self,
        table: &RouteTable,
        request: ProxyRequest,
    ) -> Result<ProxyResponse, ProxyError> {
        if !request.path.starts_with('/') {
            return Err(ProxyError::MalformedRequest(format!(
                "path {:?} does not start with '/'",
                request.path
            )));
        }

        let Some(hit) = table.find(&request.path) else {
            return Err(ProxyError::NotFound {
                path: request.path.clone(),
            });
        };
        let route_name = hit.route.name.clone();

        let outbound = self.prepare(hit, &request)?;

        tracing::debug!(
            route = %route_name,
            method = %outbound.method,
            upstream = %outbound.uri,
            query = ?request.query_pairs(),
            "Forwarding request"
        );

        let mut response = self
            .forwarder
            .forward(outbound)
            .await
            .map_err(|source| ProxyError::BackendUnavailable {
                route: route_name,
                source,
            })?;

        strip_hop_by_hop(&mut response.headers);
        Ok(response)
    }

    /// Build the backend request for a matched route.
    fn prepare(&self, hit: RouteMatch<'_>, request: &ProxyRequest) -> Result<OutboundRequest, ProxyError> {
        let uri = upstream_uri(hit, request.query.as_deref())?;

        let mut headers = request.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        for name in &hit.route.sensitive_headers {
            headers.remove(name);
        }

        if self.forwarding.add_forwarded_headers {
            let original_host = request.original_host();
            add_forwarded(
                &mut headers,
                ForwardedFor {
                    host: original_host.as_ref(),
                    prefix: hit.route.strip_prefix.then(|| hit.route.prefix()),
                    client: request.client_addr,
                },
            );
        }

        Ok(OutboundRequest {
            method: request.method.clone(),
            uri,
            headers,
            body: request.body.clone(),
        })
    }
}

/// `backend base + forwarded path + raw query`.
///
/// A path on the base URL is kept as a mount point.
fn upstream_uri(hit: RouteMatch<'_>, query: Option<&str>) -> Result<Uri, ProxyError> {
    let base = &hit.route.backend;
    let origin = &base[..Position::BeforePath];
    let mount = base.path().trim_end_matches('/');

    let mut target = String::with_capacity(
        origin.len() + mount.len() + hit.forwarded_path.len() + query.map_or(0, |q| q.len() + 1),
    );
    target.push_str(origin);
    target.push_str(mount);
    target.push_str(hit.forwarded_path);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }

    target
        .parse()
        .map_err(|e| ProxyError::MalformedRequest(format!("cannot build upstream uri {target:?}: {e}")))
}
