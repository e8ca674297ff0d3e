//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the static pages and the proxy fallback
//! - Wire up middleware (tracing, timeout, in-flight limit, request ID)
//! - Bind server to listener
//! - Dispatch requests to the routing engine
//! - Apply route table reloads as atomic swaps
//! - Observability (metrics, correlation IDs)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::{validate_config, ConfigError, PagesConfig, ProxyConfig, ValidationError};
use crate::error::ProxyError;
use crate::http::client::{Forwarder, HyperForwarder};
use crate::http::pages;
use crate::http::request::{ProxyRequest, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::{RouteTable, Router as ProxyRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Current route table; replaced wholesale on reload.
    pub table: Arc<ArcSwap<RouteTable>>,
    pub router: ProxyRouter,
    pub pages: Arc<PagesConfig>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &ProxyConfig, forwarder: Arc<dyn Forwarder>) -> Result<Self, ValidationError> {
        let table = RouteTable::from_config(&config.routes)?;
        Ok(Self {
            table: Arc::new(ArcSwap::from_pointee(table)),
            router: ProxyRouter::new(forwarder, config.proxy.clone()),
            pages: Arc::new(config.pages.clone()),
            max_body_bytes: config.limits.max_body_bytes,
        })
    }

    /// Compile `config.routes` and swap it in. The old table stays on error.
    pub fn reload(&self, config: &ProxyConfig) -> Result<(), ValidationError> {
        let table = RouteTable::from_config(&config.routes)?;
        let count = table.len();
        self.table.store(Arc::new(table));
        tracing::info!(routes = count, "Route table reloaded");
        Ok(())
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server that forwards over the network.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let forwarder = HyperForwarder::new(&config.timeouts, &config.limits);
        Self::with_forwarder(config, Arc::new(forwarder))
    }

    /// Create a server with a custom upstream forwarder.
    pub fn with_forwarder(
        config: ProxyConfig,
        forwarder: Arc<dyn Forwarder>,
    ) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let state = AppState::new(&config, forwarder).map_err(|e| ConfigError::Validation(vec![e]))?;
        let router = Self::build_router(&config, state.clone());

        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let in_flight = Arc::new(Semaphore::new(config.listener.max_in_flight));

        Router::new()
            .route("/", any(pages::index))
            .route("/error", any(pages::error))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(in_flight, limit_in_flight))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(RequestIdLayer)
    }

    /// The fully layered application, for in-process testing.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` replace the route table.
    /// Other sections only take effect on restart.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.state.table.load().len(),
            "HTTP server starting"
        );

        tokio::spawn(apply_reloads(
            self.state.clone(),
            config_updates,
            shutdown_rx.resubscribe(),
        ));

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_app = setup_admin_router(self.state.clone());
            let admin_shutdown = shutdown_rx.resubscribe();
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(admin_listener, admin_app)
                    .with_graceful_shutdown(shutdown::wait(admin_shutdown))
                    .await
                {
                    tracing::error!(error = %e, "Admin API stopped");
                }
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Swap in route tables from validated configs until shutdown.
async fn apply_reloads(
    state: AppState,
    mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = config_updates.recv() => match update {
                Some(config) => {
                    if let Err(e) = state.reload(&config) {
                        tracing::error!(error = %e, "Rejected route table, keeping current one");
                    }
                }
                None => break,
            },
            _ = shutdown_rx.recv() => break,
        }
    }
}

/// Hold a permit for the duration of each request.
async fn limit_in_flight(
    State(in_flight): State<Arc<Semaphore>>,
    request: Request,
    next: Next,
) -> Response {
    match in_flight.acquire_owned().await {
        Ok(_permit) => next.run(request).await,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// Main proxy handler.
/// Captures the request, routes it through the current table and relays the result.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let request_id = request
        .request_id()
        .map(ToString::to_string)
        .unwrap_or_default();

    let table = state.table.load_full();
    let mut route_label = "none".to_string();

    let result = match ProxyRequest::capture(request, state.max_body_bytes).await {
        Ok(captured) => {
            if let Some(hit) = table.find(&captured.path) {
                route_label = hit.route.name.clone();
            }
            state.router.route(&table, captured).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => {
            metrics::record_request(&method, response.status.as_u16(), &route_label, start_time);
            response.into_response()
        }
        Err(e) => {
            match &e {
                ProxyError::NotFound { path } => {
                    tracing::warn!(request_id = %request_id, path = %path, "No route matched");
                }
                ProxyError::BackendUnavailable { route, source } => {
                    metrics::record_upstream_error(route, source.kind());
                    tracing::error!(request_id = %request_id, route = %route, error = %source, "Upstream error");
                }
                other => {
                    tracing::warn!(request_id = %request_id, error = %other, kind = other.kind(), "Rejected request");
                }
            }
            metrics::record_request(&method, e.status().as_u16(), &route_label, start_time);
            e.into_response()
        }
    }
}
