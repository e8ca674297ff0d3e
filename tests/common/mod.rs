//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use prefix_gateway::config::ProxyConfig;
use prefix_gateway::http::HttpServer;
use prefix_gateway::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// One request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct BackendState {
    calls: Arc<Mutex<Vec<Recorded>>>,
    status: StatusCode,
    body: &'static str,
    delay: Duration,
}

/// A backend that records every request and answers with a fixed response.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub async fn start(status: StatusCode, body: &'static str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    /// Start a backend that waits `delay` before answering.
    pub async fn start_with_delay(status: StatusCode, body: &'static str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let state = BackendState {
            calls: calls.clone(),
            status,
            body,
            delay,
        };
        let app = Router::new().fallback(record).with_state(state);

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, calls }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last(&self) -> Recorded {
        self.calls().pop().expect("backend was never called")
    }
}

async fn record(
    State(state): State<BackendState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(&'static str, &'static str); 1], &'static str) {
    state.calls.lock().unwrap().push(Recorded {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    (state.status, [("x-backend", "mock")], state.body)
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A gateway running on an ephemeral port.
pub struct Gateway {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<ProxyConfig>,
    shutdown: Shutdown,
}

impl Gateway {
    pub async fn start(mut config: ProxyConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        config.listener.bind_address = addr.to_string();

        let server = HttpServer::new(config).unwrap();
        let shutdown = Shutdown::new();
        let (updates, config_updates) = mpsc::unbounded_channel();
        let server_shutdown = shutdown.subscribe();

        tokio::spawn(async move {
            let _ = server.run(listener, config_updates, server_shutdown).await;
        });

        Self {
            addr,
            updates,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
