//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Start the config file watcher and signal handling
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, ConfigWatcher};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the gateway from a config file and run until a termination signal.
pub async fn run(config_path: &Path) -> Result<(), StartupError> {
    let config = load_config(config_path)?;
    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "prefix-gateway starting");
    tracing::info!(
        path = %config_path.display(),
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        upstream_timeout_ms = config.timeouts.upstream_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let (watcher, config_updates) = ConfigWatcher::new(config_path);
    let _watcher = watcher.run()?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::forward_to(shutdown.clone()));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
