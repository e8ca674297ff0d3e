//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT (Ctrl+C) or SIGTERM
//! - Translate the first one into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Config reload is file-watch driven, so SIGHUP is not handled

use crate::lifecycle::shutdown::Shutdown;

/// Wait for a termination signal.
pub async fn termination() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = sigterm.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Trigger `shutdown` on the first termination signal.
pub async fn forward_to(shutdown: Shutdown) {
    match termination().await {
        Ok(()) => tracing::info!(
            listeners = shutdown.receiver_count(),
            "Shutdown signal received"
        ),
        Err(e) => tracing::error!(error = %e, "Failed to install signal handler, shutting down"),
    }
    shutdown.trigger();
}
