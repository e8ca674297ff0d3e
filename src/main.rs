//! Path-prefix API gateway.
//!
//! Routes each request to the backend whose configured path prefix matches,
//! rewriting the path and relaying the backend's answer unchanged.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                      GATEWAY                         │
//!                              │                                                      │
//!     Client Request           │  ┌─────────┐    ┌──────────────┐    ┌────────────┐   │
//!     ─────────────────────────┼─▶│  http   │───▶│   routing    │───▶│   http     │───┼──▶ Backend
//!                              │  │ server  │    │ table+router │    │  client    │   │
//!                              │  └─────────┘    └──────────────┘    └─────┬──────┘   │
//!     Client Response          │                                          │          │
//!     ◀────────────────────────┼──────────────── response.rs ◀────────────┘          │
//!                              │                                                      │
//!                              │  ┌────────────────────────────────────────────────┐  │
//!                              │  │             Cross-Cutting Concerns             │  │
//!                              │  │  config+watcher · observability · security     │  │
//!                              │  │  resilience (deadlines) · lifecycle · admin    │  │
//!                              │  └────────────────────────────────────────────────┘  │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "prefix-gateway")]
#[command(about = "Path-prefix routing API gateway", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    prefix_gateway::lifecycle::startup::run(&cli.config).await?;
    Ok(())
}
