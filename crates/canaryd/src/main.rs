//! canaryd - canary judge daemon
//!
//! Serves the judge API and the Concourse build metadata proxy.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use canary_core::telemetry::init_tracing;
use canaryd::config::DEFAULT_BIND;
use canaryd::{router, DaemonConfig};
use clap::Parser;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "canaryd")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Canary judge service", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "CANARYD_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (overrides the configuration file)
    #[arg(long, env = "CANARYD_BIND")]
    bind: Option<SocketAddr>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let config = match &cli.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::default(),
    };
    let state = config.build_state()?;

    let addr = match cli.bind.or(config.bind) {
        Some(addr) => addr,
        None => DEFAULT_BIND.parse().context("invalid default bind address")?,
    };

    info!(
        service = "canaryd",
        version = canary_core::VERSION,
        address = %addr,
        "Server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
