//! Vehicle Fault Service - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().context("failed to load configuration")?;
    init_logging(&config.log).map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    info!("=== Vehicle Fault Service v{} ===", env!("CARGO_PKG_VERSION"));
    run_server(config).await
}
