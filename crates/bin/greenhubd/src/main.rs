//! # greenhubd, the greenhub daemon
//!
//! Composition root that builds the greenhouse registry and serves it.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialise `tracing` with the configured filter
//! - Create the shared registry and register the seed greenhouses
//! - Bind the TCP server and serve until Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that wires the other crates together.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use greenhub_adapter_tcp::server::Server;
use greenhub_app::dispatcher::CommandHandler;
use greenhub_app::registry::GreenhouseRegistry;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Registry
    let registry = Arc::new(GreenhouseRegistry::new());
    for name in &config.greenhouses.seed {
        registry
            .add_greenhouse(name)
            .with_context(|| format!("failed to register greenhouse {name:?}"))?;
    }

    // TCP
    let handler = Arc::new(CommandHandler::new(registry));
    let server = Server::bind(&config.server, handler)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr()))?;

    server.run_until(shutdown_signal()).await?;
    tracing::info!("greenhubd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
