use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cpu_tracker::{
    config::Config,
    metrics::Metrics,
    process::SysinfoResolver,
    server::{self, AppState},
    Sampler, TrackerRegistry,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    let addr = config
        .listen_addr()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    // Shared state for the sampler and the request handlers
    let registry = Arc::new(TrackerRegistry::new());
    let metrics = Metrics::new().context("failed to register metrics")?;
    let cancel = CancellationToken::new();

    let sampler = Sampler::new(Arc::clone(&registry), metrics.clone(), config.sample_interval());
    let sampler_task = sampler.spawn(cancel.clone());

    let state = AppState::new(registry, Arc::new(SysinfoResolver::new()), metrics);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server running on {}", addr);

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            return;
        }
        info!("shutting down");
        shutdown.cancel();
    });

    server::serve(listener, state, cancel.clone()).await?;
    cancel.cancel();
    sampler_task.await.context("sampler task panicked")?;
    Ok(())
}
