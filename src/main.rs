mod cache;
mod config;
mod db;
mod errors;
mod handlers;
mod ml;
mod models;
mod pipeline;
mod render;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::SeriesCache;
use crate::config::AppConfig;
use crate::db::WarehouseSource;
use crate::handlers::AppState;
use crate::ml::ForecastEngine;
use crate::pipeline::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "revcast=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = AppConfig::load()?;
    let bounds = config.dashboard.bounds();
    tracing::info!(
        unit = %bounds.unit,
        min = bounds.min,
        max = bounds.max,
        default = bounds.default,
        cache_ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    // The warehouse is contacted lazily, on the first page load
    let source = Arc::new(WarehouseSource::new(config.warehouse.clone()));
    let pipeline = Pipeline::new(
        source,
        SeriesCache::new(config.cache.ttl_secs),
        ForecastEngine::new(&config.model),
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        dashboard: config.dashboard.clone(),
        admin_key_hash: config.cache.admin_key.as_deref().map(handlers::cache::hash_key),
    };
    let app = handlers::router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting revcast dashboard on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
