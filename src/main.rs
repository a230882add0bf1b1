mod config;
mod errors;
mod feeds;
mod models;
mod scenario;
mod server;
mod state;

use crate::feeds::market_data::{MarketDataSource, PolygonSource, ProviderChain};
use crate::state::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("options_guru starting");

    // Load config
    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    // Market data providers, tried in order
    let mut sources: Vec<Arc<dyn MarketDataSource>> = Vec::new();
    match cfg.polygon_api_key.as_deref() {
        Some(key) => sources.push(Arc::new(PolygonSource::new(
            &cfg.polygon_base_url,
            key,
            cfg.market_data_timeout_secs,
        ))),
        None => tracing::warn!("POLYGON_API_KEY not set, quotes will be unavailable"),
    }
    let market_data = ProviderChain::new(sources);
    tracing::info!(providers = ?market_data.names(), "market data configured");

    let port = cfg.server_port;
    let app_state = AppState::new(cfg, market_data);
    let app = server::router(app_state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
