//! Bellwether - live market-depth and fair-price service.
//!
//! Serves a single bellwether probability per prediction-market contract,
//! with a robustness verdict describing how expensive that price is to
//! manipulate. Fans out to the Dome market-data vendor for order books and
//! trades, and memoises answers through a short-TTL cache.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bellwether_backend::{
    api, cache::MetricsCache, config::Config, scrapers::DomeRestClient, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let dome = DomeRestClient::new(config.dome_api_key.clone());
    if dome.is_configured() {
        info!("📡 Dome API credential configured");
    } else {
        warn!("⚠️  DOME_API_KEY not set - upstream fetches will return empty results");
    }

    let cache = MetricsCache::open(config.cache_db_path.as_deref());
    if !cache.is_configured() {
        warn!("⚠️  CACHE_DB_PATH not set - every request fans out upstream");
    }

    let state = AppState {
        dome: Arc::new(dome),
        cache: Arc::new(cache),
    };
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 Bellwether metrics API listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
