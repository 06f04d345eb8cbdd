//! Previewer - image fill proxy
//!
//! Fetches remote images, crops and scales them to the requested size, and
//! keeps the results in a disk-backed LRU cache.

mod config;
mod error;
mod fetcher;
mod resizer;
mod server;
mod service;
#[cfg(test)]
mod test_support;
mod types;

use crate::config::load_config;
use crate::error::Result;
use crate::fetcher::ImageFetcher;
use crate::server::{start_server, ServerState, SharedState};
use crate::service::Previewer;
use fill_cache::DiskLruCache;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("previewer=info".parse()?)
        .add_directive("fill_cache=info".parse()?)
        .add_directive("tower_http=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting previewer...");

    let config = load_config()?;
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Cache capacity: {} images", config.cache_capacity);
    info!("Upstream timeout: {} seconds", config.upstream_timeout_secs);
    info!("Request timeout: {} seconds", config.request_timeout_secs);

    let cache = DiskLruCache::open(config.cache_config()).await?;
    let fetcher = ImageFetcher::new(
        Duration::from_secs(config.upstream_timeout_secs),
        config.max_image_bytes,
    )?;

    let state: SharedState = Arc::new(
        ServerState::new(Previewer::new(cache, fetcher))
            .with_request_timeout(Duration::from_secs(config.request_timeout_secs)),
    );

    // Start HTTP server (blocking until shutdown)
    start_server(state, config.port).await?;

    info!("Previewer stopped");
    Ok(())
}
