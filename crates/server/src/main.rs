//! hoard proxy entry point.
//!
//! Boots the caching forward proxy on the configured address.
//! Logs are written as JSON to stderr.

use anyhow::Result;
use hoard_client::{FetchConfig, OriginClient};
use hoard_core::{AppConfig, CacheStore, Fetcher, FetcherExt};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod dispatch;
mod error;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let addr = config.socket_addr()?;

    tracing::info!(
        cache_root = %config.cache_root.display(),
        single_flight = config.single_flight,
        "Starting hoard proxy"
    );

    let store = CacheStore::new(config.cache_root.clone());
    let client = OriginClient::new(&FetchConfig { user_agent: config.user_agent.clone(), ..Default::default() })?;

    let cached = client.with_cache(store);
    let fetcher: Arc<dyn Fetcher> = if config.single_flight { Arc::new(cached.single_flight()) } else { Arc::new(cached) };

    let state = Arc::new(dispatch::ProxyState::new(fetcher));
    dispatch::start_server(state, addr).await?;

    Ok(())
}
