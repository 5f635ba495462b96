mod config;
mod error;
mod server;
mod validate;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog_common::cache::{SnapshotCache, DEFAULT_SNAPSHOT_TTL_SECS};
use catalog_common::redis::RedisCache;
use catalog_common::store::StoreClient;
use config::Config;
use server::BackofficeServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting backoffice MCP server");

    let config = Config::from_env()?;
    info!(
        store_url = %config.store.base_url,
        redis = config.redis_url.is_some(),
        max_retries = config.store.max_retries,
        "configuration loaded"
    );

    let redis = RedisCache::new(config.redis_url.as_deref());
    if redis.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, cache invalidation disabled");
    }
    let cache = SnapshotCache::new(redis, DEFAULT_SNAPSHOT_TTL_SECS);

    let store = Arc::new(StoreClient::new(config.store)?);
    let server = BackofficeServer::new(store, cache);

    info!("MCP server ready, serving on stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP server error");
    })?;

    service.waiting().await?;
    info!("MCP server shut down");
    Ok(())
}
