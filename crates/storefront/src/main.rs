mod catalog;
mod config;
mod error;
mod http;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog::CatalogLoader;
use catalog_common::cache::SnapshotCache;
use catalog_common::redis::RedisCache;
use catalog_common::responder::CannedResponder;
use catalog_common::store::StoreClient;
use config::Config;
use server::StorefrontServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting storefront server");

    let config = Config::from_env()?;
    info!(
        store_url = %config.store.base_url,
        redis = config.redis_url.is_some(),
        listing_page_size = config.listing_page_size,
        blog_page_size = config.blog_page_size,
        http = config.http_addr.is_some(),
        "configuration loaded"
    );

    let redis = RedisCache::new(config.redis_url.as_deref());
    if redis.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without snapshot cache");
    }
    let cache = SnapshotCache::new(redis, config.snapshot_ttl_secs);

    let store = Arc::new(StoreClient::new(config.store.clone())?);
    let loader = Arc::new(CatalogLoader::new(Arc::clone(&store), cache));

    let snapshot = loader.load().await?;
    info!(
        listings = snapshot.units.len(),
        posts = snapshot.posts.len(),
        testimonials = snapshot.testimonials.len(),
        "catalog ready"
    );

    let server = StorefrontServer::new(
        snapshot,
        loader,
        store,
        CannedResponder::default(),
        config.clone(),
    );

    if let Some(addr) = config.http_addr.as_deref() {
        let listener = TcpListener::bind(addr).await?;
        let app = http::router(server.clone());
        info!(http_addr = %addr, "HTTP API listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "HTTP API stopped");
            }
        });
    }

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                tracing::info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                tracing::info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
