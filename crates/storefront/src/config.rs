use catalog_common::cache::DEFAULT_SNAPSHOT_TTL_SECS;
use catalog_common::query::DEFAULT_PAGE_SIZE;
use catalog_common::store::StoreClientConfig;
use catalog_common::whatsapp::normalize_phone;

use crate::error::AppError;

const DEFAULT_BLOG_PAGE_SIZE: usize = 9;

/// Storefront configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL. `None` disables the snapshot cache.
    pub redis_url: Option<String>,
    pub store: StoreClientConfig,
    /// Business WhatsApp number in digits-only international form.
    pub whatsapp_number: String,
    pub listing_page_size: usize,
    pub blog_page_size: usize,
    pub snapshot_ttl_secs: u64,
    /// Bind address for the JSON HTTP API. `None` serves MCP only.
    pub http_addr: Option<String>,
}

impl Config {
    /// Required:
    /// - `STORE_URL`, `STORE_API_KEY`: hosted store endpoint and key
    /// - `WHATSAPP_NUMBER`: number inquiries and bookings are sent to
    ///
    /// Optional:
    /// - `REDIS_URL`
    /// - `LISTING_PAGE_SIZE` (default: 12), `BLOG_PAGE_SIZE` (default: 9)
    /// - `SNAPSHOT_TTL_SECS` (default: 300)
    /// - `STOREFRONT_HTTP_ADDR`
    pub fn from_env() -> Result<Self, AppError> {
        let store = StoreClientConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;

        let whatsapp_raw = std::env::var("WHATSAPP_NUMBER").map_err(|_| {
            AppError::Config("WHATSAPP_NUMBER environment variable is required".to_string())
        })?;
        let whatsapp_number = normalize_phone(&whatsapp_raw)
            .map_err(|e| AppError::Config(format!("WHATSAPP_NUMBER: {e}")))?;

        Ok(Self {
            redis_url: std::env::var("REDIS_URL").ok(),
            store,
            whatsapp_number,
            listing_page_size: positive_env("LISTING_PAGE_SIZE").unwrap_or(DEFAULT_PAGE_SIZE),
            blog_page_size: positive_env("BLOG_PAGE_SIZE").unwrap_or(DEFAULT_BLOG_PAGE_SIZE),
            snapshot_ttl_secs: std::env::var("SNAPSHOT_TTL_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_SNAPSHOT_TTL_SECS),
            http_addr: std::env::var("STOREFRONT_HTTP_ADDR").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn positive_env(name: &str) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}
