use catalog_common::store::StoreClientConfig;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    /// Needed to invalidate the storefront's snapshot cache after writes.
    pub redis_url: Option<String>,
    pub store: StoreClientConfig,
}

impl Config {
    /// Required: `STORE_URL`, `STORE_API_KEY` (a key allowed to write).
    ///
    /// Optional: `REDIS_URL`.
    pub fn from_env() -> Result<Self, AppError> {
        let store = StoreClientConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;
        let redis_url = std::env::var("REDIS_URL").ok();
        if redis_url.is_none() {
            tracing::warn!("REDIS_URL not set, storefront caches will only expire by TTL");
        }
        Ok(Self { redis_url, store })
    }
}
