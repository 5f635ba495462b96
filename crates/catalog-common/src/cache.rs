/// Redis-backed snapshot cache shared by the storefront and the backoffice.
///
/// Key schema:
/// - `acm:v1:snapshot:{table}`: JSON rows of one table, newest first (TTL configurable)
///
/// The storefront reads and fills these keys; the backoffice drops the whole prefix
/// after every write so the next storefront load goes back to the store.
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::listing::Table;
use crate::redis::RedisCache;

pub const KEY_PREFIX: &str = "acm:v1:";
pub const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 300;

#[derive(Clone)]
pub struct SnapshotCache {
    redis: RedisCache,
    ttl_secs: u64,
}

impl SnapshotCache {
    pub fn new(redis: RedisCache, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }

    pub fn redis(&self) -> &RedisCache {
        &self.redis
    }

    pub async fn get_rows<T: DeserializeOwned>(&self, table: Table) -> Option<Vec<T>> {
        self.redis.get_json(&snapshot_key(table)).await
    }

    pub async fn set_rows<T: Serialize>(&self, table: Table, rows: &[T]) -> bool {
        self.redis.set_json(&snapshot_key(table), rows, self.ttl_secs).await
    }

    pub async fn invalidate_all(&self) -> bool {
        let ok = self.redis.delete_by_prefix(KEY_PREFIX).await;
        if ok {
            info!(prefix = KEY_PREFIX, "snapshot cache invalidated");
        }
        ok
    }
}

fn snapshot_key(table: Table) -> String {
    format!("{KEY_PREFIX}snapshot:{}", table.name())
}

/// Short content hash of a set of rows, so callers can tell whether a refresh
/// actually changed anything.
pub fn fingerprint<T: Serialize + ?Sized>(rows: &T) -> String {
    let mut hasher = Sha256::new();
    if let Ok(bytes) = serde_json::to_vec(rows) {
        hasher.update(&bytes);
    }
    let digest = hasher.finalize();
    format!("{:x}", digest)[..16].to_string()
}
