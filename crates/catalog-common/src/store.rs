/// REST client for the hosted store (PostgREST dialect).
///
/// Reads return rows newest first so the snapshot order doubles as the "newest"
/// sort. Transient failures are retried with capped exponential backoff. Reads,
/// updates, and deletes retry on timeouts, connect errors, 429, and 5xx; inserts only
/// retry when the request cannot have reached the store (connect errors, 429).
use std::time::Duration;

use rand::Rng;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::listing::Table;

#[derive(Clone, Debug)]
pub struct StoreClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub default_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl StoreClientConfig {
    /// Required: `STORE_URL`, `STORE_API_KEY`.
    ///
    /// Optional: `STORE_TIMEOUT_SECS` (30), `STORE_MAX_RETRIES` (3),
    /// `STORE_RETRY_INITIAL_MS` (200), `STORE_RETRY_MAX_MS` (5000),
    /// `STORE_MAX_ERROR_BODY_BYTES` (8192).
    pub fn from_env() -> Result<Self, StoreError> {
        let base_url =
            std::env::var("STORE_URL").map_err(|_| StoreError::MissingConfig("STORE_URL"))?;
        let api_key =
            std::env::var("STORE_API_KEY").map_err(|_| StoreError::MissingConfig("STORE_API_KEY"))?;

        Ok(Self::new(base_url, api_key)
            .with_timeout(env_parse("STORE_TIMEOUT_SECS").map(Duration::from_secs))
            .with_retries(
                env_parse("STORE_MAX_RETRIES"),
                env_parse("STORE_RETRY_INITIAL_MS").map(Duration::from_millis),
                env_parse("STORE_RETRY_MAX_MS").map(Duration::from_millis),
            )
            .with_max_error_body_bytes(env_parse("STORE_MAX_ERROR_BODY_BYTES")))
    }

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            default_timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(5_000),
            max_error_body_bytes: 8 * 1024,
        }
    }

    fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Some(timeout) = timeout {
            self.default_timeout = timeout;
        }
        self
    }

    fn with_retries(
        mut self,
        max_retries: Option<u32>,
        initial: Option<Duration>,
        max: Option<Duration>,
    ) -> Self {
        if let Some(n) = max_retries {
            self.max_retries = n;
        }
        if let Some(d) = initial {
            self.initial_backoff = d;
        }
        if let Some(d) = max {
            self.max_backoff = d;
        }
        self
    }

    fn with_max_error_body_bytes(mut self, bytes: Option<usize>) -> Self {
        if let Some(bytes) = bytes {
            self.max_error_body_bytes = bytes;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}

/// Whether a request may be replayed after it possibly ran on the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    Idempotent,
    /// A replayed insert could write the row twice.
    Once,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("missing configuration: {0} environment variable is required")]
    MissingConfig(&'static str),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("store returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("store returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("store returned no row for {table} id={id}")]
    MissingRow { table: &'static str, id: String },
}

#[derive(Clone)]
pub struct StoreClient {
    config: StoreClientConfig,
    http: reqwest::Client,
}

impl StoreClient {
    pub fn new(config: StoreClientConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent("ac-marketplace/catalog-common")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &StoreClientConfig {
        &self.config
    }

    /// All rows of `table` matching `filters` (PostgREST `column=op.value` pairs),
    /// newest first.
    pub async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: Table,
        filters: &[(&str, &str)],
    ) -> Result<Vec<T>, StoreError> {
        let url = table_url(&self.config.base_url, table);
        let query = read_query(filters);
        let rows: Vec<T> = self
            .request_with_retry(Replay::Idempotent, || async {
                let resp = self.request(Method::GET, &url).query(&query).send().await?;
                Self::parse_json_response(resp, self.config.max_error_body_bytes).await
            })
            .await?;
        debug!(table = table.name(), rows = rows.len(), "fetched rows");
        Ok(rows)
    }

    /// Rows the public site may show (active listings, published posts).
    pub async fn fetch_visible<T: DeserializeOwned>(&self, table: Table) -> Result<Vec<T>, StoreError> {
        match table.visibility_filter() {
            Some(filter) => self.fetch_rows(table, &[filter]).await,
            None => self.fetch_rows(table, &[]).await,
        }
    }

    /// Insert one row and return it as stored (with server-assigned `id`).
    pub async fn insert_row<B, T>(&self, table: Table, row: &B) -> Result<T, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = table_url(&self.config.base_url, table);
        let rows: Vec<T> = self
            .request_with_retry(Replay::Once, || async {
                let resp = self
                    .request(Method::POST, &url)
                    .header("Prefer", "return=representation")
                    .json(row)
                    .send()
                    .await?;
                Self::parse_json_response(resp, self.config.max_error_body_bytes).await
            })
            .await?;
        rows.into_iter().next().ok_or(StoreError::MissingRow {
            table: table.name(),
            id: "<new>".to_string(),
        })
    }

    pub async fn update_row<B, T>(&self, table: Table, id: &str, patch: &B) -> Result<T, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = table_url(&self.config.base_url, table);
        let id_filter = format!("eq.{id}");
        let rows: Vec<T> = self
            .request_with_retry(Replay::Idempotent, || async {
                let resp = self
                    .request(Method::PATCH, &url)
                    .query(&[("id", id_filter.as_str())])
                    .header("Prefer", "return=representation")
                    .json(patch)
                    .send()
                    .await?;
                Self::parse_json_response(resp, self.config.max_error_body_bytes).await
            })
            .await?;
        rows.into_iter().next().ok_or_else(|| StoreError::MissingRow {
            table: table.name(),
            id: id.to_string(),
        })
    }

    /// Returns `false` when no row had this id.
    pub async fn delete_row(&self, table: Table, id: &str) -> Result<bool, StoreError> {
        let url = table_url(&self.config.base_url, table);
        let id_filter = format!("eq.{id}");
        let rows: Vec<serde_json::Value> = self
            .request_with_retry(Replay::Idempotent, || async {
                let resp = self
                    .request(Method::DELETE, &url)
                    .query(&[("id", id_filter.as_str())])
                    .header("Prefer", "return=representation")
                    .send()
                    .await?;
                Self::parse_json_response(resp, self.config.max_error_body_bytes).await
            })
            .await?;
        Ok(!rows.is_empty())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .timeout(self.config.default_timeout)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn parse_json_response<T: DeserializeOwned>(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> Result<T, StoreError> {
        if resp.status().is_success() {
            let bytes = resp.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }
        Err(Self::to_upstream_error(resp, max_error_body_bytes).await)
    }

    async fn to_upstream_error(resp: reqwest::Response, max_error_body_bytes: usize) -> StoreError {
        let status = resp.status();
        let body = read_limited_text(resp, max_error_body_bytes).await;
        match serde_json::from_str::<StoreErrorBody>(&body) {
            Ok(parsed) => StoreError::Upstream {
                status,
                message: parsed.message,
            },
            Err(_) => StoreError::UpstreamBody { status, body },
        }
    }

    async fn request_with_retry<T, Fut, F>(&self, replay: Replay, mut f: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt > self.config.max_retries || !should_retry(&e, replay) {
                        return Err(e);
                    }
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt - 1,
                    );
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "store request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn table_url(base_url: &str, table: Table) -> String {
    format!("{base_url}/rest/v1/{}", table.name())
}

fn read_query<'a>(filters: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    let mut query = vec![("select", "*"), ("order", "created_at.desc")];
    query.extend_from_slice(filters);
    query
}

fn should_retry(err: &StoreError, replay: Replay) -> bool {
    match err {
        StoreError::Request(e) if e.is_connect() => true,
        StoreError::Request(e) => {
            replay == Replay::Idempotent && (e.is_timeout() || e.is_request())
        }
        StoreError::Upstream { status, .. } | StoreError::UpstreamBody { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS
                || (replay == Replay::Idempotent && status.is_server_error())
        }
        StoreError::MissingConfig(_) | StoreError::InvalidJson(_) | StoreError::MissingRow { .. } => {
            false
        }
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    let jitter = rand::thread_rng().gen_range(0..=jitter_cap);
    Duration::from_millis(capped_ms.saturating_add(jitter))
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read store error body");
            "<failed to read error body>".to_string()
        }
    }
}

/// PostgREST error envelope.
#[derive(Debug, Deserialize)]
struct StoreErrorBody {
    message: String,
    #[allow(dead_code)]
    code: Option<String>,
    #[allow(dead_code)]
    details: Option<String>,
    #[allow(dead_code)]
    hint: Option<String>,
}
