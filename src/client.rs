//! High-level client — `StockClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, shared cache state, and accessor methods.

use crate::domain::archive::client::Archive;
use crate::domain::health::client::Service;
use crate::domain::price::client::Prices;
use crate::error::SdkError;
use crate::http::{RetryPolicy, StockHttp};
use crate::shared::Symbol;
use crate::stream::{ReconnectPolicy, StreamConfig};

use async_lock::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Re-export sub-client types for convenience.
pub use crate::domain::archive::client::Archive as ArchiveClient;
pub use crate::domain::health::client::Service as ServiceClient;
pub use crate::domain::price::client::Prices as PricesClient;

/// The primary entry point for the stock REST API.
///
/// Provides nested sub-client accessors for each domain:
/// `client.prices()`, `client.archive()`, `client.service()`.
#[derive(Clone)]
pub struct StockClient {
    pub(crate) http: StockHttp,
    pub(crate) stream_config: StreamConfig,
    /// Symbol list cache: (symbols, fetched_at)
    pub(crate) symbols_cache: Arc<RwLock<Option<(Vec<Symbol>, Instant)>>>,
    pub(crate) symbols_cache_ttl: Duration,
}

impl StockClient {
    pub fn builder() -> StockClientBuilder {
        StockClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn prices(&self) -> Prices<'_> {
        Prices { client: self }
    }

    pub fn archive(&self) -> Archive<'_> {
        Archive { client: self }
    }

    pub fn service(&self) -> Service<'_> {
        Service { client: self }
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Stream config matching this client's endpoints.
    ///
    /// The stream client is intentionally not embedded in `StockClient`:
    /// its lifetime belongs to whatever displays the data.
    pub fn stream_config(&self) -> &StreamConfig {
        &self.stream_config
    }

    /// Create a new SSE stream client from the current config.
    #[cfg(feature = "stream")]
    pub fn stream(&self) -> crate::stream::client::StreamClient {
        crate::stream::client::StreamClient::new(self.stream_config.clone())
    }

    /// Clear all HTTP caches.
    pub async fn clear_all_caches(&self) {
        *self.symbols_cache.write().await = None;
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct StockClientBuilder {
    base_url: String,
    stream_url: Option<String>,
    symbols_cache_ttl: Duration,
    retry_policy: RetryPolicy,
    reconnect_policy: ReconnectPolicy,
}

impl Default for StockClientBuilder {
    fn default() -> Self {
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            stream_url: None,
            symbols_cache_ttl: Duration::from_secs(60),
            retry_policy: RetryPolicy::None,
            reconnect_policy: ReconnectPolicy::default(),
        }
    }
}

impl StockClientBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Override the stream URL (defaults to `{base_url}/api/stream/stocks`).
    pub fn stream_url(mut self, url: &str) -> Self {
        self.stream_url = Some(url.to_string());
        self
    }

    pub fn symbols_cache_ttl(mut self, ttl: Duration) -> Self {
        self.symbols_cache_ttl = ttl;
        self
    }

    /// Retry policy applied to every REST call. Defaults to no retries.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }

    pub fn build(self) -> Result<StockClient, SdkError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(SdkError::Validation(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }

        let mut stream_config = StreamConfig::for_base_url(&self.base_url);
        if let Some(url) = self.stream_url {
            stream_config.url = url;
        }
        stream_config.policy = self.reconnect_policy;

        Ok(StockClient {
            http: StockHttp::new(&self.base_url)
                .with_retry_policy(self.retry_policy),
            stream_config,
            symbols_cache: Arc::new(RwLock::new(None)),
            symbols_cache_ttl: self.symbols_cache_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = StockClient::builder().build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:8082");
        assert_eq!(
            client.stream_config().url,
            "http://localhost:8082/api/stream/stocks"
        );
        assert_eq!(client.stream_config().policy, ReconnectPolicy::default());
    }

    #[test]
    fn test_builder_overrides() {
        let policy = ReconnectPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(100),
        };
        let client = StockClient::builder()
            .base_url("https://prices.example.com/")
            .stream_url("https://push.example.com/sse")
            .reconnect_policy(policy)
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://prices.example.com");
        assert_eq!(client.stream_config().url, "https://push.example.com/sse");
        assert_eq!(client.stream_config().policy.max_attempts, 2);
    }

    #[test]
    fn test_builder_rejects_non_http_url() {
        let result = StockClient::builder().base_url("localhost:8082").build();
        assert!(matches!(result, Err(SdkError::Validation(_))));
    }

    #[tokio::test]
    async fn test_clear_all_caches() {
        let client = StockClient::builder().build().unwrap();
        *client.symbols_cache.write().await =
            Some((vec![Symbol::from("AAPL")], Instant::now()));
        client.clear_all_caches().await;
        assert!(client.symbols_cache.read().await.is_none());
    }
}
