//! Low-level HTTP client — `StockHttp`.
//!
//! One method per REST endpoint. Internal building block: the high-level
//! `StockClient` wraps this and exposes domain sub-clients.

use crate::domain::archive::BrokerStats;
use crate::domain::health::HealthStatus;
use crate::domain::price::{format_timestamp, CurrentPrices, PricePoint};
use crate::error::HttpError;
use crate::http::retry::RetryPolicy;
use crate::shared::Symbol;

use chrono::NaiveDateTime;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Low-level HTTP client for the stock REST API.
#[derive(Clone)]
pub struct StockHttp {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl StockHttp {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry: RetryPolicy::None,
        }
    }

    /// Use `retry` for every request issued by this client.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Current prices ───────────────────────────────────────────────────

    pub async fn get_current_prices(&self) -> Result<CurrentPrices, HttpError> {
        let url = format!("{}/api/stock/current", self.base_url);
        self.get(&url).await
    }

    pub async fn get_current_price(&self, symbol: &str) -> Result<PricePoint, HttpError> {
        let url = format!(
            "{}/api/stock/current/{}",
            self.base_url,
            urlencoding::encode(symbol)
        );
        self.get(&url).await
    }

    // ── In-memory history ────────────────────────────────────────────────

    pub async fn get_history(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PricePoint>, HttpError> {
        let mut url = format!(
            "{}/api/stock/history/{}",
            self.base_url,
            urlencoding::encode(symbol)
        );
        if let Some(l) = limit {
            url = format!("{}?limit={}", url, l);
        }
        self.get(&url).await
    }

    pub async fn get_history_range(
        &self,
        symbol: &str,
        from: &NaiveDateTime,
        to: &NaiveDateTime,
    ) -> Result<Vec<PricePoint>, HttpError> {
        let url = format!(
            "{}/api/stock/history/{}/range?{}",
            self.base_url,
            urlencoding::encode(symbol),
            range_query(from, to)
        );
        self.get(&url).await
    }

    // ── Durable (broker-backed) history ──────────────────────────────────

    pub async fn get_archive_history(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PricePoint>, HttpError> {
        let mut url = format!(
            "{}/api/stock/history/kafka/{}",
            self.base_url,
            urlencoding::encode(symbol)
        );
        if let Some(l) = limit {
            url = format!("{}?limit={}", url, l);
        }
        self.get(&url).await
    }

    pub async fn get_archive_all(&self, limit: Option<u32>) -> Result<Vec<PricePoint>, HttpError> {
        let mut url = format!("{}/api/stock/history/kafka/all", self.base_url);
        if let Some(l) = limit {
            url = format!("{}?limit={}", url, l);
        }
        self.get(&url).await
    }

    pub async fn get_archive_range(
        &self,
        symbol: &str,
        from: &NaiveDateTime,
        to: &NaiveDateTime,
    ) -> Result<Vec<PricePoint>, HttpError> {
        let url = format!(
            "{}/api/stock/history/kafka/{}/range?{}",
            self.base_url,
            urlencoding::encode(symbol),
            range_query(from, to)
        );
        self.get(&url).await
    }

    pub async fn get_broker_stats(&self) -> Result<BrokerStats, HttpError> {
        let url = format!("{}/api/stock/stats/kafka", self.base_url);
        self.get(&url).await
    }

    // ── Service ──────────────────────────────────────────────────────────

    pub async fn get_symbols(&self) -> Result<Vec<Symbol>, HttpError> {
        let url = format!("{}/api/stock/symbols", self.base_url);
        self.get(&url).await
    }

    pub async fn get_health(&self) -> Result<HealthStatus, HttpError> {
        let url = format!("{}/api/stock/health", self.base_url);
        self.get(&url).await
    }

    pub async fn get_stats(&self) -> Result<serde_json::Value, HttpError> {
        let url = format!("{}/api/stock/stats", self.base_url);
        self.get(&url).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        self.request_with_retry(url, &self.retry).await
    }

    async fn request_with_retry<T: DeserializeOwned>(
        &self,
        url: &str,
        retry: &RetryPolicy,
    ) -> Result<T, HttpError> {
        let Some(config) = retry.config() else {
            return self.do_request(url).await;
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request::<T>(url).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let should_retry = match &e {
                        HttpError::ServerError { status, .. } => {
                            config.is_retryable_status(*status)
                        }
                        HttpError::RateLimited { retry_after_ms } => {
                            if let Some(ms) = retry_after_ms {
                                futures_timer::Delay::new(Duration::from_millis(*ms)).await;
                            }
                            config.is_retryable_status(429)
                        }
                        HttpError::Timeout => true,
                        HttpError::Reqwest(re) => {
                            re.is_connect() || re.is_timeout() || re.is_request()
                        }
                        _ => false,
                    };

                    if should_retry && attempt < config.max_retries {
                        let delay = config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request to {}",
                            url
                        );
                        futures_timer::Delay::new(delay).await;
                        last_error = Some(e);
                    } else if should_retry {
                        return Err(HttpError::MaxRetriesExceeded {
                            attempts: attempt + 1,
                            last_error: e.to_string(),
                        });
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        tracing::debug!("GET {}", url);
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::Reqwest(e)
            }
        })?;
        let status = resp.status();

        if status.is_success() {
            let parsed = resp.json::<T>().await?;
            return Ok(parsed);
        }

        let status_code = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();

        match status_code {
            404 => Err(HttpError::NotFound(if body_text.is_empty() {
                url.to_string()
            } else {
                body_text
            })),
            429 => Err(HttpError::RateLimited {
                retry_after_ms: None,
            }),
            400..=499 => Err(HttpError::BadRequest(body_text)),
            _ => Err(HttpError::ServerError {
                status: status_code,
                body: body_text,
            }),
        }
    }
}

fn range_query(from: &NaiveDateTime, to: &NaiveDateTime) -> String {
    format!(
        "from={}&to={}",
        urlencoding::encode(&format_timestamp(from)),
        urlencoding::encode(&format_timestamp(to))
    )
}
