//! Service sub-client — health, statistics, symbol list (cached).

use super::HealthStatus;
use crate::client::StockClient;
use crate::error::SdkError;
use crate::shared::Symbol;
use std::time::Instant;

/// Sub-client for service-level queries.
pub struct Service<'a> {
    pub(crate) client: &'a StockClient,
}

impl<'a> Service<'a> {
    pub async fn health(&self) -> Result<HealthStatus, SdkError> {
        Ok(self.client.http.get_health().await?)
    }

    /// Free-form statistics; the shape is not fixed by the backend.
    pub async fn stats(&self) -> Result<serde_json::Value, SdkError> {
        Ok(self.client.http.get_stats().await?)
    }

    /// Known symbols (cached for the client's symbols TTL).
    pub async fn symbols(&self) -> Result<Vec<Symbol>, SdkError> {
        {
            let cache = self.client.symbols_cache.read().await;
            if let Some((symbols, fetched_at)) = cache.as_ref() {
                if fetched_at.elapsed() < self.client.symbols_cache_ttl {
                    return Ok(symbols.clone());
                }
            }
        }

        let mut symbols = self.client.http.get_symbols().await?;
        symbols.sort();
        *self.client.symbols_cache.write().await = Some((symbols.clone(), Instant::now()));
        Ok(symbols)
    }

    pub async fn clear_cache(&self) {
        *self.client.symbols_cache.write().await = None;
    }
}
