//! Prices sub-client — current snapshot and in-memory history.

use super::{CurrentPrices, PricePoint};
use crate::client::StockClient;
use crate::error::SdkError;
use chrono::NaiveDateTime;

/// Sub-client for live price queries.
pub struct Prices<'a> {
    pub(crate) client: &'a StockClient,
}

impl<'a> Prices<'a> {
    /// Latest price for every symbol.
    pub async fn current(&self) -> Result<CurrentPrices, SdkError> {
        Ok(self.client.http.get_current_prices().await?)
    }

    /// Latest price for one symbol. Unknown symbols yield `HttpError::NotFound`.
    pub async fn current_for(&self, symbol: &str) -> Result<PricePoint, SdkError> {
        Ok(self.client.http.get_current_price(symbol).await?)
    }

    /// Most recent `limit` points, oldest first (server default when `None`).
    pub async fn history(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PricePoint>, SdkError> {
        Ok(self.client.http.get_history(symbol, limit).await?)
    }

    pub async fn history_range(
        &self,
        symbol: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<PricePoint>, SdkError> {
        if from > to {
            return Err(SdkError::Validation(format!(
                "range start {} is after end {}",
                from, to
            )));
        }
        let points = self.client.http.get_history_range(symbol, &from, &to).await?;
        Ok(points)
    }
}
