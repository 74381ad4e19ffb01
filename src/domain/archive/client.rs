//! Archive sub-client — durable history reads and log statistics.

use super::BrokerStats;
use crate::client::StockClient;
use crate::domain::price::PricePoint;
use crate::error::SdkError;
use chrono::NaiveDateTime;

pub struct Archive<'a> {
    pub(crate) client: &'a StockClient,
}

impl<'a> Archive<'a> {
    pub async fn history(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PricePoint>, SdkError> {
        Ok(self.client.http.get_archive_history(symbol, limit).await?)
    }

    /// History across every symbol.
    pub async fn all(&self, limit: Option<u32>) -> Result<Vec<PricePoint>, SdkError> {
        Ok(self.client.http.get_archive_all(limit).await?)
    }

    pub async fn range(
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
        let points = self.client.http.get_archive_range(symbol, &from, &to).await?;
        Ok(points)
    }

    pub async fn stats(&self) -> Result<BrokerStats, SdkError> {
        Ok(self.client.http.get_broker_stats().await?)
    }
}
