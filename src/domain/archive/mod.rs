//! Archive domain — durable, broker-backed price history.
//!
//! Slower than the in-memory history endpoints but not limited to the
//! server's recent window, so it covers points published before a client
//! connected.

#[cfg(feature = "http")]
pub mod client;

use serde::{Deserialize, Serialize};

/// Message counts for the durable log (`/api/stock/stats/kafka`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerStats {
    pub total_messages: u64,
    pub topic: String,
    #[serde(default)]
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_stats_wire() {
        let json = r#"{"totalMessages":42,"topic":"stock-prices","timestamp":"2024-03-01T09:30:00"}"#;
        let stats: BrokerStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_messages, 42);
        assert_eq!(stats.topic, "stock-prices");
    }
}
