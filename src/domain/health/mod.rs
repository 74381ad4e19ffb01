//! Service domain — health, symbols, statistics.

#[cfg(feature = "http")]
pub mod client;

use crate::shared::Symbol;
use serde::{Deserialize, Serialize};

/// Service health as reported by `/api/stock/health`.
///
/// Fields the backend adds later are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub total_messages: u64,
    #[serde(default)]
    pub total_symbols: u64,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub kafka_message_count: Option<u64>,
}

impl HealthStatus {
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("UP")
    }
}
