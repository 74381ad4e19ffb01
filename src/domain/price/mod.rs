//! Price domain — live price points, snapshots, bounded history.

#[cfg(feature = "http")]
pub mod client;
pub mod state;

use crate::shared::Symbol;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use state::HistoryBuffer;

/// Default number of points kept per symbol.
pub const MAX_HISTORY_POINTS: usize = 50;

/// Timestamp layout the backend uses (local date-time, no offset).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A single price observation for one symbol.
///
/// Immutable once received. The timestamp is kept exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub symbol: Symbol,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub timestamp: String,
}

impl PricePoint {
    /// Parse the timestamp.
    ///
    /// Accepts the backend's offset-less layout (with optional fractional
    /// seconds) and RFC 3339, which is normalized to UTC.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }

    pub fn is_up(&self) -> bool {
        self.change >= 0.0
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Format a date-time the way the backend's range endpoints expect.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Current-price snapshot keyed by symbol, iterated in ascending symbol order.
pub type CurrentPrices = BTreeMap<Symbol, PricePoint>;
