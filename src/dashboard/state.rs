//! Dashboard state — latest prices, bounded histories, selection, status.
//!
//! Plain synchronous container. Everything that mutates it runs on the
//! owner's task; see `Dashboard` for the stream wiring.

use super::DashboardConfig;
use crate::domain::price::{CurrentPrices, HistoryBuffer, PricePoint};
use crate::shared::Symbol;
use crate::stream::ConnectionState;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DashboardState {
    latest: HashMap<Symbol, PricePoint>,
    history: HashMap<Symbol, HistoryBuffer>,
    selected: Option<Symbol>,
    connection: ConnectionState,
    received: u64,
    history_limit: usize,
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            latest: HashMap::new(),
            history: HashMap::new(),
            selected: config.default_symbol.clone(),
            connection: ConnectionState::Connecting,
            received: 0,
            history_limit: config.history_limit,
        }
    }

    // ── Updates ──────────────────────────────────────────────────────────

    /// Merge a REST snapshot into the latest-price map.
    pub fn apply_snapshot(&mut self, snapshot: &CurrentPrices) {
        for (symbol, point) in snapshot {
            self.latest.insert(symbol.clone(), point.clone());
        }
    }

    /// Replace one symbol's history with a REST backfill (oldest first).
    pub fn apply_history(&mut self, symbol: Symbol, points: Vec<PricePoint>) {
        let limit = self.history_limit;
        self.history
            .entry(symbol.clone())
            .or_insert_with(|| HistoryBuffer::new(symbol, limit))
            .replace(points);
    }

    /// Apply one live price from the stream.
    pub fn apply_price(&mut self, point: PricePoint) {
        let limit = self.history_limit;
        self.history
            .entry(point.symbol.clone())
            .or_insert_with(|| HistoryBuffer::new(point.symbol.clone(), limit))
            .push(point.clone());
        self.latest.insert(point.symbol.clone(), point);
        self.received += 1;
        self.connection = ConnectionState::Connected;
    }

    pub fn apply_stream_error(&mut self) {
        self.connection = ConnectionState::Disconnected;
    }

    pub fn set_connection(&mut self, state: ConnectionState) {
        self.connection = state;
    }

    /// Keep the selection if the snapshot has it, otherwise switch to the
    /// snapshot's first symbol. An empty snapshot leaves the selection alone.
    ///
    /// Returns the symbol selected afterwards.
    pub fn ensure_selection(&mut self, snapshot: &CurrentPrices) -> Option<&Symbol> {
        let present = self
            .selected
            .as_ref()
            .is_some_and(|s| snapshot.contains_key(s));
        if !present {
            if let Some(first) = snapshot.keys().next() {
                tracing::debug!(
                    "Selection {:?} not in snapshot, selecting {}",
                    self.selected.as_ref().map(Symbol::as_str),
                    first
                );
                self.selected = Some(first.clone());
            }
        }
        self.selected.as_ref()
    }

    pub fn select(&mut self, symbol: impl Into<Symbol>) {
        self.selected = Some(symbol.into());
    }

    pub fn clear(&mut self) {
        self.latest.clear();
        self.history.clear();
        self.received = 0;
    }

    // ── Views ────────────────────────────────────────────────────────────

    /// Latest prices, ascending by symbol.
    pub fn sorted_prices(&self) -> Vec<&PricePoint> {
        let mut prices: Vec<&PricePoint> = self.latest.values().collect();
        prices.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        prices
    }

    /// History of the selected symbol, oldest first. Empty if nothing recorded.
    pub fn selected_history(&self) -> Vec<&PricePoint> {
        self.selected
            .as_ref()
            .and_then(|s| self.history.get(s))
            .map(|h| h.points().iter().collect())
            .unwrap_or_default()
    }

    pub fn history(&self, symbol: &str) -> Option<&HistoryBuffer> {
        self.history.get(symbol)
    }

    pub fn latest(&self, symbol: &str) -> Option<&PricePoint> {
        self.latest.get(symbol)
    }

    pub fn selected(&self) -> Option<&Symbol> {
        self.selected.as_ref()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Live prices received since creation. Never decreases except on `clear`.
    pub fn received_count(&self) -> u64 {
        self.received
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(symbol: &str, price: f64) -> PricePoint {
        PricePoint {
            symbol: Symbol::from(symbol),
            price,
            change: 0.0,
            change_percent: 0.0,
            timestamp: "2024-03-01T09:30:00".to_string(),
        }
    }

    fn snapshot(points: &[(&str, f64)]) -> CurrentPrices {
        points
            .iter()
            .map(|(s, p)| (Symbol::from(*s), point(s, *p)))
            .collect()
    }

    fn state() -> DashboardState {
        DashboardState::new(&DashboardConfig::default())
    }

    #[test]
    fn test_initial_state() {
        let s = state();
        assert_eq!(s.connection(), ConnectionState::Connecting);
        assert_eq!(s.received_count(), 0);
        assert_eq!(s.selected().map(Symbol::as_str), Some("AAPL"));
        assert!(s.sorted_prices().is_empty());
        assert!(s.selected_history().is_empty());
    }

    #[test]
    fn test_apply_price_updates_everything() {
        let mut s = state();
        s.apply_price(point("AAPL", 150.0));
        s.apply_price(point("AAPL", 151.0));

        assert_eq!(s.latest("AAPL").unwrap().price, 151.0);
        assert_eq!(s.history("AAPL").unwrap().len(), 2);
        assert_eq!(s.received_count(), 2);
        assert_eq!(s.connection(), ConnectionState::Connected);
    }

    #[test]
    fn test_history_capped_at_limit() {
        let mut s = state();
        for p in 0..50 {
            s.apply_price(point("AAPL", p as f64));
        }
        assert_eq!(s.history("AAPL").unwrap().len(), 50);

        s.apply_price(point("AAPL", 50.0));
        let h = s.history("AAPL").unwrap();
        assert_eq!(h.len(), 50);
        assert_eq!(h.oldest().unwrap().price, 1.0);
        assert_eq!(h.latest().unwrap().price, 50.0);
    }

    #[test]
    fn test_stream_error_disconnects() {
        let mut s = state();
        s.apply_price(point("AAPL", 1.0));
        s.apply_stream_error();
        assert_eq!(s.connection(), ConnectionState::Disconnected);
        // next price flips it back
        s.apply_price(point("AAPL", 2.0));
        assert_eq!(s.connection(), ConnectionState::Connected);
    }

    #[test]
    fn test_sorted_prices_lexicographic() {
        let mut s = state();
        s.apply_price(point("MSFT", 300.0));
        s.apply_price(point("AAPL", 150.0));
        s.apply_price(point("GOOGL", 140.0));
        let order: Vec<_> = s
            .sorted_prices()
            .iter()
            .map(|p| p.symbol.as_str())
            .collect();
        assert_eq!(order, ["AAPL", "GOOGL", "MSFT"]);
    }

    #[test]
    fn test_ensure_selection_picks_first_when_absent() {
        let mut s = DashboardState::new(&DashboardConfig {
            default_symbol: Some(Symbol::from("TSLA")),
            ..DashboardConfig::default()
        });
        let snap = snapshot(&[("MSFT", 300.0), ("AAPL", 150.0)]);
        s.apply_snapshot(&snap);
        assert_eq!(
            s.ensure_selection(&snap).map(Symbol::as_str),
            Some("AAPL")
        );
    }

    #[test]
    fn test_ensure_selection_keeps_present_symbol() {
        let mut s = DashboardState::new(&DashboardConfig {
            default_symbol: Some(Symbol::from("MSFT")),
            ..DashboardConfig::default()
        });
        let snap = snapshot(&[("AAPL", 150.0), ("MSFT", 300.0)]);
        assert_eq!(
            s.ensure_selection(&snap).map(Symbol::as_str),
            Some("MSFT")
        );
    }

    #[test]
    fn test_ensure_selection_empty_snapshot_keeps_default() {
        let mut s = state();
        assert_eq!(
            s.ensure_selection(&CurrentPrices::new()).map(Symbol::as_str),
            Some("AAPL")
        );

        let mut none = DashboardState::new(&DashboardConfig {
            default_symbol: None,
            ..DashboardConfig::default()
        });
        assert!(none.ensure_selection(&CurrentPrices::new()).is_none());
    }

    #[test]
    fn test_selected_history_follows_selection() {
        let mut s = state();
        s.apply_history(
            Symbol::from("AAPL"),
            vec![point("AAPL", 1.0), point("AAPL", 2.0)],
        );
        s.apply_price(point("MSFT", 300.0));
        assert_eq!(s.selected_history().len(), 2);

        s.select("MSFT");
        let h = s.selected_history();
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].price, 300.0);

        s.select("NFLX");
        assert!(s.selected_history().is_empty());
    }

    #[test]
    fn test_backfill_then_live_appends() {
        let mut s = DashboardState::new(&DashboardConfig {
            history_limit: 3,
            ..DashboardConfig::default()
        });
        s.apply_history(
            Symbol::from("AAPL"),
            (1..=5).map(|p| point("AAPL", p as f64)).collect(),
        );
        s.apply_price(point("AAPL", 6.0));
        let prices: Vec<_> = s.selected_history().iter().map(|p| p.price).collect();
        assert_eq!(prices, [4.0, 5.0, 6.0]);
        // backfill does not count as received stream traffic
        assert_eq!(s.received_count(), 1);
    }

    #[test]
    fn test_snapshot_merges_without_touching_counter() {
        let mut s = state();
        s.apply_price(point("NFLX", 500.0));
        s.apply_snapshot(&snapshot(&[("AAPL", 150.0), ("MSFT", 300.0)]));
        assert_eq!(s.sorted_prices().len(), 3);
        assert_eq!(s.received_count(), 1);
        assert_eq!(s.connection(), ConnectionState::Connected);
    }
}
