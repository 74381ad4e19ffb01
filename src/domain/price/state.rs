//! Price history state containers — app-owned, SDK-provided update logic.

use super::PricePoint;
use crate::shared::Symbol;
use std::collections::VecDeque;

/// Rolling price history buffer for one symbol, oldest first.
///
/// Never holds more than `max_size` points; pushing onto a full buffer
/// evicts the oldest point.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    pub symbol: Symbol,
    points: VecDeque<PricePoint>,
    max_size: usize,
}

impl HistoryBuffer {
    pub fn new(symbol: Symbol, max_size: usize) -> Self {
        Self {
            symbol,
            points: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Append a new point, evicting the oldest if at capacity.
    pub fn push(&mut self, point: PricePoint) {
        if self.max_size == 0 {
            return;
        }
        if self.points.len() >= self.max_size {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Replace all points (e.g. from a REST backfill), keeping the newest
    /// `max_size` of them. Input is expected oldest first.
    pub fn replace(&mut self, points: Vec<PricePoint>) {
        self.points.clear();
        let skip = points.len().saturating_sub(self.max_size);
        self.points.extend(points.into_iter().skip(skip));
    }

    pub fn points(&self) -> &VecDeque<PricePoint> {
        &self.points
    }

    pub fn to_vec(&self) -> Vec<PricePoint> {
        self.points.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.back()
    }

    pub fn oldest(&self) -> Option<&PricePoint> {
        self.points.front()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
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

    fn prices(buf: &HistoryBuffer) -> Vec<f64> {
        buf.points().iter().map(|p| p.price).collect()
    }

    #[test]
    fn test_push_appends_oldest_first() {
        let mut buf = HistoryBuffer::new(Symbol::from("AAPL"), 10);
        buf.push(point("AAPL", 1.0));
        buf.push(point("AAPL", 2.0));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.oldest().unwrap().price, 1.0);
        assert_eq!(buf.latest().unwrap().price, 2.0);
    }

    #[test]
    fn test_rolling_buffer_evicts_oldest() {
        let mut buf = HistoryBuffer::new(Symbol::from("AAPL"), 3);
        for p in 1..=4 {
            buf.push(point("AAPL", p as f64));
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(prices(&buf), [2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_full_buffer_of_fifty_stays_at_fifty() {
        let mut buf = HistoryBuffer::new(Symbol::from("AAPL"), 50);
        for p in 0..50 {
            buf.push(point("AAPL", p as f64));
        }
        assert_eq!(buf.len(), 50);

        buf.push(point("AAPL", 50.0));
        assert_eq!(buf.len(), 50);
        assert_eq!(buf.oldest().unwrap().price, 1.0);
        assert_eq!(buf.latest().unwrap().price, 50.0);
    }

    #[test]
    fn test_contents_are_last_n_in_arrival_order() {
        let cap = 7;
        let mut buf = HistoryBuffer::new(Symbol::from("AAPL"), cap);
        for total in 1..=25usize {
            buf.push(point("AAPL", total as f64));
            assert!(buf.len() <= cap);
            let expected: Vec<f64> = (total.saturating_sub(cap) + 1..=total)
                .map(|p| p as f64)
                .collect();
            assert_eq!(prices(&buf), expected);
        }
    }

    #[test]
    fn test_replace_keeps_newest() {
        let mut buf = HistoryBuffer::new(Symbol::from("AAPL"), 2);
        buf.push(point("AAPL", 9.0));
        let fresh = vec![point("AAPL", 1.0), point("AAPL", 2.0), point("AAPL", 3.0)];
        buf.replace(fresh);
        assert_eq!(prices(&buf), [2.0, 3.0]);
    }

    #[test]
    fn test_zero_capacity_holds_nothing() {
        let mut buf = HistoryBuffer::new(Symbol::from("AAPL"), 0);
        buf.push(point("AAPL", 1.0));
        assert!(buf.is_empty());
    }
}
