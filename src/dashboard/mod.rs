//! Dashboard — the state a price display renders from.
//!
//! [`DashboardState`] is the plain state container with its derived views.
//! `Dashboard` (feature `stream`) wires it to a REST snapshot source and a
//! `StreamClient` and owns their lifetimes.

pub mod state;

#[cfg(feature = "stream")]
pub mod controller;

use crate::domain::price::MAX_HISTORY_POINTS;
use crate::shared::Symbol;

pub use state::DashboardState;

#[cfg(feature = "stream")]
pub use controller::{Dashboard, DashboardUpdate, InitialLoad, SnapshotSource};

/// Symbol selected before any data has loaded.
pub const DEFAULT_SYMBOL: &str = "AAPL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Points kept per symbol, also the history limit requested on load.
    pub history_limit: usize,
    pub default_symbol: Option<Symbol>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            history_limit: MAX_HISTORY_POINTS,
            default_symbol: Some(Symbol::from(DEFAULT_SYMBOL)),
        }
    }
}
