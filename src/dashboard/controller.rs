//! Dashboard controller — initial REST load, live stream wiring, teardown.
//!
//! Stream handlers run on the stream task and only forward updates over a
//! channel. `Dashboard` applies them on its owner's task through
//! [`Dashboard::next_update`] or [`Dashboard::apply_pending`].

use super::{DashboardConfig, DashboardState};
use crate::client::StockClient;
use crate::domain::price::{CurrentPrices, PricePoint};
use crate::error::{SdkError, StreamError};
use crate::shared::Symbol;
use crate::stream::client::StreamClient;
use crate::stream::transport::{SseTransport, Transport};
use crate::stream::{ConnectionState, Handlers};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::mpsc;

// ─── Snapshot source ─────────────────────────────────────────────────────────

/// Where the initial snapshot and backfill come from.
pub trait SnapshotSource: Send + Sync {
    fn current_prices(&self) -> BoxFuture<'_, Result<CurrentPrices, SdkError>>;

    /// The most recent `limit` points for `symbol`, oldest first.
    fn history<'a>(
        &'a self,
        symbol: &'a Symbol,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<PricePoint>, SdkError>>;
}

impl SnapshotSource for StockClient {
    fn current_prices(&self) -> BoxFuture<'_, Result<CurrentPrices, SdkError>> {
        async move { self.prices().current().await }.boxed()
    }

    fn history<'a>(
        &'a self,
        symbol: &'a Symbol,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<PricePoint>, SdkError>> {
        async move {
            self.prices()
                .history(symbol.as_str(), Some(limit))
                .await
        }
        .boxed()
    }
}

// ─── Updates ─────────────────────────────────────────────────────────────────

/// One stream event as applied to the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardUpdate {
    Price(PricePoint),
    Error(StreamError),
}

/// Outcome of [`Dashboard::load_initial`].
#[derive(Debug, Default)]
pub struct InitialLoad {
    /// Snapshot symbols, in snapshot order.
    pub symbols: Vec<Symbol>,
    /// Symbols whose history could not be fetched.
    pub failed: Vec<(Symbol, SdkError)>,
    pub selected: Option<Symbol>,
}

impl InitialLoad {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

/// Owns a dashboard's state, its snapshot source and its stream connection.
///
/// Dropping a `Dashboard` disposes it.
pub struct Dashboard<S: SnapshotSource, T: Transport = SseTransport> {
    source: S,
    stream: StreamClient<T>,
    state: DashboardState,
    config: DashboardConfig,
    updates: Option<mpsc::UnboundedReceiver<DashboardUpdate>>,
    disposed: bool,
}

impl<S: SnapshotSource, T: Transport> Dashboard<S, T> {
    pub fn new(source: S, stream: StreamClient<T>, config: DashboardConfig) -> Self {
        Self {
            state: DashboardState::new(&config),
            source,
            stream,
            config,
            updates: None,
            disposed: false,
        }
    }

    /// Fetch the snapshot, then each symbol's history one at a time.
    ///
    /// A failed snapshot fails the load. A failed history fetch is logged,
    /// recorded in the report, and the remaining symbols still load.
    pub async fn load_initial(&mut self) -> Result<InitialLoad, SdkError> {
        let snapshot = self.source.current_prices().await?;
        self.state.apply_snapshot(&snapshot);
        tracing::info!("Loaded {} current prices", snapshot.len());

        let limit = u32::try_from(self.config.history_limit).unwrap_or(u32::MAX);
        let mut report = InitialLoad::default();

        for symbol in snapshot.keys() {
            report.symbols.push(symbol.clone());
            match self.source.history(symbol, limit).await {
                Ok(points) => {
                    tracing::debug!("Loaded {} history points for {}", points.len(), symbol);
                    self.state.apply_history(symbol.clone(), points);
                }
                Err(e) => {
                    tracing::warn!("Failed to load history for {}: {}", symbol, e);
                    report.failed.push((symbol.clone(), e));
                }
            }
        }

        report.selected = self.state.ensure_selection(&snapshot).cloned();
        Ok(report)
    }

    /// Connect the stream. Updates queue until pulled with `next_update`.
    ///
    /// Calling it again replaces the connection and drops queued updates.
    pub fn start_stream(&mut self) -> Result<(), StreamError> {
        if self.disposed {
            return Err(StreamError::NotConnected);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let err_tx = tx.clone();
        let handlers = Handlers::new(move |price| {
            let _ = tx.send(DashboardUpdate::Price(price));
        })
        .on_error(move |e| {
            let _ = err_tx.send(DashboardUpdate::Error(e.clone()));
        });

        self.stream.connect(handlers)?;
        self.updates = Some(rx);
        self.state.set_connection(ConnectionState::Connecting);
        Ok(())
    }

    /// Wait for the next stream update and apply it.
    ///
    /// `None` once the stream has stopped for good, the dashboard was
    /// disposed, or the stream was never started.
    pub async fn next_update(&mut self) -> Option<DashboardUpdate> {
        let update = self.updates.as_mut()?.recv().await?;
        apply(&mut self.state, &update);
        Some(update)
    }

    /// Apply every update already queued without waiting. Returns how many.
    pub fn apply_pending(&mut self) -> usize {
        let Some(rx) = self.updates.as_mut() else {
            return 0;
        };
        let mut applied = 0;
        while let Ok(update) = rx.try_recv() {
            apply(&mut self.state, &update);
            applied += 1;
        }
        applied
    }

    pub fn select(&mut self, symbol: impl Into<Symbol>) {
        self.state.select(symbol);
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Connection state as the stream client sees it right now.
    ///
    /// May run ahead of `state().connection()` until queued updates are applied.
    pub fn stream_state(&self) -> ConnectionState {
        self.stream.state()
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Tear down the stream connection. Later calls do nothing.
    ///
    /// Updates still queued are discarded; nothing reaches the state afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.updates = None;
        self.stream.disconnect();
        tracing::debug!("Dashboard disposed");
    }
}

impl<S: SnapshotSource, T: Transport> Drop for Dashboard<S, T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn apply(state: &mut DashboardState, update: &DashboardUpdate) {
    match update {
        DashboardUpdate::Price(price) => state.apply_price(price.clone()),
        DashboardUpdate::Error(_) => state.apply_stream_error(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
