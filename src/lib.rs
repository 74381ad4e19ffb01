//! # Stock Stream SDK
//!
//! Rust client for a live stock price service: REST snapshots and history,
//! a reconnecting SSE price stream, and the state a dashboard renders from.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — Symbols, price points, bounded history (always available)
//! 2. **HTTP API** — `StockHttp` with opt-in retry policies
//! 3. **Stream** — SSE framing, reconnect policy, `StreamClient`
//! 4. **High-Level Client** — `StockClient` with nested sub-clients and caching
//! 5. **Dashboard** — `DashboardState` views driven by a `Dashboard` controller
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stock_stream_sdk::prelude::*;
//!
//! let client = StockClient::builder()
//!     .base_url("http://localhost:8082")
//!     .build()?;
//!
//! let stream = client.stream();
//! let mut dashboard = Dashboard::new(client, stream, DashboardConfig::default());
//! dashboard.load_initial().await?;
//! dashboard.start_stream()?;
//!
//! while let Some(_update) = dashboard.next_update().await {
//!     for price in dashboard.state().sorted_prices() {
//!         println!("{} {:.2}", price.symbol, price.price);
//!     }
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes used across all domains.
pub mod shared;

/// Domain modules (vertical slices): types, state, sub-clients.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 3: Stream ──────────────────────────────────────────────────────────

/// SSE price stream: framing, events, reconnect policy, client.
pub mod stream;

// ── Layer 4: High-Level Client ───────────────────────────────────────────────

/// `StockClient` — the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Layer 5: Dashboard ───────────────────────────────────────────────────────

/// Dashboard state and its stream-driven controller.
pub mod dashboard;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::Symbol;

    // Domain types
    pub use crate::domain::archive::BrokerStats;
    pub use crate::domain::health::HealthStatus;
    pub use crate::domain::price::{CurrentPrices, HistoryBuffer, PricePoint};

    // Errors
    pub use crate::error::{HttpError, SdkError, StreamError};

    // Network
    pub use crate::network::DEFAULT_API_URL;

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{
        ArchiveClient, PricesClient, ServiceClient, StockClient, StockClientBuilder,
    };
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};

    // Stream types
    pub use crate::stream::{
        ConnectionState, Handlers, ReconnectPolicy, StreamConfig, StreamEvent,
    };
    #[cfg(feature = "stream")]
    pub use crate::stream::client::StreamClient;
    #[cfg(feature = "stream")]
    pub use crate::stream::transport::{SseTransport, Transport};

    // Dashboard
    pub use crate::dashboard::{DashboardConfig, DashboardState};
    #[cfg(feature = "stream")]
    pub use crate::dashboard::{Dashboard, DashboardUpdate, InitialLoad, SnapshotSource};
}
