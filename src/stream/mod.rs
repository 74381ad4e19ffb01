//! Push stream layer — SSE framing, events, reconnect policy, client.
//!
//! The transport is pluggable through the [`transport::Transport`] trait; the
//! default implementation reads `text/event-stream` over `reqwest`.
//! Backoff math lives in [`policy`] so it can be tested without a network.
//!
//! This module defines the shared event/state/config types.

pub mod policy;
pub mod sse;

#[cfg(feature = "stream")]
pub mod client;

#[cfg(feature = "stream")]
pub mod transport;

use crate::domain::price::PricePoint;
use crate::error::StreamError;
use std::time::Duration;

pub use policy::{Decision, ReconnectPolicy, ReconnectState};
pub use sse::{SseDecoder, SseFrame};

/// SSE event name carrying a JSON [`PricePoint`].
pub const PRICE_EVENT: &str = "stock-price";

/// SSE event name carrying advisory free text.
pub const INFO_EVENT: &str = "info";

// ─── Connection state ────────────────────────────────────────────────────────

/// Lifecycle of the push connection.
///
/// Only stream lifecycle events move this; REST calls never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Connected = 1,
    Disconnected = 2,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        }
    }
}

impl From<u8> for ConnectionState {
    fn from(v: u8) -> Self {
        match v {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── StreamEvent ─────────────────────────────────────────────────────────────

/// A decoded SSE frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A `stock-price` event.
    Price(PricePoint),
    /// An `info` event. Advisory only, never applied to state.
    Info(String),
    /// Any other event name.
    Other { event: String, data: String },
}

impl StreamEvent {
    /// Interpret a frame. Fails only when a `stock-price` payload is malformed.
    pub fn from_frame(frame: &SseFrame) -> Result<Self, StreamError> {
        match frame.event.as_str() {
            PRICE_EVENT => serde_json::from_str::<PricePoint>(&frame.data)
                .map(StreamEvent::Price)
                .map_err(|e| StreamError::Deserialization(e.to_string())),
            INFO_EVENT => Ok(StreamEvent::Info(frame.data.clone())),
            other => Ok(StreamEvent::Other {
                event: other.to_string(),
                data: frame.data.clone(),
            }),
        }
    }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

pub type MessageHandler = Box<dyn FnMut(PricePoint) + Send + 'static>;
pub type ErrorHandler = Box<dyn FnMut(&StreamError) + Send + 'static>;

/// Caller-supplied callbacks for one `connect` call.
///
/// The same handlers are reused for every automatic reconnection.
pub struct Handlers {
    pub(crate) on_message: MessageHandler,
    pub(crate) on_error: Option<ErrorHandler>,
}

impl Handlers {
    pub fn new(on_message: impl FnMut(PricePoint) + Send + 'static) -> Self {
        Self {
            on_message: Box::new(on_message),
            on_error: None,
        }
    }

    /// Called on every transport error, before the retry decision.
    pub fn on_error(mut self, on_error: impl FnMut(&StreamError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Configuration for the stream client.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub url: String,
    /// When false every transport error is terminal.
    pub reconnect: bool,
    pub policy: ReconnectPolicy,
    pub connect_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: crate::network::stream_url(crate::network::DEFAULT_API_URL),
            reconnect: true,
            policy: ReconnectPolicy::default(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl StreamConfig {
    /// Config for the all-symbols stream under `base_url`.
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            url: crate::network::stream_url(base_url),
            ..Self::default()
        }
    }

    /// Config for the single-symbol stream under `base_url`.
    pub fn for_symbol(base_url: &str, symbol: &str) -> Self {
        Self {
            url: format!(
                "{}/{}",
                crate::network::stream_url(base_url),
                urlencoding::encode(symbol)
            ),
            ..Self::default()
        }
    }
}
