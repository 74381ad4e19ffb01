//! Stream client — one push connection with bounded automatic reconnection.
//!
//! - Background tokio task per `connect` call
//! - At most one active connection; `connect` tears down the previous one
//! - Linear backoff reconnection, budget re-armed by any success
//! - Per-connection `CancellationToken` guarding the reconnect timer
//! - Handlers held in a lock shared with the client; `disconnect` empties it,
//!   so no handler runs once `disconnect` has returned

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::StreamError;
use crate::stream::policy::{Decision, ReconnectState};
use crate::stream::sse::SseFrame;
use crate::stream::transport::{FrameStream, SseTransport, Transport};
use crate::stream::{ConnectionState, Handlers, StreamConfig, StreamEvent};

// ─── Shared observable state ─────────────────────────────────────────────────

struct Shared {
    state: AtomicU8,
    attempts: AtomicU32,
}

impl Shared {
    fn new(state: ConnectionState) -> Self {
        Self {
            state: AtomicU8::new(state as u8),
            attempts: AtomicU32::new(0),
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn set_attempts(&self, attempts: u32) {
        self.attempts.store(attempts, Ordering::SeqCst);
    }
}

// ─── Handler slot ────────────────────────────────────────────────────────────

/// Handlers for one connection, shared by the client and its task.
///
/// Every invocation happens while the lock is held, and `clear` takes the
/// same lock, so after `clear` returns no invocation is in flight and none
/// can start.
#[derive(Clone)]
struct HandlerSlot(Arc<Mutex<Option<Handlers>>>);

impl HandlerSlot {
    fn new(handlers: Handlers) -> Self {
        Self(Arc::new(Mutex::new(Some(handlers))))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Handlers>> {
        // A panicking handler must not wedge teardown.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the handlers unless the slot was cleared.
    fn with<R>(&self, f: impl FnOnce(&mut Handlers) -> R) -> Option<R> {
        self.lock().as_mut().map(f)
    }

    /// Drop the handlers. Returns whether they were still installed.
    fn clear(&self) -> bool {
        let handlers = self.lock().take();
        handlers.is_some()
    }
}

/// Clears the slot when the connection task ends, however it ends.
struct ClearOnExit(HandlerSlot);

impl Drop for ClearOnExit {
    fn drop(&mut self) {
        self.0.clear();
    }
}

struct Active {
    cancel: CancellationToken,
    handlers: HandlerSlot,
    handle: JoinHandle<()>,
}

impl Active {
    fn shutdown(self) {
        self.cancel.cancel();
        // Waits for a handler that is running right now.
        self.handlers.clear();
        self.handle.abort();
    }
}

// ─── Public StreamClient ─────────────────────────────────────────────────────

/// Push stream client.
///
/// Construct one per consumer and pass it to whoever owns its lifetime
/// (typically a `Dashboard`). There is no process-wide instance.
pub struct StreamClient<T: Transport = SseTransport> {
    config: StreamConfig,
    transport: Arc<T>,
    shared: Arc<Shared>,
    active: Option<Active>,
}

impl StreamClient<SseTransport> {
    /// Create a client over HTTP SSE. Does not connect yet.
    pub fn new(config: StreamConfig) -> Self {
        let transport = SseTransport::new(config.connect_timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> StreamClient<T> {
    pub fn with_transport(config: StreamConfig, transport: T) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            shared: Arc::new(Shared::new(ConnectionState::Disconnected)),
            active: None,
        }
    }

    /// Open the stream, closing any existing connection first.
    ///
    /// Spawns the connection task on the current tokio runtime. The retry
    /// budget starts full.
    pub fn connect(&mut self, handlers: Handlers) -> Result<(), StreamError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| StreamError::ConnectionFailed(format!("no tokio runtime: {}", e)))?;

        self.disconnect();

        // Fresh shared state per connection: a task that is still winding
        // down after abort can only write to its own copy.
        let cancel = CancellationToken::new();
        let handlers = HandlerSlot::new(handlers);
        self.shared = Arc::new(Shared::new(ConnectionState::Connecting));

        let handle = runtime.spawn(run_task(
            Arc::clone(&self.transport),
            self.config.clone(),
            handlers.clone(),
            Arc::clone(&self.shared),
            cancel.clone(),
        ));
        self.active = Some(Active {
            cancel,
            handlers,
            handle,
        });

        Ok(())
    }

    /// Close the active connection, if any. Safe to call repeatedly.
    ///
    /// Cancels a pending reconnection as well. Once this returns no handler
    /// is invoked again; if one is running on another thread, this blocks
    /// until it finishes. Must not be called from inside a handler.
    pub fn disconnect(&mut self) {
        if let Some(active) = self.active.take() {
            active.shutdown();
            tracing::info!("SSE connection closed");
        }
        self.shared.set_state(ConnectionState::Disconnected);
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from(self.shared.state.load(Ordering::SeqCst))
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Whether a connection task is live (connected, connecting, or waiting to retry).
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| !a.cancel.is_cancelled())
    }

    /// Reconnect attempts made since the last successful open or message.
    pub fn attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

impl<T: Transport> Drop for StreamClient<T> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.shutdown();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task<T: Transport>(
    transport: Arc<T>,
    config: StreamConfig,
    handlers: HandlerSlot,
    shared: Arc<Shared>,
    cancel: CancellationToken,
) {
    let _clear = ClearOnExit(handlers.clone());
    let mut reconnect = ReconnectState::new(config.policy);

    loop {
        // ── 1. Open ──────────────────────────────────────────────────────
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = transport.open(&config.url) => result,
        };

        // ── 2. Pump frames until the connection breaks ───────────────────
        let error = match opened {
            Ok(frames) => {
                reconnect.reset();
                shared.set_attempts(0);
                shared.set_state(ConnectionState::Connected);
                tracing::info!("SSE connection opened: {}", config.url);

                match pump(frames, &handlers, &mut reconnect, &shared, &cancel).await {
                    Some(error) => error,
                    None => return,
                }
            }
            Err(error) => error,
        };

        if cancel.is_cancelled() {
            return;
        }

        // ── 3. Report, then decide ───────────────────────────────────────
        tracing::error!("SSE error: {}", error);
        let delivered = handlers.with(|h| {
            if let Some(on_error) = h.on_error.as_mut() {
                on_error(&error);
            }
        });
        if delivered.is_none() {
            return;
        }

        let decision = if config.reconnect {
            reconnect.on_transport_error()
        } else {
            Decision::GiveUp
        };

        match decision {
            Decision::Retry { attempt, delay } => {
                shared.set_attempts(attempt);
                shared.set_state(ConnectionState::Connecting);
                tracing::info!(
                    "Reconnecting... attempt {}/{} in {}ms",
                    attempt,
                    reconnect.policy().max_attempts,
                    delay.as_millis()
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Decision::GiveUp => {
                if config.reconnect {
                    tracing::error!("Max reconnection attempts reached");
                }
                cancel.cancel();
                shared.set_state(ConnectionState::Disconnected);
                return;
            }
        }
    }
}

/// Deliver frames until the stream errors or ends (`Some`) or the
/// connection is cancelled (`None`).
async fn pump(
    mut frames: FrameStream,
    handlers: &HandlerSlot,
    reconnect: &mut ReconnectState,
    shared: &Shared,
    cancel: &CancellationToken,
) -> Option<StreamError> {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            next = frames.next() => next,
        };

        match next {
            Some(Ok(frame)) => {
                if !dispatch(&frame, handlers, reconnect, shared) {
                    return None;
                }
            }
            Some(Err(error)) => return Some(error),
            None => return Some(StreamError::StreamEnded),
        }
    }
}

/// Handle one frame. Returns `false` once the handlers have been cleared.
fn dispatch(
    frame: &SseFrame,
    handlers: &HandlerSlot,
    reconnect: &mut ReconnectState,
    shared: &Shared,
) -> bool {
    match StreamEvent::from_frame(frame) {
        Ok(StreamEvent::Price(price)) => {
            let delivered = handlers.with(|h| (h.on_message)(price)).is_some();
            if delivered {
                reconnect.reset();
                shared.set_attempts(0);
            }
            return delivered;
        }
        Ok(StreamEvent::Info(text)) => {
            tracing::info!("SSE info: {}", text);
        }
        Ok(StreamEvent::Other { event, .. }) => {
            tracing::debug!("Ignoring SSE event {:?}", event);
        }
        Err(e) => {
            tracing::warn!("Error parsing stock price: {} (raw: {})", e, frame.data);
        }
    }
    true
}

// ─── Tests ───────────────────────────────────────────────────────────────────
