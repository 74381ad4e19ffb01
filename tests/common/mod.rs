//! Canned stock service for integration tests: an `axum` router on loopback.
//!
//! Every request goes to one fallback handler that records the target
//! (path + query) and asks the test's route closure for a [`Reply`].

#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Router;
use futures_util::stream::{self, BoxStream, StreamExt};

pub enum Reply {
    Json {
        status: u16,
        body: String,
    },
    Raw {
        status: u16,
        content_type: String,
        body: String,
    },
    /// SSE events; with `hold` the stream stays open after the last one.
    Sse {
        events: Vec<Event>,
        hold: bool,
    },
    /// Pre-framed `text/event-stream` bytes, one body chunk each.
    Chunks {
        chunks: Vec<String>,
        hold: bool,
    },
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Reply::Json {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Reply::Json {
            status,
            body: body.into(),
        }
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Yields `items` with a short pause between them, then ends or parks.
fn paced<T: Send + 'static>(
    items: Vec<T>,
    hold: bool,
) -> BoxStream<'static, Result<T, Infallible>> {
    let items = stream::iter(items).then(|item| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(item)
    });
    if hold {
        items.chain(stream::pending()).boxed()
    } else {
        items.boxed()
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json { status, body } => (
                status_code(status),
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            Reply::Raw {
                status,
                content_type,
                body,
            } => (
                status_code(status),
                [(header::CONTENT_TYPE, content_type)],
                body,
            )
                .into_response(),
            Reply::Sse { events, hold } => Sse::new(paced(events, hold)).into_response(),
            Reply::Chunks { chunks, hold } => (
                [
                    (header::CONTENT_TYPE, "text/event-stream"),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                Body::from_stream(paced(chunks, hold)),
            )
                .into_response(),
        }
    }
}

type Route = dyn Fn(&str, usize) -> Reply + Send + Sync;

struct ServerState {
    requests: Mutex<Vec<String>>,
    route: Box<Route>,
}

async fn dispatch(State(state): State<Arc<ServerState>>, uri: Uri) -> Reply {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    // nth request for this exact target, 0-based
    let nth = {
        let mut requests = state.requests.lock().unwrap();
        let nth = requests.iter().filter(|r| **r == target).count();
        requests.push(target.clone());
        nth
    };
    (state.route)(&target, nth)
}

pub struct TestServer {
    pub base_url: String,
    state: Arc<ServerState>,
}

impl TestServer {
    /// Request targets (path + query) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }
}

pub async fn serve<F>(route: F) -> TestServer
where
    F: Fn(&str, usize) -> Reply + Send + Sync + 'static,
{
    let state = Arc::new(ServerState {
        requests: Mutex::new(Vec::new()),
        route: Box::new(route),
    });
    let app = Router::new()
        .fallback(dispatch)
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        state,
    }
}

pub fn price_json(symbol: &str, price: f64) -> String {
    format!(
        r#"{{"symbol":"{}","price":{},"change":0.5,"changePercent":0.33,"timestamp":"2024-03-01T09:30:00"}}"#,
        symbol, price
    )
}

pub fn price_event(symbol: &str, price: f64) -> Event {
    Event::default()
        .event("stock-price")
        .data(price_json(symbol, price))
}

pub fn info_event(text: &str) -> Event {
    Event::default().event("info").data(text)
}

/// Poll `check` every 10ms until it holds or `within` elapses.
pub async fn eventually(within: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
