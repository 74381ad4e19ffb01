//! Stream transports.
//!
//! A [`Transport`] opens one connection and yields decoded SSE frames until
//! the connection breaks. It knows nothing about retries; `StreamClient`
//! layers the reconnect policy on top.

use crate::error::StreamError;
use crate::stream::sse::{SseDecoder, SseFrame};

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

/// Frames from one open connection. Ends (or yields `Err`) when it breaks.
pub type FrameStream = BoxStream<'static, Result<SseFrame, StreamError>>;

pub trait Transport: Send + Sync + 'static {
    /// Open a connection to `url`. Resolves once the server accepted it.
    fn open(&self, url: &str) -> BoxFuture<'static, Result<FrameStream, StreamError>>;
}

// ─── SSE over HTTP ───────────────────────────────────────────────────────────

/// `text/event-stream` over a long-lived `reqwest` GET.
#[derive(Clone)]
pub struct SseTransport {
    client: Client,
}

impl SseTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        // No overall request timeout: the response body never completes.
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    /// Reuse an existing `reqwest::Client`. It must not carry a request timeout.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for SseTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl Transport for SseTransport {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<FrameStream, StreamError>> {
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");

        async move {
            let resp = request
                .send()
                .await
                .map_err(|e| StreamError::ConnectionFailed(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(StreamError::UnexpectedStatus(status.as_u16()));
            }

            if let Some(content_type) = resp.headers().get(CONTENT_TYPE) {
                let content_type = content_type.to_str().unwrap_or_default();
                if !content_type.starts_with("text/event-stream") {
                    return Err(StreamError::UnexpectedContentType(content_type.to_string()));
                }
            }

            Ok(decode_frames(resp.bytes_stream()))
        }
        .boxed()
    }
}

/// Turn a body byte stream into SSE frames.
fn decode_frames<S, B, E>(bytes: S) -> FrameStream
where
    S: futures_util::Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + 'static,
    E: std::fmt::Display + 'static,
{
    bytes
        .scan(SseDecoder::new(), |decoder, chunk| {
            let items: Vec<Result<SseFrame, StreamError>> = match chunk {
                Ok(bytes) => decoder.feed(bytes.as_ref()).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(StreamError::Transport(e.to_string()))],
            };
            futures_util::future::ready(Some(futures_util::stream::iter(items)))
        })
        .flatten()
        .boxed()
}
