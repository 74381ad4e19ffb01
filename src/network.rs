//! Network URL constants for the stock service.

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8082";

/// Path of the all-symbols SSE price stream, relative to the API base URL.
pub const STREAM_PATH: &str = "/api/stream/stocks";

/// Build the SSE stream URL for a base URL.
pub fn stream_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), STREAM_PATH)
}
