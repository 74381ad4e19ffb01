//! HTTP client layer — `StockHttp` with configurable retry policies.

pub mod client;
pub mod retry;

pub use client::StockHttp;
pub use retry::{RetryConfig, RetryPolicy};
