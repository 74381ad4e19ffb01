//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs` — Domain types (serde-ready, matching backend JSON)
//! - `state.rs` — State containers with update methods (for stream-driven data)
//! - `client.rs` — Sub-client with HTTP methods and caching

pub mod archive;
pub mod health;
pub mod price;
