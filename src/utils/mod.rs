//! # Shared Utilities
//!
//! - [`retry`] - linear-backoff retry policy shared by every HTTP adapter
//! - [`graph`] - append-only directed dependency graph
//! - [`chunk`] - fixed-size batching for the advisory aggregator
//! - [`dates`] - tolerant ISO-8601 parsing for release timestamps

pub mod chunk;
pub mod dates;
pub mod graph;
pub mod retry;

pub use chunk::chunked;
pub use graph::Graph;
pub use retry::{retry_with_backoff, RetryError};
