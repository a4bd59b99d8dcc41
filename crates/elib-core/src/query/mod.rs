//! Client-side query cache.
//!
//! Reads are keyed by [`QueryKey`] and cached with a staleness window.
//! Concurrent reads of one key share a request, failed reads get a small
//! retry budget, and writes mark the keys they affect as stale. See
//! [`crate::queries`] for the keys and hooks the app actually uses.

pub mod client;
pub mod key;
pub mod state;

pub use client::{QueryClient, DEFAULT_GC_TIME};
pub use key::QueryKey;
pub use state::{QueryOptions, QueryState, DEFAULT_RETRY, DEFAULT_RETRY_DELAY};
