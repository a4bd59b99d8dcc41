//! Core of the Elib client.
//!
//! - [`api`]: HTTP pipeline around a pluggable [`api::Transport`] and typed
//!   wrappers for each backend resource
//! - [`auth`]: token storage, the session state machine and auth actions
//! - [`query`]: keyed read cache with staleness, de-duplication and retry
//! - [`queries`]: the keys and cached reads/writes the app uses
//! - [`nav`]: routes and the redirect sink used on expired credentials
//!
//! [`ElibClient`] wires all of it together for a front end.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod nav;
pub mod queries;
pub mod query;

#[cfg(test)]
mod testing;

pub use api::ApiError;
pub use client::ElibClient;
pub use config::{Config, TokenStorageKind};
pub use nav::{Navigator, Route, RouteState};
pub use query::{QueryClient, QueryKey, QueryOptions, QueryState};
