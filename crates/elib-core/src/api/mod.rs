//! REST API access for the Elib backend.
//!
//! All calls go through [`HttpClient`], which attaches the stored bearer
//! token and handles expired credentials. The resource modules on top of it
//! are thin typed wrappers: build a path and payload, send, parse.

pub mod auth;
pub mod books;
pub mod chat;
pub mod error;
pub mod http;
pub mod users;

pub use auth::AuthApi;
pub use books::BooksApi;
pub use chat::ChatApi;
pub use error::ApiError;
pub use http::{
    ApiRequest, ApiResponse, HttpClient, RequestBody, ReqwestTransport, Transport,
    DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS,
};
pub use users::UsersApi;
