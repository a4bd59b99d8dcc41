//! Query keys and cached reads/writes for each backend resource.
//!
//! Keys nest so whole families can be invalidated at once:
//!
//! - `["auth", "currentUser"]`
//! - `["books", "list", "skip=..", "limit=..", ("q=..")]`, `["books", "detail", isbn]`
//! - `["user", "profile"]`, `["user", "list"]`
//! - `["chat", "sessions"]`, `["chat", "sessions", id]`

pub mod auth;
pub mod books;
pub mod chat;
pub mod users;

pub use auth::{auth_keys, AuthQueries, CURRENT_USER_STALE_TIME};
pub use books::{book_keys, is_searchable, BookQueries, SEARCH_MIN_LEN, SEARCH_STALE_TIME};
pub use chat::{chat_keys, ChatQueries};
pub use users::{user_keys, UserQueries, PROFILE_STALE_TIME, USER_LIST_STALE_TIME};
