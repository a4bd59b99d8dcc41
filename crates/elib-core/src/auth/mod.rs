//! Authentication: where the token lives, who is logged in, and the
//! login/logout/register actions.
//!
//! The token store is the only place the credential is kept. Everything
//! else (the HTTP pipeline, the session) reads it from there.

pub mod flow;
pub mod session;
pub mod token_store;

pub use flow::AuthFlow;
pub use session::{SessionContext, SessionPhase, SessionSnapshot};
pub use token_store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};
