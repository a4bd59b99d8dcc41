//! Data models for Elib entities.
//!
//! These mirror the JSON bodies the backend sends and accepts:
//!
//! - `UserProfile`, `NewUser`, `UserUpdate`: accounts
//! - `Book`, `BookUpdate`: catalog entries
//! - `TokenResponse`, `LoginResult`: token issuance
//! - Chat types: `ChatSession`, `ChatMessage`, `ChatResponse`, etc.

pub mod auth;
pub mod book;
pub mod chat;
pub mod user;

pub use auth::{LoginResult, TokenResponse};
pub use book::{Book, BookUpdate};
pub use chat::{
    ChatMessage, ChatMessageRequest, ChatResponse, ChatSession, DocumentUploadResponse,
    MessageRole,
};
pub use user::{NewUser, UserProfile, UserUpdate};
