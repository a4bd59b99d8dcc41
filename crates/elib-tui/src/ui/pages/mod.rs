//! Page content, one module per route. Home and Books share the book list.

pub mod books;
pub mod chat;
pub mod landing;
pub mod login;
pub mod profile;
pub mod signup;
