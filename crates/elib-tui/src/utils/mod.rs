//! Utility functions for string formatting.

pub mod format;

pub use format::{format_timestamp, page_label, truncate};
