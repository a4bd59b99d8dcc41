//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout, bars and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color scheme and text styling
//! - `pages`: Per-route page content

pub mod input;
pub mod pages;
pub mod render;
pub mod styles;
