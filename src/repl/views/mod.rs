//! # Views Module
//!
//! Terminal rendering of the product search screen.

pub mod terminal_renderer;

// Re-export main types for convenience
pub use terminal_renderer::{TerminalRenderer, ViewRenderer};
