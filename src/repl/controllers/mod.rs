//! # Controllers Module
//!
//! The application controller: event loop, key dispatch and selective repaint.

pub mod app_controller;

// Re-export main types for convenience
pub use app_controller::AppController;
