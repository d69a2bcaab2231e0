//! # Shopline - Terminal Product Catalog Browser
//!
//! Search a remote product catalog from the terminal. Results are listed with
//! review stars, feature bullets and prices, and further pages are fetched as
//! the list scrolls to its last row.
//!
//! ## Architecture
//!
//! This application follows the Model-View-ViewModel (MVVM) pattern:
//!
//! ```text
//! ┌─────────────┐    Events    ┌──────────────┐    Fetches   ┌──────────┐
//! │    View     │◄─────────────│  ViewModel   │─────────────▶│ Services │
//! │             │              │              │◄─────────────│          │
//! │ - Terminal  │              │ - Search     │    Pages     │ - Catalog│
//! │ - Rendering │              │   session    │              │ - Images │
//! │ - Input     │              │ - List state │              │          │
//! └─────────────┘              └──────────────┘              └──────────┘
//!                                      ▲
//!                                      │ Commands
//!                                      ▼
//!                               ┌──────────────┐
//!                               │  Controller  │
//!                               │              │
//!                               │ - Input      │
//!                               │   Mapping    │
//!                               │ - Event Loop │
//!                               └──────────────┘
//! ```

pub mod cmd_args;
pub mod config;
pub mod repl;

// Re-export main types for easy access
pub use repl::*;
