//! # MVVM Architecture Implementation
//!
//! Product search screen built from models, view models, views and a
//! controller, with catalog and image fetching isolated in services.

pub mod commands;
pub mod controllers;
pub mod events;
pub mod io;
pub mod models;
pub mod services;
pub mod testing;
pub mod view_models;
pub mod views;

// Re-export core types
pub use controllers::AppController;
pub use events::{Focus, ModelEvent, ViewEvent};
pub use view_models::{ProductItemViewModel, ProductsState, ProductsViewModel, ScreenViewModel};
pub use views::{TerminalRenderer, ViewRenderer};

// Re-export specific items from commands to avoid conflicts
pub use commands::{Command, CommandContext, CommandEvent, CommandRegistry, ViewModelSnapshot};

pub use models::{Product, ProductsPage};
pub use services::{CatalogClient, FetchError, HttpCatalogClient, ImageCache};
