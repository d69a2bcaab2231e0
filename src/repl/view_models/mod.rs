//! # ViewModel Module
//!
//! View models split by responsibility: one per product row, the paginated
//! search session, and the screen that binds them to the terminal layout.

pub mod list_screen;
pub mod product_item;
pub mod products;

pub use list_screen::{CursorMovement, ImageStatus, ScreenViewModel, DETAIL_PANE_HEIGHT};
pub use product_item::{Glyph, GlyphSet, ProductItemViewModel, RichText, Span, SpanStyle};
pub use products::{ProductsState, ProductsViewModel};
