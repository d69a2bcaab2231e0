//! # Models Module
//!
//! Plain data owned by the view models: catalog records, the search input
//! and the status bar state.

pub mod product;
pub mod search_bar;
pub mod status_line;

pub use product::{Product, ProductsPage, ReviewInformation, ReviewSummary};
pub use search_bar::{SearchBar, SEARCH_PLACEHOLDER};
pub use status_line::{FetchSummary, StatusLine};
