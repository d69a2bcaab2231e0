//! # Command Context
//!
//! Read-only view of the screen state handed to commands, so relevance checks
//! never need mutable access to the view model.

use crate::repl::events::Focus;
use crate::repl::services::CatalogClient;
use crate::repl::view_models::ScreenViewModel;

/// Read-only snapshot of ScreenViewModel state for commands
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModelSnapshot {
    pub focus: Focus,
    pub search_text: String,
    pub has_modal: bool,
    pub is_loading: bool,
    pub row_count: usize,
    pub selected: usize,
    pub terminal_dimensions: (u16, u16),
}

impl ViewModelSnapshot {
    /// Create snapshot from current ScreenViewModel state
    pub fn from_view_model<C: CatalogClient>(view_model: &ScreenViewModel<C>) -> Self {
        Self {
            focus: view_model.focus(),
            search_text: view_model.search_bar().text().to_string(),
            has_modal: view_model.modal().is_some(),
            is_loading: view_model.products().state().is_loading(),
            row_count: view_model.row_count(),
            selected: view_model.selected(),
            terminal_dimensions: view_model.terminal_size(),
        }
    }
}

impl Default for ViewModelSnapshot {
    fn default() -> Self {
        Self {
            focus: Focus::Search,
            search_text: String::new(),
            has_modal: false,
            is_loading: false,
            row_count: 0,
            selected: 0,
            terminal_dimensions: (80, 24),
        }
    }
}

/// Base context available to all commands
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub state: ViewModelSnapshot,
}

impl CommandContext {
    pub fn new(state: ViewModelSnapshot) -> Self {
        Self { state }
    }

    pub fn in_search(&self) -> bool {
        self.state.focus == Focus::Search
    }

    pub fn in_list(&self) -> bool {
        self.state.focus == Focus::List
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repl::testing::ScriptedCatalogClient;
    use crate::repl::view_models::{GlyphSet, ProductsViewModel};

    #[test]
    fn view_model_snapshot_should_capture_state() {
        let products = ProductsViewModel::new(ScriptedCatalogClient::new(), GlyphSet::default());
        let mut view_model = ScreenViewModel::new(products, None);
        view_model.insert_char('t');
        view_model.update_terminal_size(100, 30);

        let snapshot = ViewModelSnapshot::from_view_model(&view_model);
        assert_eq!(snapshot.focus, Focus::Search);
        assert_eq!(snapshot.search_text, "t");
        assert!(!snapshot.has_modal);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.row_count, 0);
        assert_eq!(snapshot.terminal_dimensions, (100, 30));
    }

    #[test]
    fn command_context_should_report_focus() {
        let mut context = CommandContext::default();
        assert!(context.in_search());
        context.state.focus = Focus::List;
        assert!(context.in_list());
        assert!(!context.in_search());
    }
}
