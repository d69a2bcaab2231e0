//! # Core Event Types
//!
//! Common types shared by model and view events.

/// Which widget receives typed keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Focus {
    /// The search bar at the top of the screen
    #[default]
    Search,
    /// The product list
    List,
}

impl Focus {
    pub fn toggled(self) -> Self {
        match self {
            Focus::Search => Focus::List,
            Focus::List => Focus::Search,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_should_start_on_search_and_toggle() {
        let focus = Focus::default();
        assert_eq!(focus, Focus::Search);
        assert_eq!(focus.toggled(), Focus::List);
        assert_eq!(focus.toggled().toggled(), Focus::Search);
    }
}
