//! # Command Events
//!
//! Events produced by commands that describe what should happen.
//! Commands produce these events, and the controller applies them to the
//! screen view model. Commands suggest, the controller decides.

use crate::repl::events::Focus;
use crate::repl::view_models::CursorMovement;

/// Events that commands can produce to request changes
#[derive(Debug, Clone, PartialEq)]
pub enum CommandEvent {
    /// Request focus on a specific widget
    FocusRequested { focus: Focus },

    /// Request focus to move to the other widget
    FocusToggleRequested,

    /// Request a character typed into the search bar
    SearchCharRequested { ch: char },

    /// Request removal of the character before the search cursor
    SearchBackspaceRequested,

    /// Request removal of the character under the search cursor
    SearchDeleteRequested,

    /// Request search cursor movement
    SearchCursorRequested { movement: CursorMovement },

    /// Request the search text to be cleared
    SearchClearRequested,

    /// Request a search for the typed query
    SearchSubmitRequested,

    /// Request list selection movement
    SelectionMoveRequested { movement: SelectionMovement },

    /// Request the in-flight fetch to be cancelled
    FetchCancelRequested,

    /// Request the error modal to close
    ModalDismissRequested,

    /// Request to quit application
    QuitRequested,

    /// No action needed (for commands that only query state)
    NoAction,
}

/// How the list selection should move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMovement {
    Next,
    Previous,
    /// One screen of rows down
    PageDown,
    /// One screen of rows up
    PageUp,
    First,
    Last,
}

impl CommandEvent {
    /// Create a selection move event
    pub fn select(movement: SelectionMovement) -> Self {
        Self::SelectionMoveRequested { movement }
    }

    /// Create a focus change event
    pub fn focus(focus: Focus) -> Self {
        Self::FocusRequested { focus }
    }

    /// Create a search cursor move event
    pub fn search_cursor(movement: CursorMovement) -> Self {
        Self::SearchCursorRequested { movement }
    }
}
