//! # Search Bar Commands
//!
//! Typing, editing and submitting the query, plus moving focus between the
//! search bar and the list.

use crate::repl::events::Focus;
use crate::repl::view_models::CursorMovement;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{Command, CommandContext, CommandEvent};

/// Focus the search bar from the list (/)
pub struct FocusSearchCommand;

impl Command for FocusSearchCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        context.in_list() && event.code == KeyCode::Char('/') && event.modifiers.is_empty()
    }

    fn execute(&self, _event: KeyEvent, _context: &CommandContext) -> Result<Vec<CommandEvent>> {
        Ok(vec![CommandEvent::focus(Focus::Search)])
    }

    fn name(&self) -> &'static str {
        "FocusSearch"
    }
}

/// Leave the search bar for the list (Esc)
pub struct LeaveSearchCommand;

impl Command for LeaveSearchCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        context.in_search() && event.code == KeyCode::Esc
    }

    fn execute(&self, _event: KeyEvent, _context: &CommandContext) -> Result<Vec<CommandEvent>> {
        Ok(vec![CommandEvent::focus(Focus::List)])
    }

    fn name(&self) -> &'static str {
        "LeaveSearch"
    }
}

/// Toggle focus between search bar and list (Tab)
pub struct ToggleFocusCommand;

impl Command for ToggleFocusCommand {
    fn is_relevant(&self, _context: &CommandContext, event: &KeyEvent) -> bool {
        matches!(event.code, KeyCode::Tab | KeyCode::BackTab)
    }

    fn execute(&self, _event: KeyEvent, _context: &CommandContext) -> Result<Vec<CommandEvent>> {
        Ok(vec![CommandEvent::FocusToggleRequested])
    }

    fn name(&self) -> &'static str {
        "ToggleFocus"
    }
}

/// Submit the typed query (Enter)
pub struct SubmitSearchCommand;

impl Command for SubmitSearchCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        context.in_search() && event.code == KeyCode::Enter
    }

    fn execute(&self, _event: KeyEvent, context: &CommandContext) -> Result<Vec<CommandEvent>> {
        if context.state.search_text.trim().is_empty() {
            tracing::debug!("Ignoring empty search");
            return Ok(vec![CommandEvent::NoAction]);
        }
        Ok(vec![CommandEvent::SearchSubmitRequested])
    }

    fn name(&self) -> &'static str {
        "SubmitSearch"
    }
}

/// Type a character into the search bar
pub struct InsertCharCommand;

impl Command for InsertCharCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        if !context.in_search() {
            return false;
        }
        match event.code {
            KeyCode::Char(ch) => {
                !ch.is_control()
                    && !event.modifiers.contains(KeyModifiers::CONTROL)
                    && !event.modifiers.contains(KeyModifiers::ALT)
            }
            _ => false,
        }
    }

    fn execute(&self, event: KeyEvent, _context: &CommandContext) -> Result<Vec<CommandEvent>> {
        match event.code {
            KeyCode::Char(ch) => Ok(vec![CommandEvent::SearchCharRequested { ch }]),
            _ => Ok(vec![CommandEvent::NoAction]),
        }
    }

    fn name(&self) -> &'static str {
        "InsertChar"
    }
}

/// Delete before (Backspace) or under (Delete) the search cursor
pub struct DeleteCharCommand;

impl Command for DeleteCharCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        context.in_search() && matches!(event.code, KeyCode::Backspace | KeyCode::Delete)
    }

    fn execute(&self, event: KeyEvent, _context: &CommandContext) -> Result<Vec<CommandEvent>> {
        match event.code {
            KeyCode::Backspace => Ok(vec![CommandEvent::SearchBackspaceRequested]),
            _ => Ok(vec![CommandEvent::SearchDeleteRequested]),
        }
    }

    fn name(&self) -> &'static str {
        "DeleteChar"
    }
}

/// Clear the whole query (Ctrl+U)
pub struct ClearSearchCommand;

impl Command for ClearSearchCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        context.in_search()
            && event.code == KeyCode::Char('u')
            && event.modifiers.contains(KeyModifiers::CONTROL)
    }

    fn execute(&self, _event: KeyEvent, _context: &CommandContext) -> Result<Vec<CommandEvent>> {
        Ok(vec![CommandEvent::SearchClearRequested])
    }

    fn name(&self) -> &'static str {
        "ClearSearch"
    }
}

/// Move the search cursor (Left, Right, Home, End)
pub struct MoveSearchCursorCommand;

impl MoveSearchCursorCommand {
    fn movement(event: &KeyEvent) -> Option<CursorMovement> {
        match event.code {
            KeyCode::Left => Some(CursorMovement::Left),
            KeyCode::Right => Some(CursorMovement::Right),
            KeyCode::Home => Some(CursorMovement::Home),
            KeyCode::End => Some(CursorMovement::End),
            _ => None,
        }
    }
}

impl Command for MoveSearchCursorCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        context.in_search() && Self::movement(event).is_some()
    }

    fn execute(&self, event: KeyEvent, _context: &CommandContext) -> Result<Vec<CommandEvent>> {
        Ok(Self::movement(&event)
            .map(CommandEvent::search_cursor)
            .into_iter()
            .collect())
    }

    fn name(&self) -> &'static str {
        "MoveSearchCursor"
    }
}
