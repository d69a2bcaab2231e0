//! # List Commands
//!
//! Selection movement through the product list (j/k, arrows, paging, g/G)
//! and cancelling a running fetch.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{Command, CommandContext, CommandEvent, SelectionMovement};

/// Move the selection by one row (j/k or Down/Up)
pub struct MoveSelectionCommand;

impl MoveSelectionCommand {
    fn movement(event: &KeyEvent) -> Option<SelectionMovement> {
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return None;
        }
        match event.code {
            KeyCode::Char('j') | KeyCode::Down => Some(SelectionMovement::Next),
            KeyCode::Char('k') | KeyCode::Up => Some(SelectionMovement::Previous),
            _ => None,
        }
    }
}

impl Command for MoveSelectionCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        context.in_list() && Self::movement(event).is_some()
    }

    fn execute(&self, event: KeyEvent, _context: &CommandContext) -> Result<Vec<CommandEvent>> {
        Ok(Self::movement(&event)
            .map(CommandEvent::select)
            .into_iter()
            .collect())
    }

    fn name(&self) -> &'static str {
        "MoveSelection"
    }
}

/// Page through the list (PageDown/PageUp, Ctrl+f/Ctrl+b); works from either widget
pub struct PageSelectionCommand;

impl PageSelectionCommand {
    fn movement(context: &CommandContext, event: &KeyEvent) -> Option<SelectionMovement> {
        match event.code {
            KeyCode::PageDown => Some(SelectionMovement::PageDown),
            KeyCode::PageUp => Some(SelectionMovement::PageUp),
            KeyCode::Char('f')
                if context.in_list() && event.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                Some(SelectionMovement::PageDown)
            }
            KeyCode::Char('b')
                if context.in_list() && event.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                Some(SelectionMovement::PageUp)
            }
            _ => None,
        }
    }
}

impl Command for PageSelectionCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        Self::movement(context, event).is_some()
    }

    fn execute(&self, event: KeyEvent, context: &CommandContext) -> Result<Vec<CommandEvent>> {
        Ok(Self::movement(context, &event)
            .map(CommandEvent::select)
            .into_iter()
            .collect())
    }

    fn name(&self) -> &'static str {
        "PageSelection"
    }
}

/// Jump to the first (g, Home) or last (G, End) row
pub struct JumpSelectionCommand;

impl JumpSelectionCommand {
    fn movement(event: &KeyEvent) -> Option<SelectionMovement> {
        match event.code {
            KeyCode::Char('g') | KeyCode::Home => Some(SelectionMovement::First),
            KeyCode::Char('G') | KeyCode::End => Some(SelectionMovement::Last),
            _ => None,
        }
    }
}

impl Command for JumpSelectionCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        context.in_list()
            && !event.modifiers.contains(KeyModifiers::CONTROL)
            && Self::movement(event).is_some()
    }

    fn execute(&self, event: KeyEvent, _context: &CommandContext) -> Result<Vec<CommandEvent>> {
        Ok(Self::movement(&event)
            .map(CommandEvent::select)
            .into_iter()
            .collect())
    }

    fn name(&self) -> &'static str {
        "JumpSelection"
    }
}

/// Cancel the running fetch from the list (Esc)
pub struct CancelFetchCommand;

impl Command for CancelFetchCommand {
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool {
        context.in_list() && context.state.is_loading && event.code == KeyCode::Esc
    }

    fn execute(&self, _event: KeyEvent, _context: &CommandContext) -> Result<Vec<CommandEvent>> {
        Ok(vec![CommandEvent::FetchCancelRequested])
    }

    fn name(&self) -> &'static str {
        "CancelFetch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repl::events::Focus;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn list_context() -> CommandContext {
        let mut context = CommandContext::default();
        context.state.focus = Focus::List;
        context.state.row_count = 20;
        context
    }

    #[test]
    fn j_and_k_should_move_selection_in_list() {
        let cmd = MoveSelectionCommand;
        let context = list_context();

        assert_eq!(
            cmd.execute(key(KeyCode::Char('j')), &context).unwrap(),
            vec![CommandEvent::select(SelectionMovement::Next)]
        );
        assert_eq!(
            cmd.execute(key(KeyCode::Up), &context).unwrap(),
            vec![CommandEvent::select(SelectionMovement::Previous)]
        );
        assert!(!cmd.is_relevant(&CommandContext::default(), &key(KeyCode::Char('j'))));
    }

    #[test]
    fn page_keys_should_work_from_search_too() {
        let cmd = PageSelectionCommand;
        assert!(cmd.is_relevant(&CommandContext::default(), &key(KeyCode::PageDown)));

        let ctrl_f = KeyEvent::new(KeyCode::Char('f'), KeyModifiers::CONTROL);
        assert!(!cmd.is_relevant(&CommandContext::default(), &ctrl_f));
        assert_eq!(
            cmd.execute(ctrl_f, &list_context()).unwrap(),
            vec![CommandEvent::select(SelectionMovement::PageDown)]
        );
    }

    #[test]
    fn g_and_shift_g_should_jump() {
        let cmd = JumpSelectionCommand;
        let context = list_context();
        assert_eq!(
            cmd.execute(key(KeyCode::Char('g')), &context).unwrap(),
            vec![CommandEvent::select(SelectionMovement::First)]
        );
        let shift_g = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert!(cmd.is_relevant(&context, &shift_g));
        assert_eq!(
            cmd.execute(shift_g, &context).unwrap(),
            vec![CommandEvent::select(SelectionMovement::Last)]
        );
    }

    #[test]
    fn escape_should_cancel_only_while_loading() {
        let cmd = CancelFetchCommand;
        let mut context = list_context();
        assert!(!cmd.is_relevant(&context, &key(KeyCode::Esc)));

        context.state.is_loading = true;
        assert!(cmd.is_relevant(&context, &key(KeyCode::Esc)));
    }
}
