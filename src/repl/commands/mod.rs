//! # Command Pattern Infrastructure
//!
//! Key events are matched against registered commands; the first relevant
//! command turns the key into `CommandEvent`s which the controller applies to
//! the screen view model.

use anyhow::Result;
use crossterm::event::KeyEvent;

pub mod app;
pub mod context;
pub mod events;
pub mod list;
pub mod search;

pub use app::{AppTerminateCommand, DismissModalCommand, QuitCommand};
pub use context::{CommandContext, ViewModelSnapshot};
pub use events::{CommandEvent, SelectionMovement};
pub use list::{
    CancelFetchCommand, JumpSelectionCommand, MoveSelectionCommand, PageSelectionCommand,
};
pub use search::{
    ClearSearchCommand, DeleteCharCommand, FocusSearchCommand, InsertCharCommand,
    LeaveSearchCommand, MoveSearchCursorCommand, SubmitSearchCommand, ToggleFocusCommand,
};

/// A key binding with its behaviour
pub trait Command: Send + Sync {
    /// Check if this command should handle the given key event
    ///
    /// Only one registered command should return true for any given input;
    /// registration order breaks ties.
    fn is_relevant(&self, context: &CommandContext, event: &KeyEvent) -> bool;

    /// Turn the key event into the changes it requests
    fn execute(&self, event: KeyEvent, context: &CommandContext) -> Result<Vec<CommandEvent>>;

    /// Get command name for debugging and logging
    fn name(&self) -> &'static str;
}

/// Registry that processes key events through commands
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
}

impl CommandRegistry {
    /// Create a new registry with default commands
    pub fn new() -> Self {
        let mut registry = Self {
            commands: Vec::new(),
        };
        registry.register_default_commands();
        registry
    }

    fn register_default_commands(&mut self) {
        // Ctrl+C always wins, then the modal swallows everything else
        self.add_command(Box::new(AppTerminateCommand));
        self.add_command(Box::new(DismissModalCommand));

        self.add_command(Box::new(ToggleFocusCommand));
        self.add_command(Box::new(SubmitSearchCommand));
        self.add_command(Box::new(LeaveSearchCommand));
        self.add_command(Box::new(ClearSearchCommand));
        self.add_command(Box::new(InsertCharCommand));
        self.add_command(Box::new(DeleteCharCommand));
        self.add_command(Box::new(MoveSearchCursorCommand));

        self.add_command(Box::new(QuitCommand));
        self.add_command(Box::new(FocusSearchCommand));
        self.add_command(Box::new(CancelFetchCommand));
        self.add_command(Box::new(MoveSelectionCommand));
        self.add_command(Box::new(PageSelectionCommand));
        self.add_command(Box::new(JumpSelectionCommand));
    }

    pub fn add_command(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    /// Run the first relevant command; unbound keys yield no events
    pub fn process_event(
        &self,
        event: KeyEvent,
        context: &CommandContext,
    ) -> Result<Vec<CommandEvent>> {
        match self
            .commands
            .iter()
            .find(|command| command.is_relevant(context, &event))
        {
            Some(command) => {
                tracing::debug!(
                    "Found relevant command: {} for key {:?} with focus {:?}",
                    command.name(),
                    event,
                    context.state.focus
                );
                command.execute(event, context)
            }
            None => {
                tracing::debug!("No relevant command found for key {:?}", event);
                Ok(Vec::new())
            }
        }
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
