//! # Mock I/O Implementations for Testing
//!
//! Provides mock implementations of EventStream and RenderStream traits
//! for testing without terminal dependencies. The render stream interprets
//! the escape sequences it receives into a virtual screen grid so tests can
//! assert on what a user would actually see.

use super::{EventStream, RenderStream, TerminalSize};
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use unicode_width::UnicodeWidthChar;

/// Mock event stream for testing
///
/// Provides pre-programmed events that can be consumed by tests. `poll`
/// reports readiness only while events remain.
#[derive(Debug, Default)]
pub struct MockEventStream {
    events: VecDeque<Event>,
}

impl MockEventStream {
    /// Create a new mock event stream with pre-programmed events
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Create an empty mock event stream
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add an event to the stream
    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn push_key(&mut self, code: KeyCode) {
        self.push_event(key(code));
    }

    /// Queue one key press per character of `text`
    pub fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.push_key(KeyCode::Char(ch));
        }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventStream for MockEventStream {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(!self.events.is_empty())
    }

    fn read(&mut self) -> Result<Event> {
        self.events
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("No events available"))
    }
}

/// Key press event without modifiers
pub fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

/// Key press event with Control held
pub fn ctrl(ch: char) -> Event {
    Event::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
}

/// Recorded render command for verification
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    ClearScreen,
    MoveCursor(u16, u16),
    HideCursor,
    ShowCursor,
    EnterAlternateScreen,
    LeaveAlternateScreen,
    EnableRawMode,
    DisableRawMode,
    Flush,
}

/// Character grid mirroring what a terminal would display
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualScreen {
    width: u16,
    height: u16,
    // `None` marks the trailing half of a wide character
    cells: Vec<Vec<Option<char>>>,
    cursor: (u16, u16),
    cursor_visible: bool,
}

impl VirtualScreen {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![Some(' '); width as usize]; height as usize],
            cursor: (0, 0),
            cursor_visible: true,
        }
    }

    pub fn size(&self) -> TerminalSize {
        (self.width, self.height)
    }

    /// Cursor position as (column, row)
    pub fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Text of row `y` with trailing blanks removed
    pub fn row_text(&self, y: u16) -> String {
        self.cells
            .get(y as usize)
            .map(|row| row.iter().flatten().collect::<String>())
            .unwrap_or_default()
            .trim_end()
            .to_string()
    }

    /// All rows joined by newlines
    pub fn text(&self) -> String {
        (0..self.height)
            .map(|y| self.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        (0..self.height).any(|y| self.row_text(y).contains(needle))
    }

    /// First row containing `needle`
    pub fn find_row(&self, needle: &str) -> Option<u16> {
        (0..self.height).find(|&y| self.row_text(y).contains(needle))
    }

    fn resize(&mut self, width: u16, height: u16) {
        *self = Self::new(width, height);
    }

    fn clear_all(&mut self) {
        for row in &mut self.cells {
            row.fill(Some(' '));
        }
    }

    fn clear_row(&mut self, y: u16) {
        if let Some(row) = self.cells.get_mut(y as usize) {
            row.fill(Some(' '));
        }
    }

    fn move_to(&mut self, x: u16, y: u16) {
        self.cursor = (
            x.min(self.width.saturating_sub(1)),
            y.min(self.height.saturating_sub(1)),
        );
    }

    fn put_char(&mut self, ch: char) {
        match ch {
            '\r' => self.cursor.0 = 0,
            '\n' => self.cursor.1 = (self.cursor.1 + 1).min(self.height.saturating_sub(1)),
            ch if ch.is_control() => {}
            ch => {
                let ch_width = ch.width().unwrap_or(0) as u16;
                let (x, y) = self.cursor;
                if ch_width == 0 || x + ch_width > self.width {
                    return;
                }
                if let Some(row) = self.cells.get_mut(y as usize) {
                    row[x as usize] = Some(ch);
                    if ch_width == 2 {
                        row[x as usize + 1] = None;
                    }
                }
                self.cursor.0 = x + ch_width;
            }
        }
    }

    /// Apply a CSI sequence given its parameter bytes and final byte
    fn apply_csi(&mut self, params: &str, action: char) {
        match action {
            'H' | 'f' => {
                let mut parts = params.split(';').map(|p| p.parse::<u16>().unwrap_or(1));
                let row = parts.next().unwrap_or(1).max(1);
                let column = parts.next().unwrap_or(1).max(1);
                self.move_to(column - 1, row - 1);
            }
            'J' if params == "2" => self.clear_all(),
            'K' if params == "2" => self.clear_row(self.cursor.1),
            'h' if params == "?25" => self.cursor_visible = true,
            'l' if params == "?25" => self.cursor_visible = false,
            _ => {}
        }
    }
}

#[derive(Debug)]
struct MockTerminal {
    screen: VirtualScreen,
    pending: Vec<u8>,
    commands: Vec<RenderCommand>,
    raw_mode: bool,
    alternate_screen: bool,
}

impl MockTerminal {
    fn feed(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        let mut consumed = 0;
        while consumed < self.pending.len() {
            match parse_next(&self.pending[consumed..]) {
                Parsed::Incomplete => break,
                Parsed::Skip(len) => consumed += len,
                Parsed::Char(ch, len) => {
                    self.screen.put_char(ch);
                    consumed += len;
                }
                Parsed::Csi(params, action, len) => {
                    self.screen.apply_csi(&params, action);
                    consumed += len;
                }
            }
        }
        self.pending.drain(..consumed);
    }
}

enum Parsed {
    Incomplete,
    Skip(usize),
    Char(char, usize),
    Csi(String, char, usize),
}

const ESC: u8 = 0x1b;

fn parse_next(bytes: &[u8]) -> Parsed {
    match bytes {
        [] => Parsed::Incomplete,
        [ESC] => Parsed::Incomplete,
        [ESC, b'[', rest @ ..] => match rest.iter().position(|b| (0x40..=0x7e).contains(b)) {
            Some(end) => {
                let params = String::from_utf8_lossy(&rest[..end]).into_owned();
                Parsed::Csi(params, rest[end] as char, end + 3)
            }
            None => Parsed::Incomplete,
        },
        [ESC, _, ..] => Parsed::Skip(2),
        [first, ..] => {
            let len = match first {
                0x00..=0x7f => 1,
                0xc0..=0xdf => 2,
                0xe0..=0xef => 3,
                0xf0..=0xf7 => 4,
                _ => return Parsed::Skip(1),
            };
            if bytes.len() < len {
                return Parsed::Incomplete;
            }
            match std::str::from_utf8(&bytes[..len])
                .ok()
                .and_then(|s| s.chars().next())
            {
                Some(ch) => Parsed::Char(ch, len),
                None => Parsed::Skip(1),
            }
        }
    }
}

/// Shared view of a `MockRenderStream`'s terminal, usable after the stream
/// has been moved into a renderer
#[derive(Debug, Clone)]
pub struct MockScreenHandle {
    terminal: Arc<Mutex<MockTerminal>>,
}

impl MockScreenHandle {
    fn lock(&self) -> MutexGuard<'_, MockTerminal> {
        // A panic while holding the lock leaves the grid usable for assertions
        self.terminal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current screen contents
    pub fn snapshot(&self) -> VirtualScreen {
        self.lock().screen.clone()
    }

    /// Recorded non-text render commands
    pub fn commands(&self) -> Vec<RenderCommand> {
        self.lock().commands.clone()
    }

    pub fn has_command(&self, command: &RenderCommand) -> bool {
        self.lock().commands.contains(command)
    }

    pub fn clear_commands(&self) {
        self.lock().commands.clear();
    }

    pub fn is_raw_mode(&self) -> bool {
        self.lock().raw_mode
    }

    pub fn is_alternate_screen(&self) -> bool {
        self.lock().alternate_screen
    }
}

/// Mock render stream for testing
///
/// Interprets written output into a `VirtualScreen` and records terminal
/// mode changes for verification.
#[derive(Debug, Clone)]
pub struct MockRenderStream {
    handle: MockScreenHandle,
}

impl MockRenderStream {
    /// Create a new mock render stream
    pub fn new() -> Self {
        Self::with_size((80, 24))
    }

    /// Create a mock render stream with specific terminal size
    pub fn with_size(size: TerminalSize) -> Self {
        let terminal = MockTerminal {
            screen: VirtualScreen::new(size.0, size.1),
            pending: Vec::new(),
            commands: Vec::new(),
            raw_mode: false,
            alternate_screen: false,
        };
        Self {
            handle: MockScreenHandle {
                terminal: Arc::new(Mutex::new(terminal)),
            },
        }
    }

    /// Handle to inspect the screen after the stream has been handed off
    pub fn screen(&self) -> MockScreenHandle {
        self.handle.clone()
    }

    /// Simulate a terminal resize; the grid is cleared
    pub fn resize(&self, width: u16, height: u16) {
        self.handle.lock().screen.resize(width, height);
    }

    fn record(&self, command: RenderCommand) {
        self.handle.lock().commands.push(command);
    }
}

impl Default for MockRenderStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MockRenderStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.handle.lock().feed(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.record(RenderCommand::Flush);
        Ok(())
    }
}

impl RenderStream for MockRenderStream {
    fn clear_screen(&mut self) -> Result<()> {
        self.record(RenderCommand::ClearScreen);
        self.handle.lock().screen.clear_all();
        Ok(())
    }

    fn move_cursor(&mut self, x: u16, y: u16) -> Result<()> {
        self.record(RenderCommand::MoveCursor(x, y));
        self.handle.lock().screen.move_to(x, y);
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<()> {
        self.record(RenderCommand::HideCursor);
        self.handle.lock().screen.cursor_visible = false;
        Ok(())
    }

    fn show_cursor(&mut self) -> Result<()> {
        self.record(RenderCommand::ShowCursor);
        self.handle.lock().screen.cursor_visible = true;
        Ok(())
    }

    fn get_size(&self) -> Result<TerminalSize> {
        Ok(self.handle.lock().screen.size())
    }

    fn enter_alternate_screen(&mut self) -> Result<()> {
        self.record(RenderCommand::EnterAlternateScreen);
        self.handle.lock().alternate_screen = true;
        Ok(())
    }

    fn leave_alternate_screen(&mut self) -> Result<()> {
        self.record(RenderCommand::LeaveAlternateScreen);
        self.handle.lock().alternate_screen = false;
        Ok(())
    }

    fn enable_raw_mode(&mut self) -> Result<()> {
        self.record(RenderCommand::EnableRawMode);
        self.handle.lock().raw_mode = true;
        Ok(())
    }

    fn disable_raw_mode(&mut self) -> Result<()> {
        self.record(RenderCommand::DisableRawMode);
        self.handle.lock().raw_mode = false;
        Ok(())
    }
}
