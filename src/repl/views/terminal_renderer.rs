//! # View Layer
//!
//! Draws the screen view model onto a `RenderStream`: search bar, product
//! rows, the detail pane, the status bar and the error modal.

use crate::repl::events::Focus;
use crate::repl::io::RenderStream;
use crate::repl::models::SEARCH_PLACEHOLDER;
use crate::repl::services::CatalogClient;
use crate::repl::view_models::{ProductsState, ScreenViewModel, Span, SpanStyle, DETAIL_PANE_HEIGHT};
use anyhow::Result;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::Write;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

// Helper macro to convert crossterm errors to anyhow errors
macro_rules! execute_term {
    ($($arg:expr),* $(,)?) => {
        execute!($($arg),*).map_err(anyhow::Error::from)
    };
}

/// Text in front of the query
const SEARCH_PROMPT: &str = "Search: ";

/// Marker in front of the selected row
const SELECTED_MARKER: &str = "> ";

/// Trait for rendering views
pub trait ViewRenderer {
    /// Prepare the terminal for drawing
    fn initialize(&mut self) -> Result<()>;

    /// Render the full application state
    fn render_full<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>) -> Result<()>;

    fn render_search_bar<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>)
        -> Result<()>;

    fn render_list<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>) -> Result<()>;

    /// Render the selected product's details
    fn render_detail<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>) -> Result<()>;

    fn render_status_bar<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>)
        -> Result<()>;

    /// Render the error modal, if one is open
    fn render_modal<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>) -> Result<()>;

    /// Place (or hide) the cursor
    fn render_cursor<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>) -> Result<()>;

    /// Restore the terminal on exit
    fn cleanup(&mut self) -> Result<()>;
}

/// Renderer writing crossterm commands to a `RenderStream`
pub struct TerminalRenderer<RS: RenderStream> {
    render_stream: RS,
    terminal_size: (u16, u16),
}

impl<RS: RenderStream> TerminalRenderer<RS> {
    /// Create a renderer that owns `render_stream`
    pub fn with_render_stream(render_stream: RS) -> Result<Self> {
        let terminal_size = render_stream.get_size()?;
        Ok(Self {
            render_stream,
            terminal_size,
        })
    }

    pub fn update_size(&mut self, width: u16, height: u16) {
        self.terminal_size = (width, height);
    }

    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    pub fn render_stream(&self) -> &RS {
        &self.render_stream
    }

    pub fn flush(&mut self) -> Result<()> {
        self.render_stream.flush().map_err(anyhow::Error::from)
    }

    fn width(&self) -> usize {
        self.terminal_size.0 as usize
    }

    /// Clear a row and leave the cursor at its start
    fn clear_row(&mut self, row: u16) -> Result<()> {
        execute_term!(
            self.render_stream,
            MoveTo(0, row),
            Clear(ClearType::CurrentLine)
        )
    }

    /// Print styled spans, cut off after `max_width` columns; returns columns used
    fn print_spans(&mut self, spans: &[Span], max_width: usize) -> Result<usize> {
        let mut used = 0;
        for span in spans {
            if used >= max_width {
                break;
            }
            let text = truncate_to_width(&span.text, max_width - used);
            used += text.width();
            match span.style {
                SpanStyle::Plain => execute_term!(self.render_stream, Print(text))?,
                SpanStyle::Accent => execute_term!(
                    self.render_stream,
                    SetForegroundColor(Color::Green),
                    Print(text),
                    ResetColor
                )?,
                SpanStyle::Muted => execute_term!(
                    self.render_stream,
                    SetForegroundColor(Color::DarkGrey),
                    Print(text),
                    ResetColor
                )?,
            }
        }
        Ok(used)
    }

    fn print_dimmed(&mut self, text: &str) -> Result<()> {
        execute_term!(
            self.render_stream,
            SetForegroundColor(Color::DarkGrey),
            Print(text),
            ResetColor
        )
    }

    fn render_empty_list_message<C: CatalogClient>(
        &mut self,
        view_model: &ScreenViewModel<C>,
    ) -> Result<()> {
        let products = view_model.products();
        let message = match (products.products(), products.state()) {
            (_, ProductsState::Loading) => "Loading...",
            (None, _) => "Type a query and press Enter",
            (Some(_), _) => "No products found",
        };
        let row = view_model.list_top();
        self.clear_row(row)?;
        let text = truncate_to_width(message, self.width().saturating_sub(2));
        execute_term!(self.render_stream, MoveTo(2, row))?;
        self.print_dimmed(&text)
    }

    fn render_row<C: CatalogClient>(
        &mut self,
        view_model: &ScreenViewModel<C>,
        index: usize,
        row: u16,
    ) -> Result<()> {
        self.clear_row(row)?;
        let Some(item) = view_model.products().product(index) else {
            return Ok(());
        };

        let width = self.width();
        let price = item.formatted_price();
        let price_width = price.width() + 1;
        let is_selected = index == view_model.selected();
        let highlight = is_selected && view_model.focus() == Focus::List;

        let marker = if is_selected { SELECTED_MARKER } else { "  " };
        execute_term!(self.render_stream, Print(marker))?;
        let mut used = marker.width();

        let name_width = width.saturating_sub(used + price_width).min(48);
        let name = truncate_to_width(item.name(), name_width);
        if highlight {
            execute_term!(
                self.render_stream,
                SetAttribute(Attribute::Reverse),
                Print(&name),
                SetAttribute(Attribute::Reset)
            )?;
        } else {
            execute_term!(self.render_stream, Print(&name))?;
        }
        used += name.width();

        let review_room = width.saturating_sub(used + price_width + 2);
        if review_room > 0 {
            execute_term!(self.render_stream, Print("  "))?;
            used += 2 + self.print_spans(item.formatted_review().spans(), review_room)?;
        }

        if used + price_width <= width {
            let column = width.saturating_sub(price.width()) as u16;
            execute_term!(self.render_stream, MoveTo(column, row), Print(&price))?;
        }
        Ok(())
    }

    fn render_modal_box(&mut self, message: &str) -> Result<()> {
        let (width, height) = self.terminal_size;
        let box_width = (width as usize).saturating_sub(8).clamp(20, 64);
        let inner = box_width.saturating_sub(4);
        let mut lines = wrap_text(message, inner);
        let max_lines = (height as usize).saturating_sub(6).max(1);
        lines.truncate(max_lines);

        let box_height = lines.len() + 4;
        let left = ((width as usize).saturating_sub(box_width) / 2) as u16;
        let top = ((height as usize).saturating_sub(box_height) / 2) as u16;

        let border = format!("+{}+", "-".repeat(box_width.saturating_sub(2)));
        let title = pad_to_width(" Error ", box_width.saturating_sub(2));
        let footer = pad_to_width(" Press any key ", box_width.saturating_sub(2));

        execute_term!(
            self.render_stream,
            SetForegroundColor(Color::Red),
            MoveTo(left, top),
            Print(&border),
            MoveTo(left, top + 1),
            Print(format!("|{title}|"))
        )?;
        for (i, line) in lines.iter().enumerate() {
            let row = top + 2 + i as u16;
            execute_term!(
                self.render_stream,
                MoveTo(left, row),
                Print(format!("| {} |", pad_to_width(line, inner)))
            )?;
        }
        let bottom = top + 2 + lines.len() as u16;
        execute_term!(
            self.render_stream,
            MoveTo(left, bottom),
            Print(format!("|{footer}|")),
            MoveTo(left, bottom + 1),
            Print(&border),
            ResetColor
        )
    }
}

impl<RS: RenderStream> ViewRenderer for TerminalRenderer<RS> {
    fn initialize(&mut self) -> Result<()> {
        self.render_stream.enable_raw_mode()?;
        self.render_stream.enter_alternate_screen()?;
        execute_term!(self.render_stream, Clear(ClearType::All), Hide)
    }

    fn render_full<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>) -> Result<()> {
        // Hide cursor before screen refresh to avoid flickering
        execute_term!(self.render_stream, Hide, Clear(ClearType::All))?;

        self.render_search_bar(view_model)?;
        self.render_list(view_model)?;
        self.render_detail(view_model)?;
        self.render_status_bar(view_model)?;
        self.render_modal(view_model)?;
        self.render_cursor(view_model)?;

        self.flush()
    }

    fn render_search_bar<C: CatalogClient>(
        &mut self,
        view_model: &ScreenViewModel<C>,
    ) -> Result<()> {
        self.clear_row(0)?;
        if view_model.focus() == Focus::Search {
            execute_term!(
                self.render_stream,
                SetAttribute(Attribute::Bold),
                Print(SEARCH_PROMPT),
                SetAttribute(Attribute::Reset)
            )?;
        } else {
            self.print_dimmed(SEARCH_PROMPT)?;
        }

        let room = self.width().saturating_sub(SEARCH_PROMPT.width());
        let search_bar = view_model.search_bar();
        if search_bar.is_empty() {
            self.print_dimmed(&truncate_to_width(SEARCH_PLACEHOLDER, room))?;
        } else {
            let text = truncate_to_width(search_bar.text(), room);
            execute_term!(self.render_stream, Print(text))?;
        }
        Ok(())
    }

    fn render_list<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>) -> Result<()> {
        let top = view_model.list_top();
        let height = view_model.list_height();
        let visible = view_model.visible_rows();

        if visible.is_empty() {
            self.render_empty_list_message(view_model)?;
            for offset in 1..height {
                self.clear_row(top + offset as u16)?;
            }
            return Ok(());
        }

        for offset in 0..height {
            let row = top + offset as u16;
            let index = visible.start + offset;
            if index < visible.end {
                self.render_row(view_model, index, row)?;
            } else {
                self.clear_row(row)?;
            }
        }
        Ok(())
    }

    fn render_detail<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>) -> Result<()> {
        if !view_model.details_visible() {
            return Ok(());
        }
        let top = view_model.detail_top();
        let width = self.width();
        for offset in 0..DETAIL_PANE_HEIGHT {
            self.clear_row(top + offset)?;
        }

        execute_term!(self.render_stream, MoveTo(0, top))?;
        self.print_dimmed(&"-".repeat(width))?;

        let Some(item) = view_model.selected_product() else {
            return Ok(());
        };

        execute_term!(
            self.render_stream,
            MoveTo(2, top + 1),
            SetAttribute(Attribute::Bold),
            Print(truncate_to_width(item.name(), width.saturating_sub(2))),
            SetAttribute(Attribute::Reset)
        )?;

        execute_term!(
            self.render_stream,
            MoveTo(2, top + 2),
            Print(item.formatted_price()),
            Print("  ")
        )?;
        let used = 4 + item.formatted_price().width();
        self.print_spans(item.formatted_review().spans(), width.saturating_sub(used))?;

        // Rows between the review line and the image line hold the bullets
        let bullet_rows = DETAIL_PANE_HEIGHT.saturating_sub(4) as usize;
        for (i, line) in item
            .formatted_usps()
            .lines()
            .into_iter()
            .take(bullet_rows)
            .enumerate()
        {
            execute_term!(self.render_stream, MoveTo(4, top + 3 + i as u16))?;
            self.print_spans(&line, width.saturating_sub(4))?;
        }

        let image = view_model
            .image_status(item.image_path())
            .map(|status| status.label())
            .unwrap_or_else(|| "unavailable".to_string());
        execute_term!(
            self.render_stream,
            MoveTo(2, top + DETAIL_PANE_HEIGHT - 1)
        )?;
        self.print_dimmed(&truncate_to_width(
            &format!("image: {image}"),
            width.saturating_sub(2),
        ))
    }

    fn render_status_bar<C: CatalogClient>(
        &mut self,
        view_model: &ScreenViewModel<C>,
    ) -> Result<()> {
        let row = view_model.status_row();
        let width = self.width();
        let status_line = view_model.status_line();
        self.clear_row(row)?;

        // Left: busy indicator or message
        let left = if status_line.is_loading() {
            format!("{} Loading...", status_line.spinner())
        } else {
            status_line.status_message().unwrap_or_default().to_string()
        };
        if status_line.is_loading() {
            execute_term!(
                self.render_stream,
                SetForegroundColor(Color::Yellow),
                Print(truncate_to_width(&left, width)),
                ResetColor
            )?;
        } else {
            execute_term!(self.render_stream, Print(truncate_to_width(&left, width)))?;
        }

        // Right: pagination summary and profile
        let mut right = status_line.summary_text(view_model.row_count());
        if !right.is_empty() {
            right.push_str(" | ");
        }
        right.push_str(&format!("[{}]", status_line.profile_name()));

        let left_width = left.width();
        if left_width + 1 + right.width() <= width {
            let column = (width - right.width()) as u16;
            execute_term!(self.render_stream, MoveTo(column, row))?;
            self.print_dimmed(&right)?;
        }
        Ok(())
    }

    fn render_modal<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>) -> Result<()> {
        match view_model.modal() {
            Some(message) => self.render_modal_box(message),
            None => Ok(()),
        }
    }

    fn render_cursor<C: CatalogClient>(&mut self, view_model: &ScreenViewModel<C>) -> Result<()> {
        if view_model.focus() == Focus::Search && view_model.modal().is_none() {
            let column = SEARCH_PROMPT.width() + view_model.search_bar().display_cursor_column();
            let column = column.min(self.width().saturating_sub(1)) as u16;
            execute_term!(self.render_stream, MoveTo(column, 0), Show)
        } else {
            execute_term!(self.render_stream, Hide)
        }
    }

    fn cleanup(&mut self) -> Result<()> {
        execute_term!(self.render_stream, Show, ResetColor)?;
        self.render_stream.leave_alternate_screen()?;
        self.render_stream.disable_raw_mode()?;
        self.flush()
    }
}

/// Longest prefix of `text` that fits into `width` terminal columns
fn truncate_to_width(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut result = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        used += ch_width;
        result.push(ch);
    }
    result
}

fn pad_to_width(text: &str, width: usize) -> String {
    let text = truncate_to_width(text, width);
    let padding = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(padding))
}

/// Greedy word wrap; words longer than `width` are split
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            while word.width() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let head = truncate_to_width(&word, width);
                word = word[head.len()..].to_string();
                lines.push(head);
            }
            let needed = if line.is_empty() {
                word.width()
            } else {
                line.width() + 1 + word.width()
            };
            if needed > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        if !line.is_empty() || lines.is_empty() {
            lines.push(line);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repl::io::MockRenderStream;
    use crate::repl::testing::{page_of, ScriptedCatalogClient};
    use crate::repl::view_models::{GlyphSet, ProductsViewModel};

    fn screen(width: u16, height: u16) -> ScreenViewModel<ScriptedCatalogClient> {
        let products = ProductsViewModel::new(ScriptedCatalogClient::new(), GlyphSet::default());
        let mut screen = ScreenViewModel::new(products, None);
        screen.update_terminal_size(width, height);
        screen
    }

    #[test]
    fn truncate_should_respect_wide_characters() {
        assert_eq!(truncate_to_width("hello", 3), "hel");
        assert_eq!(truncate_to_width("日本語", 5), "日本");
        assert_eq!(truncate_to_width("abc", 10), "abc");
    }

    #[test]
    fn wrap_should_break_on_words_and_split_long_words() {
        assert_eq!(
            wrap_text("Request failed: connection refused", 16),
            vec!["Request failed:", "connection", "refused"]
        );
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn renderer_should_take_size_from_stream() {
        let renderer =
            TerminalRenderer::with_render_stream(MockRenderStream::with_size((100, 30))).unwrap();
        assert_eq!(renderer.terminal_size(), (100, 30));
    }

    #[test]
    fn full_render_should_draw_placeholder_and_hint() {
        let stream = MockRenderStream::with_size((60, 20));
        let screen_state = stream.screen();
        let mut renderer = TerminalRenderer::with_render_stream(stream).unwrap();
        let view_model = screen(60, 20);

        renderer.render_full(&view_model).unwrap();

        let screen = screen_state.snapshot();
        assert_eq!(screen.row_text(0), "Search: Search Product...");
        assert!(screen.row_text(1).contains("Type a query and press Enter"));
        assert!(screen.row_text(19).ends_with("[default]"));
        assert_eq!(screen.cursor(), (8, 0));
    }

    #[tokio::test]
    async fn full_render_should_draw_rows_and_details() {
        let client = ScriptedCatalogClient::new();
        client.respond("tv", 1, Ok(page_of(1, 1, 3)));
        let products = ProductsViewModel::new(client, GlyphSet::default());
        let mut view_model = ScreenViewModel::new(products, None);
        view_model.update_terminal_size(60, 20);
        view_model.search("tv");
        view_model.wait_for_products().await;

        let stream = MockRenderStream::with_size((60, 20));
        let screen_state = stream.screen();
        let mut renderer = TerminalRenderer::with_render_stream(stream).unwrap();
        renderer.render_full(&view_model).unwrap();

        let screen = screen_state.snapshot();
        assert!(screen.row_text(1).starts_with("> p1-0  ★ 4.5 (10 reviews)"));
        assert!(screen.row_text(1).ends_with("$ 9.99"));
        assert!(screen.row_text(2).starts_with("  p1-1"));
        // Detail pane starts below the 11 list rows
        assert!(screen.row_text(12).starts_with("-----"));
        assert_eq!(screen.row_text(13), "  p1-0");
        assert!(screen.row_text(15).contains("✔ Fast delivery"));
        assert_eq!(screen.row_text(18), "  image: unavailable");
    }

    #[tokio::test]
    async fn error_modal_should_be_drawn_over_list() {
        let client = ScriptedCatalogClient::new();
        client.respond(
            "tv",
            1,
            Err(crate::repl::services::FetchError::Request(
                "connection refused".to_string(),
            )),
        );
        let products = ProductsViewModel::new(client, GlyphSet::default());
        let mut view_model = ScreenViewModel::new(products, None);
        view_model.update_terminal_size(60, 20);
        view_model.search("tv");
        view_model.wait_for_products().await;

        let stream = MockRenderStream::with_size((60, 20));
        let screen_state = stream.screen();
        let mut renderer = TerminalRenderer::with_render_stream(stream).unwrap();
        renderer.render_full(&view_model).unwrap();

        let screen = screen_state.snapshot();
        assert!(screen.contains("Error"));
        assert!(screen.contains("Request failed: connection refused"));
        assert!(screen.contains("Press any key"));
    }
}
