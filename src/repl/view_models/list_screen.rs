//! # Screen ViewModel
//!
//! Binds the search bar and the scrolling product list to the search
//! session. Owns the screen layout, selection, viewport and the error modal,
//! and turns session model events into view events for the renderer.
//!
//! Layout, top to bottom: search bar (1 row), product list, detail pane for
//! the selected product, status bar (1 row).

use crate::repl::events::{Focus, ModelEvent, ViewEvent};
use crate::repl::models::{SearchBar, StatusLine};
use crate::repl::services::{CatalogClient, ImageLoad, ImageResponse, ImageService};
use crate::repl::view_models::product_item::ProductItemViewModel;
use crate::repl::view_models::products::{ProductsState, ProductsViewModel};
use std::collections::HashMap;
use std::ops::Range;

/// Rows taken by the detail pane, divider included
pub const DETAIL_PANE_HEIGHT: u16 = 7;

/// Below this height the detail pane is hidden
const MIN_HEIGHT_FOR_DETAILS: u16 = 14;

/// Load status of a product image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    Loading,
    Loaded { bytes: usize, cached: bool },
    Unavailable,
    Failed(String),
}

impl ImageStatus {
    pub fn label(&self) -> String {
        match self {
            ImageStatus::Loading => "loading".to_string(),
            ImageStatus::Loaded { bytes, cached: true } => format!("{bytes} bytes (cached)"),
            ImageStatus::Loaded { bytes, cached: false } => format!("{bytes} bytes"),
            ImageStatus::Unavailable => "unavailable".to_string(),
            ImageStatus::Failed(reason) => format!("failed: {reason}"),
        }
    }
}

pub struct ScreenViewModel<C: CatalogClient> {
    products: ProductsViewModel<C>,
    images: Option<ImageService>,
    image_status: HashMap<String, ImageStatus>,

    search_bar: SearchBar,
    focus: Focus,

    // List state
    selected: usize,
    scroll_offset: usize,
    displayed_rows: Range<usize>,

    terminal_size: (u16, u16),
    status_line: StatusLine,
    modal: Option<String>,

    pending_view_events: Vec<ViewEvent>,
}

impl<C: CatalogClient> ScreenViewModel<C> {
    pub fn new(products: ProductsViewModel<C>, images: Option<ImageService>) -> Self {
        Self {
            products,
            images,
            image_status: HashMap::new(),
            search_bar: SearchBar::new(),
            focus: Focus::Search,
            selected: 0,
            scroll_offset: 0,
            displayed_rows: 0..0,
            terminal_size: (80, 24),
            status_line: StatusLine::new(),
            modal: None,
            pending_view_events: Vec::new(),
        }
    }

    // === Accessors ===

    pub fn products(&self) -> &ProductsViewModel<C> {
        &self.products
    }

    pub fn products_mut(&mut self) -> &mut ProductsViewModel<C> {
        &mut self.products
    }

    pub fn search_bar(&self) -> &SearchBar {
        &self.search_bar
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_product(&self) -> Option<&ProductItemViewModel> {
        self.products.product(self.selected)
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn status_line(&self) -> &StatusLine {
        &self.status_line
    }

    pub fn modal(&self) -> Option<&str> {
        self.modal.as_deref()
    }

    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    pub fn row_count(&self) -> usize {
        self.products.product_count()
    }

    pub fn image_status(&self, url: &str) -> Option<&ImageStatus> {
        self.image_status.get(url)
    }

    pub fn set_profile_info(&mut self, profile_name: String, profile_path: String) {
        self.status_line.set_profile(profile_name, profile_path);
    }

    // === Layout ===

    pub fn details_visible(&self) -> bool {
        self.terminal_size.1 >= MIN_HEIGHT_FOR_DETAILS
    }

    /// Screen row where the list starts
    pub fn list_top(&self) -> u16 {
        1
    }

    /// Number of list rows that fit on screen
    pub fn list_height(&self) -> usize {
        let details = if self.details_visible() {
            DETAIL_PANE_HEIGHT
        } else {
            0
        };
        self.terminal_size.1.saturating_sub(2 + details).max(1) as usize
    }

    /// Screen row where the detail pane starts
    pub fn detail_top(&self) -> u16 {
        self.list_top() + self.list_height() as u16
    }

    pub fn status_row(&self) -> u16 {
        self.terminal_size.1.saturating_sub(1)
    }

    /// Product indices currently inside the viewport
    pub fn visible_rows(&self) -> Range<usize> {
        let end = (self.scroll_offset + self.list_height()).min(self.row_count());
        self.scroll_offset.min(end)..end
    }

    pub fn update_terminal_size(&mut self, width: u16, height: u16) {
        tracing::debug!("Terminal resized to {}x{}", width, height);
        self.terminal_size = (width, height);
        self.refresh_viewport(false);
        self.emit_view_event(ViewEvent::FullRedrawRequired);
    }

    // === Infinite scroll ===

    /// A row is about to be displayed; the last row pulls in the next page
    pub fn will_display_row(&mut self, index: usize) -> Option<u64> {
        let count = self.row_count();
        if count == 0 || index + 1 != count {
            return None;
        }
        tracing::debug!("Last row {} displayed, requesting next page", index);
        self.products.fetch_next_page()
    }

    // === Search bar ===

    pub fn focus_search(&mut self) {
        self.set_focus(Focus::Search);
    }

    pub fn focus_list(&mut self) {
        self.set_focus(Focus::List);
    }

    pub fn toggle_focus(&mut self) {
        self.set_focus(self.focus.toggled());
    }

    pub fn insert_char(&mut self, ch: char) {
        self.search_bar.insert_char(ch);
        self.emit_view_event(ViewEvent::SearchBarRedrawRequired);
    }

    pub fn backspace(&mut self) {
        if self.search_bar.backspace() {
            self.emit_view_event(ViewEvent::SearchBarRedrawRequired);
        }
    }

    pub fn delete_char(&mut self) {
        if self.search_bar.delete() {
            self.emit_view_event(ViewEvent::SearchBarRedrawRequired);
        }
    }

    pub fn move_search_cursor(&mut self, movement: CursorMovement) {
        match movement {
            CursorMovement::Left => self.search_bar.move_left(),
            CursorMovement::Right => self.search_bar.move_right(),
            CursorMovement::Home => self.search_bar.move_home(),
            CursorMovement::End => self.search_bar.move_end(),
        }
        self.emit_view_event(ViewEvent::CursorUpdateRequired);
    }

    pub fn clear_search_text(&mut self) {
        self.search_bar.clear();
        self.emit_view_event(ViewEvent::SearchBarRedrawRequired);
    }

    /// Search for the typed query; blank input is ignored
    pub fn submit_search(&mut self) -> Option<u64> {
        let query = self.search_bar.query()?;
        Some(self.search(&query))
    }

    /// Start a search for `query` and move focus to the list
    pub fn search(&mut self, query: &str) -> u64 {
        if self.search_bar.text() != query {
            self.search_bar.set_text(query);
        }
        self.status_line.clear_status_message();
        self.focus = Focus::List;
        let generation = self.products.search(query);
        self.process_model_events();
        self.emit_view_event(ViewEvent::FullRedrawRequired);
        generation
    }

    /// Cancel the running fetch, if any
    pub fn cancel_fetch(&mut self) -> bool {
        if !self.products.cancel() {
            return false;
        }
        self.status_line.set_status_message("Cancelled");
        self.process_model_events();
        true
    }

    // === List navigation ===

    pub fn select_next(&mut self) {
        self.select(self.selected.saturating_add(1));
    }

    pub fn select_previous(&mut self) {
        self.select(self.selected.saturating_sub(1));
    }

    pub fn page_down(&mut self) {
        self.select(self.selected.saturating_add(self.list_height()));
    }

    pub fn page_up(&mut self) {
        self.select(self.selected.saturating_sub(self.list_height()));
    }

    pub fn select_first(&mut self) {
        self.select(0);
    }

    pub fn select_last(&mut self) {
        self.select(self.row_count().saturating_sub(1));
    }

    /// Move the selection to `index` (clamped), scrolling it into view
    pub fn select(&mut self, index: usize) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        let index = index.min(count - 1);
        if index == self.selected {
            return;
        }
        self.selected = index;
        self.refresh_viewport(false);
        self.load_selected_image();
        self.emit_view_event(ViewEvent::ListRedrawRequired);
        self.emit_view_event(ViewEvent::DetailRedrawRequired);
        self.process_model_events();
    }

    // === Modal ===

    pub fn dismiss_modal(&mut self) -> bool {
        if self.modal.take().is_none() {
            return false;
        }
        self.emit_view_event(ViewEvent::FullRedrawRequired);
        true
    }

    // === Background work ===

    /// Apply finished fetches and image loads; returns true if anything changed
    pub fn poll_background(&mut self) -> bool {
        let mut changed = self.products.poll_responses() > 0;
        changed |= self.poll_images();
        changed |= self.process_model_events();
        changed
    }

    /// Wait for the running catalog fetch and apply it
    pub async fn wait_for_products(&mut self) -> bool {
        let received = self.products.wait_for_response().await;
        self.process_model_events();
        received
    }

    /// Wait for the next image response, if any image is loading
    pub async fn wait_for_image(&mut self) -> bool {
        let response = match self.images.as_mut() {
            Some(images) if self.image_status.values().any(|s| s == &ImageStatus::Loading) => {
                images.next_response().await
            }
            _ => None,
        };
        match response {
            Some(response) => {
                self.apply_image_response(response);
                self.process_model_events();
                true
            }
            None => false,
        }
    }

    /// Advance the busy indicator while loading
    pub fn tick(&mut self) {
        if self.status_line.tick() {
            self.emit_view_event(ViewEvent::StatusBarUpdateRequired);
        }
    }

    /// Collect and clear pending view events
    pub fn collect_pending_view_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.pending_view_events)
    }

    fn poll_images(&mut self) -> bool {
        let mut responses = Vec::new();
        if let Some(images) = self.images.as_mut() {
            while let Some(response) = images.poll_response() {
                responses.push(response);
            }
        }
        let changed = !responses.is_empty();
        for response in responses {
            self.apply_image_response(response);
        }
        changed
    }

    fn apply_image_response(&mut self, response: ImageResponse) {
        let event = match response.result {
            Ok(bytes) => ModelEvent::ImageLoaded {
                url: response.url,
                bytes: bytes.len(),
                cached: false,
            },
            Err(error) => ModelEvent::ImageFailed {
                url: response.url,
                message: error.to_string(),
            },
        };
        self.handle_model_event(event);
    }

    fn load_selected_image(&mut self) {
        let Some(url) = self.selected_product().map(|p| p.image_path().to_string()) else {
            return;
        };
        let Some(images) = self.images.as_mut() else {
            return;
        };
        if matches!(self.image_status.get(&url), Some(ImageStatus::Loading)) {
            return;
        }
        let status = match images.load(&url) {
            ImageLoad::Cached(bytes) => ImageStatus::Loaded {
                bytes: bytes.len(),
                cached: true,
            },
            ImageLoad::Pending => ImageStatus::Loading,
            ImageLoad::Unavailable => ImageStatus::Unavailable,
        };
        self.image_status.insert(url, status);
    }

    /// Handle model events until the session stops producing them
    fn process_model_events(&mut self) -> bool {
        let mut handled = false;
        loop {
            let events = self.products.take_model_events();
            if events.is_empty() {
                return handled;
            }
            handled = true;
            for event in events {
                self.handle_model_event(event);
            }
        }
    }

    fn handle_model_event(&mut self, event: ModelEvent) {
        match event {
            ModelEvent::SearchStarted { query } => {
                tracing::debug!("Screen reset for search '{}'", query);
                self.selected = 0;
                self.scroll_offset = 0;
                self.displayed_rows = 0..0;
                self.image_status.clear();
                self.status_line.clear_fetch_summary();
                self.emit_view_event(ViewEvent::ListRedrawRequired);
            }
            ModelEvent::PageRequested { .. } | ModelEvent::StaleResponseDiscarded { .. } => {}
            ModelEvent::ProductsChanged { count } => {
                if count == 0 {
                    self.selected = 0;
                } else if self.selected >= count {
                    self.selected = count - 1;
                }
                self.refresh_viewport(true);
                self.load_selected_image();
                self.emit_view_event(ViewEvent::ListRedrawRequired);
                self.emit_view_event(ViewEvent::DetailRedrawRequired);
                self.emit_view_event(ViewEvent::StatusBarUpdateRequired);
            }
            ModelEvent::StateChanged { state } => {
                self.status_line
                    .set_loading(self.products.state().is_loading());
                match state {
                    ProductsState::Error(error) => {
                        self.modal = Some(error.to_string());
                        self.emit_view_event(ViewEvent::ModalRedrawRequired);
                    }
                    ProductsState::Finished => self.update_fetch_summary(),
                    ProductsState::Loading => {}
                }
                self.emit_view_event(ViewEvent::StatusBarUpdateRequired);
            }
            ModelEvent::ImageLoaded { url, bytes, cached } => {
                self.image_status
                    .insert(url.clone(), ImageStatus::Loaded { bytes, cached });
                self.emit_detail_update_for(&url);
            }
            ModelEvent::ImageFailed { url, message } => {
                self.image_status
                    .insert(url.clone(), ImageStatus::Failed(message));
                self.emit_detail_update_for(&url);
            }
        }
    }

    fn update_fetch_summary(&mut self) {
        let duration_ms = self.products.last_fetch().map_or(0, |(_, ms)| *ms);
        if let Some(total_results) = self.products.total_results() {
            self.status_line.set_fetch_summary(
                self.products.current_page(),
                self.products.total_pages(),
                total_results,
                duration_ms,
            );
        }
    }

    fn emit_detail_update_for(&mut self, url: &str) {
        if self.selected_product().map(|p| p.image_path()) == Some(url) {
            self.emit_view_event(ViewEvent::DetailRedrawRequired);
        }
    }

    /// Keep the selection inside the viewport and report rows entering it.
    /// With `reload` every visible row counts as newly displayed.
    fn refresh_viewport(&mut self, reload: bool) {
        let height = self.list_height();
        let old_offset = self.scroll_offset;
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
        let max_offset = self.row_count().saturating_sub(height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
        if self.scroll_offset != old_offset {
            tracing::debug!("List scrolled {} -> {}", old_offset, self.scroll_offset);
            self.emit_view_event(ViewEvent::ListRedrawRequired);
        }

        let visible = self.visible_rows();
        let entering: Vec<usize> = visible
            .clone()
            .filter(|row| reload || !self.displayed_rows.contains(row))
            .collect();
        self.displayed_rows = visible;
        for row in entering {
            self.will_display_row(row);
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        if self.focus != focus {
            tracing::debug!("Focus {:?} -> {:?}", self.focus, focus);
            self.focus = focus;
            self.emit_view_event(ViewEvent::SearchBarRedrawRequired);
            self.emit_view_event(ViewEvent::ListRedrawRequired);
            self.emit_view_event(ViewEvent::CursorUpdateRequired);
        }
    }

    fn emit_view_event(&mut self, event: ViewEvent) {
        self.pending_view_events.push(event);
    }
}

/// Cursor movements inside the search bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMovement {
    Left,
    Right,
    Home,
    End,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogProfile;
    use crate::repl::services::{FetchError, ImageCache, ProductsRequest};
    use crate::repl::testing::{page_of, ScriptedCatalogClient};
    use bytes::Bytes;
    use crate::repl::view_models::product_item::GlyphSet;

    type Screen = ScreenViewModel<ScriptedCatalogClient>;

    /// Screen with 10 list rows (24 - search - status - details)
    fn screen(client: &ScriptedCatalogClient) -> Screen {
        let products = ProductsViewModel::new(client.clone(), GlyphSet::default());
        let mut screen = ScreenViewModel::new(products, None);
        screen.update_terminal_size(80, 19);
        screen.collect_pending_view_events();
        screen
    }

    #[test]
    fn layout_should_split_rows_between_panes() {
        let client = ScriptedCatalogClient::new();
        let mut screen = screen(&client);
        assert!(screen.details_visible());
        assert_eq!(screen.list_height(), 10);
        assert_eq!(screen.detail_top(), 11);
        assert_eq!(screen.status_row(), 18);

        screen.update_terminal_size(80, 8);
        assert!(!screen.details_visible());
        assert_eq!(screen.list_height(), 6);
    }

    #[test]
    fn image_status_label_should_describe_state() {
        assert_eq!(ImageStatus::Loading.label(), "loading");
        assert_eq!(
            ImageStatus::Loaded {
                bytes: 2048,
                cached: true
            }
            .label(),
            "2048 bytes (cached)"
        );
        assert_eq!(ImageStatus::Unavailable.label(), "unavailable");
    }

    #[tokio::test]
    async fn blank_query_should_not_search() {
        let client = ScriptedCatalogClient::new();
        let mut screen = screen(&client);
        screen.insert_char(' ');
        assert_eq!(screen.submit_search(), None);
        assert!(client.requests().is_empty());
        assert_eq!(screen.focus(), Focus::Search);
    }

    #[tokio::test]
    async fn submitting_should_search_and_focus_list() {
        let client = ScriptedCatalogClient::new();
        client.respond("tv", 1, Ok(page_of(1, 1, 3)));
        let mut screen = screen(&client);

        for ch in "tv".chars() {
            screen.insert_char(ch);
        }
        assert!(screen.submit_search().is_some());
        assert_eq!(screen.focus(), Focus::List);
        assert!(screen.status_line().is_loading());

        assert!(screen.wait_for_products().await);
        assert_eq!(screen.row_count(), 3);
        assert!(!screen.status_line().is_loading());
        let summary = screen.status_line().fetch_summary();
        assert_eq!(summary.current_page, Some(1));
        assert_eq!(summary.page_count, Some(1));
        assert_eq!(summary.total_results, Some(3));
        assert!(screen
            .collect_pending_view_events()
            .contains(&ViewEvent::ListRedrawRequired));
    }

    #[tokio::test]
    async fn short_first_page_should_pull_next_page() {
        let client = ScriptedCatalogClient::new();
        client.respond("tv", 1, Ok(page_of(1, 2, 4)));
        let _gate = client.hold("tv", 2, Ok(page_of(2, 2, 4)));
        let mut screen = screen(&client);

        screen.search("tv");
        screen.wait_for_products().await;

        // All four rows fit, so the last one was displayed right away
        assert_eq!(screen.row_count(), 4);
        assert_eq!(
            client.requests().last(),
            Some(&ProductsRequest::new("tv", 2))
        );
        assert!(screen.products().state().is_loading());
    }

    #[tokio::test]
    async fn scrolling_to_last_row_should_fetch_next_page() {
        let client = ScriptedCatalogClient::new();
        client.respond("phone", 1, Ok(page_of(1, 3, 20)));
        client.respond("phone", 2, Ok(page_of(2, 3, 20)));
        let mut screen = screen(&client);

        screen.search("phone");
        screen.wait_for_products().await;
        assert_eq!(client.requests().len(), 1);

        for _ in 0..18 {
            screen.select_next();
        }
        assert_eq!(screen.selected(), 18);
        assert_eq!(screen.scroll_offset(), 9);
        assert_eq!(client.requests().len(), 1);

        screen.select_next();
        assert_eq!(screen.visible_rows(), 10..20);
        assert_eq!(client.requests().len(), 2);

        screen.wait_for_products().await;
        assert_eq!(screen.row_count(), 40);
        assert_eq!(screen.selected(), 19);

        screen.select_last();
        assert_eq!(screen.selected(), 39);
        assert_eq!(screen.visible_rows(), 30..40);
    }

    #[tokio::test]
    async fn fetch_error_should_open_modal_and_keep_rows() {
        let client = ScriptedCatalogClient::new();
        client.respond("phone", 1, Ok(page_of(1, 2, 20)));
        client.respond(
            "phone",
            2,
            Err(FetchError::Request("connection refused".to_string())),
        );
        let mut screen = screen(&client);

        screen.search("phone");
        screen.wait_for_products().await;
        screen.select_last();
        screen.wait_for_products().await;

        assert_eq!(
            screen.modal(),
            Some("Request failed: connection refused")
        );
        assert_eq!(screen.row_count(), 20);
        assert!(!screen.status_line().is_loading());

        assert!(screen.dismiss_modal());
        assert_eq!(screen.modal(), None);
        assert!(!screen.dismiss_modal());
    }

    #[tokio::test]
    async fn new_search_should_forget_image_status() {
        let client = ScriptedCatalogClient::new();
        client.respond("tv", 1, Ok(page_of(1, 1, 3)));
        let _gate = client.hold("radio", 1, Ok(page_of(1, 1, 3)));
        let cache = ImageCache::shared(1024);
        for label in ["p1-0", "p1-1"] {
            let url = format!("https://images.example.com/{}.png", label);
            cache.lock().unwrap().put(url, Bytes::from_static(b"png"));
        }
        let images = ImageService::new(&CatalogProfile::blank("test"), cache).unwrap();
        let products = ProductsViewModel::new(client.clone(), GlyphSet::default());
        let mut screen = ScreenViewModel::new(products, Some(images));
        screen.update_terminal_size(80, 19);

        screen.search("tv");
        screen.wait_for_products().await;
        screen.select_next();
        let first = "https://images.example.com/p1-0.png";
        let second = "https://images.example.com/p1-1.png";
        assert_eq!(
            screen.image_status(first),
            Some(&ImageStatus::Loaded {
                bytes: 3,
                cached: true
            })
        );
        assert!(screen.image_status(second).is_some());

        screen.search("radio");
        assert_eq!(screen.image_status(first), None);
        assert_eq!(screen.image_status(second), None);
    }

    #[tokio::test]
    async fn cancel_should_stop_loading() {
        let client = ScriptedCatalogClient::new();
        let _gate = client.hold("phone", 1, Ok(page_of(1, 2, 20)));
        let mut screen = screen(&client);

        screen.search("phone");
        assert!(screen.status_line().is_loading());
        assert!(screen.cancel_fetch());
        assert!(!screen.status_line().is_loading());
        assert_eq!(screen.status_line().status_message(), Some("Cancelled"));
        assert!(!screen.cancel_fetch());
    }

    #[tokio::test]
    async fn focus_changes_should_redraw_search_bar() {
        let client = ScriptedCatalogClient::new();
        let mut screen = screen(&client);

        screen.toggle_focus();
        assert_eq!(screen.focus(), Focus::List);
        screen.focus_search();
        assert_eq!(screen.focus(), Focus::Search);
        let events = screen.collect_pending_view_events();
        assert!(events.contains(&ViewEvent::SearchBarRedrawRequired));
        assert!(screen.collect_pending_view_events().is_empty());
    }
}
