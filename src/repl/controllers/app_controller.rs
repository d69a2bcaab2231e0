//! # Application Controller
//!
//! The controller orchestrates the screen components and manages the event
//! loop. It connects user input to commands, drains finished background
//! fetches and coordinates view updates.

use crate::config::{self, CatalogProfile};
use crate::repl::{
    commands::{CommandContext, CommandEvent, CommandRegistry, SelectionMovement, ViewModelSnapshot},
    events::{Focus, SimpleEventBus, ViewEvent},
    io::{EventStream, RenderStream},
    services::{CatalogClient, HttpCatalogClient, ImageCache, ImageService},
    view_models::{GlyphSet, ProductsViewModel, ScreenViewModel},
    views::{TerminalRenderer, ViewRenderer},
};
use crate::cmd_args::CommandLineArgs;
use anyhow::Result;
use crossterm::event::{Event, KeyEvent, KeyEventKind};
use std::time::Duration;

/// How long one loop iteration waits for input before checking background work
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The main application controller that orchestrates the MVVM pattern
pub struct AppController<ES: EventStream, RS: RenderStream, C: CatalogClient = HttpCatalogClient> {
    view_model: ScreenViewModel<C>,
    view_renderer: TerminalRenderer<RS>,
    command_registry: CommandRegistry,
    event_stream: ES,
    initial_query: Option<String>,
    should_quit: bool,
}

impl<ES: EventStream, RS: RenderStream> AppController<ES, RS> {
    /// Create the production controller: profile from disk, HTTP catalog and
    /// image loading, with injected I/O streams
    pub fn with_io_streams(
        cmd_args: CommandLineArgs,
        event_stream: ES,
        render_stream: RS,
    ) -> Result<Self> {
        let profile_path = config::get_profile_path();
        let profile = config::load_profile(cmd_args.profile(), &profile_path)?;

        let client = HttpCatalogClient::new(&profile)?;
        let cache = ImageCache::shared(profile.image_cache_bytes);
        let images = ImageService::new(&profile, cache)?;

        let mut controller = Self::with_catalog_client(
            &profile,
            client,
            Some(images),
            event_stream,
            render_stream,
        )?;
        controller.initial_query = cmd_args.query().map(str::to_string);
        Ok(controller)
    }
}

impl<ES: EventStream, RS: RenderStream, C: CatalogClient> AppController<ES, RS, C> {
    /// Create a controller around any catalog client
    pub fn with_catalog_client(
        profile: &CatalogProfile,
        client: C,
        images: Option<ImageService>,
        event_stream: ES,
        render_stream: RS,
    ) -> Result<Self> {
        let mut products = ProductsViewModel::new(client, GlyphSet::new(profile.glyphs));
        products.set_event_bus(Box::new(SimpleEventBus::with_tracing()));
        let mut view_model = ScreenViewModel::new(products, images);

        // Pass RenderStream ownership to the View layer (TerminalRenderer)
        let view_renderer = TerminalRenderer::with_render_stream(render_stream)?;

        // Synchronize view model with actual terminal size
        let (width, height) = view_renderer.terminal_size();
        view_model.update_terminal_size(width, height);
        view_model.set_profile_info(profile.name.clone(), config::get_profile_path());
        view_model.collect_pending_view_events();

        Ok(Self {
            view_model,
            view_renderer,
            command_registry: CommandRegistry::new(),
            event_stream,
            initial_query: None,
            should_quit: false,
        })
    }

    /// Search for `query` as soon as the loop starts
    pub fn set_initial_query(&mut self, query: Option<String>) {
        self.initial_query = query;
    }

    /// Run the main application loop
    pub async fn run(&mut self) -> Result<()> {
        // Initialize view renderer (handles all terminal setup)
        self.view_renderer.initialize()?;

        if let Some(query) = self.initial_query.take() {
            tracing::info!("Searching initial query '{}'", query);
            self.view_model.search(&query);
        }
        self.view_model.collect_pending_view_events();
        self.view_renderer.render_full(&self.view_model)?;

        while !self.should_quit {
            if self.event_stream.poll(POLL_INTERVAL)? {
                let event = self.event_stream.read()?;
                self.handle_event(event)?;
            } else {
                // Let fetch tasks progress on single-threaded runtimes
                tokio::task::yield_now().await;
            }

            if self.should_quit {
                break;
            }
            self.view_model.poll_background();
            self.view_model.tick();
            self.render_pending_view_events()?;
        }

        // Cleanup (all handled by view renderer)
        self.view_renderer.cleanup()?;

        Ok(())
    }

    /// Handle a single terminal event and repaint what it changed
    pub fn process_event(&mut self, event: Event) -> Result<()> {
        self.handle_event(event)?;
        if !self.should_quit {
            self.render_pending_view_events()?;
        }
        Ok(())
    }

    /// Wait for the running catalog fetch and any loading image, then repaint
    pub async fn wait_for_background(&mut self) -> Result<bool> {
        let products = self.view_model.wait_for_products().await;
        let image = self.view_model.wait_for_image().await;
        self.render_pending_view_events()?;
        Ok(products || image)
    }

    /// Render the whole screen
    pub fn render(&mut self) -> Result<()> {
        self.view_model.collect_pending_view_events();
        self.view_renderer.render_full(&self.view_model)
    }

    /// Get reference to view model (for testing)
    pub fn view_model(&self) -> &ScreenViewModel<C> {
        &self.view_model
    }

    /// Get mutable reference to view model (for testing)
    pub fn view_model_mut(&mut self) -> &mut ScreenViewModel<C> {
        &mut self.view_model
    }

    /// Check if the application should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                self.handle_key_event(key_event)
            }
            Event::Resize(width, height) => {
                self.view_model.update_terminal_size(width, height);
                self.view_renderer.update_size(width, height);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) -> Result<()> {
        tracing::debug!("Received key event: {:?}", key_event);

        // Create command context from current state
        let context = CommandContext::new(ViewModelSnapshot::from_view_model(&self.view_model));

        let events = self.command_registry.process_event(key_event, &context)?;
        if !events.is_empty() {
            tracing::debug!("Command events generated: {:?}", events);
        }
        for event in events {
            self.apply_command_event(event);
            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    /// Apply a command event to the view model
    fn apply_command_event(&mut self, event: CommandEvent) {
        match event {
            CommandEvent::FocusRequested { focus } => match focus {
                Focus::Search => self.view_model.focus_search(),
                Focus::List => self.view_model.focus_list(),
            },
            CommandEvent::FocusToggleRequested => self.view_model.toggle_focus(),
            CommandEvent::SearchCharRequested { ch } => self.view_model.insert_char(ch),
            CommandEvent::SearchBackspaceRequested => self.view_model.backspace(),
            CommandEvent::SearchDeleteRequested => self.view_model.delete_char(),
            CommandEvent::SearchCursorRequested { movement } => {
                self.view_model.move_search_cursor(movement)
            }
            CommandEvent::SearchClearRequested => self.view_model.clear_search_text(),
            CommandEvent::SearchSubmitRequested => {
                if self.view_model.submit_search().is_none() {
                    tracing::debug!("Blank query, search skipped");
                }
            }
            CommandEvent::SelectionMoveRequested { movement } => match movement {
                SelectionMovement::Next => self.view_model.select_next(),
                SelectionMovement::Previous => self.view_model.select_previous(),
                SelectionMovement::PageDown => self.view_model.page_down(),
                SelectionMovement::PageUp => self.view_model.page_up(),
                SelectionMovement::First => self.view_model.select_first(),
                SelectionMovement::Last => self.view_model.select_last(),
            },
            CommandEvent::FetchCancelRequested => {
                if !self.view_model.cancel_fetch() {
                    tracing::debug!("Nothing to cancel");
                }
            }
            CommandEvent::ModalDismissRequested => {
                self.view_model.dismiss_modal();
            }
            CommandEvent::QuitRequested => {
                tracing::info!("Quit requested");
                self.should_quit = true;
            }
            CommandEvent::NoAction => {}
        }
    }

    fn render_pending_view_events(&mut self) -> Result<()> {
        let view_events = self.view_model.collect_pending_view_events();
        if view_events.is_empty() {
            return Ok(());
        }
        self.process_view_events(view_events)
    }

    /// Process view events for selective rendering instead of always doing full redraws
    fn process_view_events(&mut self, view_events: Vec<ViewEvent>) -> Result<()> {
        // Group events to avoid redundant renders
        let mut needs_full_redraw = false;
        let mut needs_search_bar = false;
        let mut needs_list = false;
        let mut needs_detail = false;
        let mut needs_status_bar = false;
        let mut needs_modal = false;
        let mut needs_cursor_update = false;

        for event in view_events {
            match event {
                ViewEvent::FullRedrawRequired => {
                    needs_full_redraw = true;
                    // Full redraw overrides all other events
                    break;
                }
                ViewEvent::SearchBarRedrawRequired => needs_search_bar = true,
                ViewEvent::ListRedrawRequired => needs_list = true,
                ViewEvent::DetailRedrawRequired => needs_detail = true,
                ViewEvent::StatusBarUpdateRequired => needs_status_bar = true,
                ViewEvent::ModalRedrawRequired => needs_modal = true,
                ViewEvent::CursorUpdateRequired => needs_cursor_update = true,
            }
        }

        if needs_full_redraw {
            return self.view_renderer.render_full(&self.view_model);
        }

        let has_content_updates = needs_search_bar || needs_list || needs_detail;
        if needs_search_bar {
            self.view_renderer.render_search_bar(&self.view_model)?;
        }
        if needs_list {
            self.view_renderer.render_list(&self.view_model)?;
        }
        if needs_detail {
            self.view_renderer.render_detail(&self.view_model)?;
        }
        if needs_status_bar {
            self.view_renderer.render_status_bar(&self.view_model)?;
        }
        // An open modal sits on top of whatever was just repainted
        if needs_modal || (has_content_updates && self.view_model.modal().is_some()) {
            self.view_renderer.render_modal(&self.view_model)?;
        }
        if needs_cursor_update || has_content_updates || needs_modal {
            self.view_renderer.render_cursor(&self.view_model)?;
        }
        self.view_renderer.flush()
    }
}
