//! # Status Line Model
//!
//! Encapsulates all state related to the status line display,
//! providing a clean interface for status bar rendering.

/// Pagination summary of the latest successful fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchSummary {
    pub current_page: Option<u32>,
    pub page_count: Option<u32>,
    pub total_results: Option<u32>,
    /// Round trip of the catalog request in milliseconds
    pub duration_ms: Option<u64>,
}

/// Status line model containing all status bar display state
#[derive(Debug, Clone)]
pub struct StatusLine {
    /// Temporary status message to display
    status_message: Option<String>,

    fetch_summary: FetchSummary,

    profile_name: String,
    profile_path: String,

    /// Whether a catalog fetch is outstanding (drives the busy indicator)
    is_loading: bool,

    /// Advances on every tick while loading
    spinner_frame: usize,
}

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

impl StatusLine {
    pub fn new() -> Self {
        Self {
            status_message: None,
            fetch_summary: FetchSummary::default(),
            profile_name: "default".to_string(),
            profile_path: crate::config::DEFAULT_PROFILE_PATH.to_string(),
            is_loading: false,
            spinner_frame: 0,
        }
    }

    // === Status Message Methods ===

    pub fn set_status_message<S: Into<String>>(&mut self, message: S) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    // === Fetch Summary Methods ===

    pub fn set_fetch_summary(
        &mut self,
        current_page: u32,
        page_count: u32,
        total_results: u32,
        duration_ms: u64,
    ) {
        self.fetch_summary = FetchSummary {
            current_page: Some(current_page),
            page_count: Some(page_count),
            total_results: Some(total_results),
            duration_ms: Some(duration_ms),
        };
    }

    pub fn clear_fetch_summary(&mut self) {
        self.fetch_summary = FetchSummary::default();
    }

    pub fn fetch_summary(&self) -> &FetchSummary {
        &self.fetch_summary
    }

    // === Profile Methods ===

    pub fn set_profile(&mut self, name: String, path: String) {
        self.profile_name = name;
        self.profile_path = path;
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn profile_path(&self) -> &str {
        &self.profile_path
    }

    // === Loading State Methods ===

    pub fn set_loading(&mut self, loading: bool) {
        if loading && !self.is_loading {
            self.spinner_frame = 0;
        }
        self.is_loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Advance the busy indicator; returns false when nothing is loading
    pub fn tick(&mut self) -> bool {
        if !self.is_loading {
            return false;
        }
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        true
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame]
    }

    /// Right-aligned summary text, e.g. `page 2/3 · 40 of 57 · 120ms`
    pub fn summary_text(&self, shown: usize) -> String {
        let summary = &self.fetch_summary;
        let mut parts = Vec::new();
        if let (Some(page), Some(count)) = (summary.current_page, summary.page_count) {
            parts.push(format!("page {page}/{count}"));
        }
        if let Some(total) = summary.total_results {
            parts.push(format!("{shown} of {total}"));
        }
        if let Some(ms) = summary.duration_ms {
            parts.push(format!("{ms}ms"));
        }
        parts.join(" · ")
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}
