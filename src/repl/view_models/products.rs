//! # Products ViewModel
//!
//! Paginated search session: the active query, page counters, the pages
//! fetched so far and the Loading/Finished/Error status.
//!
//! Every fetch is issued under a new request generation. Issuing a fetch
//! aborts the previous one, and responses that do not carry the latest
//! generation are dropped without touching the session.

use crate::repl::events::{EventBus, ModelEvent};
use crate::repl::models::ProductsPage;
use crate::repl::services::{
    CatalogClient, CatalogResponse, CatalogService, FetchError, ProductsRequest,
};
use crate::repl::view_models::product_item::{GlyphSet, ProductItemViewModel};
use std::collections::BTreeMap;

/// Status of the search session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProductsState {
    /// A fetch is in flight
    Loading,
    /// Idle; the last fetch (if any) succeeded or was cancelled
    #[default]
    Finished,
    /// The last fetch failed
    Error(FetchError),
}

impl ProductsState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ProductsState::Loading)
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            ProductsState::Error(error) => Some(error),
            _ => None,
        }
    }
}

pub struct ProductsViewModel<C: CatalogClient> {
    catalog: CatalogService<C>,
    glyphs: GlyphSet,

    // Session
    query: String,
    current_page: u32,
    total_pages: u32,
    pages: BTreeMap<u32, ProductsPage>,
    products: Option<Vec<ProductItemViewModel>>,
    state: ProductsState,
    generation: u64,
    last_fetch: Option<(ProductsRequest, u64)>,

    // Event management
    event_bus: Option<Box<dyn EventBus>>,
    pending_model_events: Vec<ModelEvent>,
}

impl<C: CatalogClient> ProductsViewModel<C> {
    pub fn new(client: C, glyphs: GlyphSet) -> Self {
        Self {
            catalog: CatalogService::new(client),
            glyphs,
            query: String::new(),
            current_page: 0,
            total_pages: 1,
            pages: BTreeMap::new(),
            products: None,
            state: ProductsState::Finished,
            generation: 0,
            last_fetch: None,
            event_bus: None,
            pending_model_events: Vec::new(),
        }
    }

    pub fn set_event_bus(&mut self, event_bus: Box<dyn EventBus>) {
        self.event_bus = Some(event_bus);
    }

    pub fn client(&self) -> &C {
        self.catalog.client()
    }

    /// Start a new search: forget everything fetched so far and fetch page 1
    pub fn search(&mut self, query: &str) -> u64 {
        tracing::debug!("Starting search for '{}'", query);
        self.reset_data();
        self.emit_model_event(ModelEvent::SearchStarted {
            query: query.to_string(),
        });
        self.fetch_products(query, 1)
    }

    /// Fetch the page after the current one, unless the last page is loaded
    pub fn fetch_next_page(&mut self) -> Option<u64> {
        if !self.has_more_pages() {
            tracing::debug!(
                "No more pages for '{}' ({}/{})",
                self.query,
                self.current_page,
                self.total_pages
            );
            return None;
        }
        let query = self.query.clone();
        Some(self.fetch_products(&query, self.current_page + 1))
    }

    /// Issue a fetch for `page` of `query`; returns the request generation
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch_products(&mut self, query: &str, page: u32) -> u64 {
        self.query = query.to_string();
        self.generation += 1;
        let generation = self.generation;

        tracing::debug!(
            "Fetching page {} of '{}' (generation {})",
            page,
            query,
            generation
        );
        self.catalog
            .fetch_async(generation, ProductsRequest::new(query, page));

        self.emit_model_event(ModelEvent::PageRequested {
            query: query.to_string(),
            page,
            generation,
        });
        self.set_state(ProductsState::Loading);
        generation
    }

    /// Abort the in-flight fetch; returns false when nothing was loading
    pub fn cancel(&mut self) -> bool {
        if !self.state.is_loading() {
            return false;
        }
        self.catalog.cancel();
        // A response already queued for the aborted fetch becomes stale
        self.generation += 1;
        tracing::info!("Cancelled fetch for '{}'", self.query);
        self.set_state(ProductsState::Finished);
        true
    }

    /// Apply a delivered response; returns false when it was stale
    pub fn apply_response(&mut self, response: CatalogResponse) -> bool {
        if response.generation != self.generation {
            tracing::debug!(
                "Discarding stale response for page {} of '{}' (generation {}, latest {})",
                response.request.page,
                response.request.query,
                response.generation,
                self.generation
            );
            self.emit_model_event(ModelEvent::StaleResponseDiscarded {
                generation: response.generation,
            });
            return false;
        }

        self.last_fetch = Some((response.request, response.duration_ms));
        match response.result {
            Ok(page) => {
                self.current_page = page.current_page;
                self.total_pages = page.page_count;
                if self.pages.insert(page.current_page, page).is_some() {
                    tracing::debug!("Replaced page {}", self.current_page);
                }
                self.rebuild_products();
                self.set_state(ProductsState::Finished);
            }
            Err(error) => {
                tracing::warn!("Search for '{}' failed: {}", self.query, error);
                self.set_state(ProductsState::Error(error));
            }
        }
        true
    }

    /// Apply every response delivered so far without waiting; returns how
    /// many were applied (stale ones excluded)
    pub fn poll_responses(&mut self) -> usize {
        let mut applied = 0;
        while let Some(response) = self.catalog.poll_response() {
            if self.apply_response(response) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the running fetch to deliver and apply its response
    ///
    /// Stale responses met on the way are discarded. Returns false once
    /// nothing is in flight or queued without a current response applied.
    pub async fn wait_for_response(&mut self) -> bool {
        loop {
            let in_flight = self.catalog.is_in_flight();
            let response = match self.catalog.poll_response() {
                Some(response) => response,
                None if in_flight => match self.catalog.next_response().await {
                    Some(response) => response,
                    None => return false,
                },
                None => return false,
            };
            if self.apply_response(response) {
                return true;
            }
        }
    }

    /// Adapted product list: all stored pages flattened in page order.
    /// `None` until the first search.
    pub fn products(&self) -> Option<&[ProductItemViewModel]> {
        self.products.as_deref()
    }

    pub fn product(&self, index: usize) -> Option<&ProductItemViewModel> {
        self.products.as_ref()?.get(index)
    }

    pub fn product_count(&self) -> usize {
        self.products.as_ref().map_or(0, Vec::len)
    }

    pub fn state(&self) -> &ProductsState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn pages(&self) -> &BTreeMap<u32, ProductsPage> {
        &self.pages
    }

    /// Total results reported by the most recent page
    pub fn total_results(&self) -> Option<u32> {
        self.pages.get(&self.current_page).map(|page| page.total_results)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_fetching(&self) -> bool {
        self.catalog.is_in_flight()
    }

    /// Request and round trip time of the last applied response
    pub fn last_fetch(&self) -> Option<&(ProductsRequest, u64)> {
        self.last_fetch.as_ref()
    }

    /// Collect and clear model events emitted since the last call
    pub fn take_model_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.pending_model_events)
    }

    fn reset_data(&mut self) {
        self.current_page = 0;
        self.total_pages = 1;
        self.pages.clear();
        if let Some(products) = self.products.as_mut() {
            products.clear();
            self.emit_model_event(ModelEvent::ProductsChanged { count: 0 });
        }
    }

    fn rebuild_products(&mut self) {
        let products: Vec<_> = self
            .pages
            .values()
            .flat_map(|page| page.products.iter())
            .map(|product| ProductItemViewModel::new(product.clone(), self.glyphs))
            .collect();
        let count = products.len();
        self.products = Some(products);
        tracing::debug!("Product list rebuilt from {} pages: {} items", self.pages.len(), count);
        self.emit_model_event(ModelEvent::ProductsChanged { count });
    }

    fn set_state(&mut self, state: ProductsState) {
        if self.state == state {
            return;
        }
        tracing::debug!("Search state {:?} -> {:?}", self.state, state);
        self.state = state.clone();
        self.emit_model_event(ModelEvent::StateChanged { state });
    }

    fn emit_model_event(&mut self, event: ModelEvent) {
        if let Some(bus) = self.event_bus.as_mut() {
            bus.publish(&event);
        }
        self.pending_model_events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repl::events::SimpleEventBus;
    use crate::repl::testing::{page_of, ScriptedCatalogClient};
    use std::sync::{Arc, Mutex};

    fn view_model(client: &ScriptedCatalogClient) -> ProductsViewModel<ScriptedCatalogClient> {
        ProductsViewModel::new(client.clone(), GlyphSet::default())
    }

    fn names(vm: &ProductsViewModel<ScriptedCatalogClient>) -> Vec<String> {
        vm.products()
            .unwrap_or_default()
            .iter()
            .map(|item| item.name().to_string())
            .collect()
    }

    #[test]
    fn initial_state_should_be_finished_and_empty() {
        let client = ScriptedCatalogClient::new();
        let vm = view_model(&client);

        assert_eq!(vm.state(), &ProductsState::Finished);
        assert!(vm.products().is_none());
        assert_eq!(vm.product_count(), 0);
        assert_eq!(vm.current_page(), 0);
        assert_eq!(vm.total_pages(), 1);
        assert!(vm.has_more_pages());
        assert_eq!(vm.query(), "");
    }

    #[tokio::test]
    async fn search_then_scroll_then_refetch_should_track_pages() {
        let client = ScriptedCatalogClient::new();
        client.respond("phone", 1, Ok(page_of(1, 3, 20)));
        client.respond("phone", 2, Ok(page_of(2, 3, 20)));
        client.respond("phone", 1, Ok(page_of(1, 3, 15)));
        let mut vm = view_model(&client);

        vm.search("phone");
        assert_eq!(vm.state(), &ProductsState::Loading);
        assert!(vm.wait_for_response().await);
        assert_eq!(vm.state(), &ProductsState::Finished);
        assert_eq!(vm.product_count(), 20);
        assert_eq!((vm.current_page(), vm.total_pages()), (1, 3));

        assert!(vm.fetch_next_page().is_some());
        assert!(vm.wait_for_response().await);
        assert_eq!(vm.product_count(), 40);
        assert_eq!(vm.current_page(), 2);

        vm.fetch_products("phone", 1);
        assert!(vm.wait_for_response().await);
        assert_eq!(vm.product_count(), 35);
        assert_eq!(vm.pages().len(), 2);
        assert_eq!(vm.pages()[&1].products.len(), 15);

        let names = names(&vm);
        assert_eq!(names[0], "p1-0");
        assert_eq!(names[14], "p1-14");
        assert_eq!(names[15], "p2-0");

        assert_eq!(
            client.requests(),
            vec![
                ProductsRequest::new("phone", 1),
                ProductsRequest::new("phone", 2),
                ProductsRequest::new("phone", 1),
            ]
        );
    }

    #[tokio::test]
    async fn fetch_next_page_should_stop_at_last_page() {
        let client = ScriptedCatalogClient::new();
        client.respond("tv", 1, Ok(page_of(1, 1, 5)));
        let mut vm = view_model(&client);

        vm.search("tv");
        vm.wait_for_response().await;
        assert!(!vm.has_more_pages());

        let generation = vm.generation();
        assert_eq!(vm.fetch_next_page(), None);
        assert_eq!(vm.generation(), generation);
        assert_eq!(vm.state(), &ProductsState::Finished);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn new_search_should_reset_session_before_fetching() {
        let client = ScriptedCatalogClient::new();
        client.respond("phone", 1, Ok(page_of(1, 3, 20)));
        let laptop_gate = client.hold("laptop", 1, Ok(page_of(1, 2, 4)));
        let mut vm = view_model(&client);

        vm.search("phone");
        vm.wait_for_response().await;
        assert_eq!(vm.product_count(), 20);

        vm.search("laptop");
        assert_eq!(vm.query(), "laptop");
        assert_eq!(vm.state(), &ProductsState::Loading);
        assert_eq!(vm.current_page(), 0);
        assert_eq!(vm.total_pages(), 1);
        assert!(vm.pages().is_empty());
        // The list is cleared, not dropped
        assert_eq!(vm.products().map(<[_]>::len), Some(0));

        laptop_gate.release();
        assert!(vm.wait_for_response().await);
        assert_eq!(vm.product_count(), 4);
        assert_eq!((vm.current_page(), vm.total_pages()), (1, 2));
    }

    #[tokio::test]
    async fn fetch_failure_should_keep_products_and_report_error() {
        let client = ScriptedCatalogClient::new();
        client.respond("phone", 1, Ok(page_of(1, 3, 20)));
        let failure = FetchError::Status {
            status: 500,
            message: "Internal Server Error".to_string(),
        };
        client.respond("phone", 2, Err(failure.clone()));
        let mut vm = view_model(&client);

        vm.search("phone");
        vm.wait_for_response().await;
        vm.fetch_next_page();
        vm.wait_for_response().await;

        assert_eq!(vm.state(), &ProductsState::Error(failure.clone()));
        assert_eq!(vm.state().error(), Some(&failure));
        assert_eq!(vm.product_count(), 20);
        assert_eq!(vm.current_page(), 1);

        // Error -> Loading on the next attempt
        client.respond("phone", 2, Ok(page_of(2, 3, 20)));
        vm.fetch_next_page();
        assert_eq!(vm.state(), &ProductsState::Loading);
        vm.wait_for_response().await;
        assert_eq!(vm.product_count(), 40);
    }

    #[tokio::test]
    async fn products_should_follow_page_order_not_arrival_order() {
        let client = ScriptedCatalogClient::new();
        client.respond("tv", 2, Ok(page_of(2, 2, 3)));
        client.respond("tv", 1, Ok(page_of(1, 2, 2)));
        let mut vm = view_model(&client);

        vm.fetch_products("tv", 2);
        vm.wait_for_response().await;
        vm.fetch_products("tv", 1);
        vm.wait_for_response().await;

        assert_eq!(names(&vm), vec!["p1-0", "p1-1", "p2-0", "p2-1", "p2-2"]);
    }

    #[tokio::test]
    async fn stale_response_should_be_discarded() {
        let client = ScriptedCatalogClient::new();
        client.respond("phone", 1, Ok(page_of(1, 3, 20)));
        let mut vm = view_model(&client);

        let first = vm.search("phone");
        // Let the first fetch deliver before it is superseded
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let _gate = client.hold("laptop", 1, Ok(page_of(1, 1, 2)));
        let second = vm.search("laptop");
        assert!(second > first);

        assert_eq!(vm.poll_responses(), 0);
        assert_eq!(vm.state(), &ProductsState::Loading);
        assert_eq!(vm.product_count(), 0);
        assert!(vm
            .take_model_events()
            .contains(&ModelEvent::StaleResponseDiscarded { generation: first }));
    }

    #[tokio::test]
    async fn wait_should_skip_superseded_response_and_apply_latest() {
        let client = ScriptedCatalogClient::new();
        client.respond("phone", 1, Ok(page_of(1, 3, 20)));
        client.respond("laptop", 1, Ok(page_of(1, 1, 2)));
        let mut vm = view_model(&client);

        vm.search("phone");
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        vm.search("laptop");

        assert!(vm.wait_for_response().await);
        assert_eq!(vm.state(), &ProductsState::Finished);
        assert_eq!(vm.query(), "laptop");
        assert_eq!(vm.product_count(), 2);
        assert!(!vm.wait_for_response().await);
    }

    #[tokio::test]
    async fn apply_response_should_reject_other_generations() {
        let client = ScriptedCatalogClient::new();
        let _gate = client.hold("tv", 1, Ok(page_of(1, 1, 1)));
        let mut vm = view_model(&client);
        let generation = vm.fetch_products("tv", 1);

        let stale = CatalogResponse {
            generation: generation - 1,
            request: ProductsRequest::new("tv", 1),
            result: Ok(page_of(1, 1, 9)),
            duration_ms: 3,
        };
        assert!(!vm.apply_response(stale));
        assert!(vm.products().is_none());

        let current = CatalogResponse {
            generation,
            request: ProductsRequest::new("tv", 1),
            result: Ok(page_of(1, 1, 9)),
            duration_ms: 3,
        };
        assert!(vm.apply_response(current));
        assert_eq!(vm.product_count(), 9);
        assert_eq!(vm.last_fetch(), Some(&(ProductsRequest::new("tv", 1), 3)));
        assert_eq!(vm.total_results(), Some(9));
    }

    #[tokio::test]
    async fn cancel_should_abort_loading_fetch() {
        let client = ScriptedCatalogClient::new();
        let gate = client.hold("phone", 1, Ok(page_of(1, 3, 20)));
        let mut vm = view_model(&client);

        vm.search("phone");
        tokio::task::yield_now().await;
        assert!(vm.cancel());
        assert_eq!(vm.state(), &ProductsState::Finished);
        assert!(!vm.is_fetching());

        gate.release();
        tokio::task::yield_now().await;
        assert!(!vm.wait_for_response().await);
        assert!(vm.products().is_none());

        // Nothing to cancel any more
        assert!(!vm.cancel());
    }

    #[tokio::test]
    async fn event_bus_should_observe_session_events() {
        let client = ScriptedCatalogClient::new();
        client.respond("phone", 1, Ok(page_of(1, 1, 2)));
        let mut vm = view_model(&client);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut bus = SimpleEventBus::new();
        bus.subscribe(Box::new(move |event| sink.lock().unwrap().push(event.clone())));
        vm.set_event_bus(Box::new(bus));

        let generation = vm.search("phone");
        vm.wait_for_response().await;

        let expected = vec![
            ModelEvent::SearchStarted {
                query: "phone".to_string(),
            },
            ModelEvent::PageRequested {
                query: "phone".to_string(),
                page: 1,
                generation,
            },
            ModelEvent::StateChanged {
                state: ProductsState::Loading,
            },
            ModelEvent::ProductsChanged { count: 2 },
            ModelEvent::StateChanged {
                state: ProductsState::Finished,
            },
        ];
        assert_eq!(*seen.lock().unwrap(), expected);
        assert_eq!(vm.take_model_events(), expected);
        assert!(vm.take_model_events().is_empty());
    }
}
