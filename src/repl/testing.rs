//! Testing infrastructure for catalog-driven components
//!
//! Provides a scripted catalog client and page fixtures so view models and the
//! controller can be exercised without a network.

use crate::repl::models::{Product, ProductsPage};
use crate::repl::services::catalog::{CatalogClient, FetchError, ProductsRequest};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

struct ScriptedResponse {
    result: Result<ProductsPage, FetchError>,
    gate: Option<Arc<Notify>>,
}

#[derive(Default)]
struct Script {
    responses: HashMap<(String, u32), VecDeque<ScriptedResponse>>,
    requests: Vec<ProductsRequest>,
}

/// Handle that lets a held response complete
#[derive(Clone)]
pub struct Gate(Arc<Notify>);

impl Gate {
    pub fn release(&self) {
        self.0.notify_one();
    }
}

/// Catalog client answering from a queue of scripted responses per (query, page)
///
/// Requests with nothing scripted fail with a `Request` error.
#[derive(Clone, Default)]
pub struct ScriptedCatalogClient {
    script: Arc<Mutex<Script>>,
}

impl ScriptedCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response that completes immediately
    pub fn respond(&self, query: &str, page: u32, result: Result<ProductsPage, FetchError>) {
        self.push(query, page, result, None);
    }

    /// Queue a response that completes only after the returned gate is released
    pub fn hold(&self, query: &str, page: u32, result: Result<ProductsPage, FetchError>) -> Gate {
        let notify = Arc::new(Notify::new());
        self.push(query, page, result, Some(notify.clone()));
        Gate(notify)
    }

    /// Every request issued so far, in order
    pub fn requests(&self) -> Vec<ProductsRequest> {
        self.script
            .lock()
            .map(|script| script.requests.clone())
            .unwrap_or_default()
    }

    fn push(
        &self,
        query: &str,
        page: u32,
        result: Result<ProductsPage, FetchError>,
        gate: Option<Arc<Notify>>,
    ) {
        if let Ok(mut script) = self.script.lock() {
            script
                .responses
                .entry((query.to_string(), page))
                .or_default()
                .push_back(ScriptedResponse { result, gate });
        }
    }
}

impl CatalogClient for ScriptedCatalogClient {
    fn fetch(
        &self,
        request: ProductsRequest,
    ) -> impl Future<Output = Result<ProductsPage, FetchError>> + Send + 'static {
        let scripted = self.script.lock().ok().and_then(|mut script| {
            script.requests.push(request.clone());
            script
                .responses
                .get_mut(&(request.query.clone(), request.page))
                .and_then(VecDeque::pop_front)
        });

        async move {
            match scripted {
                Some(ScriptedResponse { result, gate }) => {
                    if let Some(gate) = gate {
                        gate.notified().await;
                    }
                    result
                }
                None => Err(FetchError::Request(format!(
                    "No scripted response for '{}' page {}",
                    request.query, request.page
                ))),
            }
        }
    }
}

/// Product fixture named `label`
pub fn product(label: &str) -> Product {
    Product::new(
        label,
        format!("https://images.example.com/{}.png", label.replace(' ', "-")),
        9.99,
        vec!["Fast delivery".to_string()],
        4.5,
        10,
    )
}

/// Page `current` of `page_count` holding `len` products named `"p{current}-{i}"`
pub fn page_of(current: u32, page_count: u32, len: usize) -> ProductsPage {
    ProductsPage {
        products: (0..len)
            .map(|i| product(&format!("p{current}-{i}")))
            .collect(),
        current_page: current,
        page_size: len as u32,
        total_results: page_count * len as u32,
        page_count,
    }
}
