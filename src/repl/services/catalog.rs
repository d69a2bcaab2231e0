//! # Catalog Service
//!
//! Fetches pages of search results from the remote catalog.
//!
//! Fetches run as tokio tasks. Each result comes back through an internal
//! channel tagged with the generation it was issued under, so the owner can
//! drain responses on its own thread and drop the ones it no longer wants.

use crate::config::CatalogProfile;
use crate::repl::models::ProductsPage;
use anyhow::{Context, Result};
use reqwest::Url;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Why a catalog (or image) fetch failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid catalog response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Flatten an error and its causes into a `Request` failure
    pub fn from_chain(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(&format!("\n  Caused by: {cause}"));
            source = cause.source();
        }
        FetchError::Request(message)
    }
}

/// A search query and the page to fetch for it (pages start at 1)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductsRequest {
    pub query: String,
    pub page: u32,
}

impl ProductsRequest {
    pub fn new(query: impl Into<String>, page: u32) -> Self {
        Self {
            query: query.into(),
            page,
        }
    }
}

/// Anything that can answer a catalog search
pub trait CatalogClient: Send + Sync + 'static {
    fn fetch(
        &self,
        request: ProductsRequest,
    ) -> impl Future<Output = Result<ProductsPage, FetchError>> + Send + 'static;
}

/// Catalog client talking to the HTTP search endpoint
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCatalogClient {
    pub fn new(profile: &CatalogProfile) -> Result<Self> {
        tracing::debug!("Creating catalog client for {}", profile.catalog_url);
        let base_url = Url::parse(&profile.catalog_url)
            .with_context(|| format!("Invalid catalog URL '{}'", profile.catalog_url))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(profile.timeout_secs))
            .user_agent(profile.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}?query={query}&page={page}`, keeping any parameters already on the base URL
    pub fn request_url(&self, request: &ProductsRequest) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("query", &request.query)
            .append_pair("page", &request.page.to_string());
        url
    }
}

impl CatalogClient for HttpCatalogClient {
    fn fetch(
        &self,
        request: ProductsRequest,
    ) -> impl Future<Output = Result<ProductsPage, FetchError>> + Send + 'static {
        let client = self.client.clone();
        let url = self.request_url(&request);

        async move {
            tracing::debug!("GET {}", url);
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::from_chain(&e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("").to_string(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::from_chain(&e))?;
            serde_json::from_slice::<ProductsPage>(&body)
                .map_err(|e| FetchError::Decode(e.to_string()))
        }
    }
}

/// Message delivered for every completed fetch
#[derive(Debug, Clone)]
pub struct CatalogResponse {
    pub generation: u64,
    pub request: ProductsRequest,
    pub result: Result<ProductsPage, FetchError>,
    pub duration_ms: u64,
}

/// Runs catalog fetches in the background and hands results back over a channel
pub struct CatalogService<C: CatalogClient> {
    client: C,
    in_flight: Option<JoinHandle<()>>,
    response_receiver: mpsc::UnboundedReceiver<CatalogResponse>,
    response_sender: mpsc::UnboundedSender<CatalogResponse>,
}

impl<C: CatalogClient> CatalogService<C> {
    pub fn new(client: C) -> Self {
        let (response_sender, response_receiver) = mpsc::unbounded_channel();
        Self {
            client,
            in_flight: None,
            response_receiver,
            response_sender,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Spawn a fetch for `request`, aborting whichever fetch was still running
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch_async(&mut self, generation: u64, request: ProductsRequest) {
        self.cancel();

        let fetch = self.client.fetch(request.clone());
        let sender = self.response_sender.clone();

        self.in_flight = Some(tokio::spawn(async move {
            let started = Instant::now();
            let result = fetch.await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(page) => tracing::info!(
                    "Fetched page {}/{} for '{}' ({} products, {}ms)",
                    page.current_page,
                    page.page_count,
                    request.query,
                    page.products.len(),
                    duration_ms
                ),
                Err(e) => tracing::error!("Catalog fetch for '{}' failed: {}", request.query, e),
            }

            // Receiver lives as long as the service; a closed channel means shutdown.
            let _ = sender.send(CatalogResponse {
                generation,
                request,
                result,
                duration_ms,
            });
        }));
    }

    /// Abort the running fetch; returns true if one was still running
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Non-blocking check for a delivered response
    pub fn poll_response(&mut self) -> Option<CatalogResponse> {
        self.response_receiver.try_recv().ok()
    }

    /// Wait for the next delivered response
    pub async fn next_response(&mut self) -> Option<CatalogResponse> {
        self.response_receiver.recv().await
    }
}
