//! # Image Service
//!
//! Loads product images as raw bytes, consulting the shared cache first and
//! fetching over HTTP on a miss. Fetched images are cached when their response
//! is drained, on the owner's thread.

use crate::config::CatalogProfile;
use crate::repl::services::catalog::FetchError;
use crate::repl::services::image_cache::SharedImageCache;
use anyhow::{Context, Result};
use bytes::Bytes;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;

/// Outcome of asking for an image
#[derive(Debug, Clone, PartialEq)]
pub enum ImageLoad {
    /// Served from the cache
    Cached(Bytes),
    /// A fetch is running; the bytes arrive through `poll_response`
    Pending,
    /// Nothing to load (empty path)
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct ImageResponse {
    pub url: String,
    pub result: Result<Bytes, FetchError>,
}

pub struct ImageService {
    client: reqwest::Client,
    cache: SharedImageCache,
    pending: HashSet<String>,
    response_receiver: mpsc::UnboundedReceiver<ImageResponse>,
    response_sender: mpsc::UnboundedSender<ImageResponse>,
}

impl ImageService {
    pub fn new(profile: &CatalogProfile, cache: SharedImageCache) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(profile.timeout_secs))
            .user_agent(profile.user_agent.clone())
            .build()
            .context("Failed to create image HTTP client")?;
        let (response_sender, response_receiver) = mpsc::unbounded_channel();
        Ok(Self {
            client,
            cache,
            pending: HashSet::new(),
            response_receiver,
            response_sender,
        })
    }

    pub fn cache(&self) -> &SharedImageCache {
        &self.cache
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.pending.contains(url)
    }

    /// Serve `url` from the cache or start fetching it
    ///
    /// Must be called from within a tokio runtime.
    pub fn load(&mut self, url: &str) -> ImageLoad {
        if url.trim().is_empty() {
            return ImageLoad::Unavailable;
        }

        if let Some(bytes) = self.cached(url) {
            tracing::debug!("Image cache hit for {}", url);
            return ImageLoad::Cached(bytes);
        }

        if !self.pending.insert(url.to_string()) {
            return ImageLoad::Pending;
        }

        tracing::debug!("Image cache miss for {}, fetching", url);
        let client = self.client.clone();
        let sender = self.response_sender.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            let result = fetch_bytes(&client, &url).await;
            if let Err(e) = &result {
                tracing::warn!("Image fetch for {} failed: {}", url, e);
            }
            let _ = sender.send(ImageResponse { url, result });
        });
        ImageLoad::Pending
    }

    /// Drain one finished fetch, caching its bytes on success
    pub fn poll_response(&mut self) -> Option<ImageResponse> {
        let response = self.response_receiver.try_recv().ok()?;
        Some(self.complete(response))
    }

    pub async fn next_response(&mut self) -> Option<ImageResponse> {
        let response = self.response_receiver.recv().await?;
        Some(self.complete(response))
    }

    fn complete(&mut self, response: ImageResponse) -> ImageResponse {
        self.pending.remove(&response.url);
        if let Ok(bytes) = &response.result {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(response.url.clone(), bytes.clone());
            }
        }
        response
    }

    fn cached(&self, url: &str) -> Option<Bytes> {
        // A poisoned cache is treated as a miss
        self.cache.lock().ok()?.get(url)
    }
}

async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Bytes, FetchError> {
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
    response.bytes().await.map_err(|e| FetchError::from_chain(&e))
}
