//! # Image Cache
//!
//! In-memory image bytes keyed by URL, bounded by a byte budget with
//! least-recently-used eviction. The cache is advisory: callers must be ready
//! to re-fetch on any miss.

use bytes::Bytes;
use lru::LruCache;
use std::sync::{Arc, Mutex};

/// Cache shared between the image service and whoever owns it
pub type SharedImageCache = Arc<Mutex<ImageCache>>;

#[derive(Debug)]
pub struct ImageCache {
    entries: LruCache<String, Bytes>,
    total_bytes: usize,
    capacity_bytes: usize,
}

impl ImageCache {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            total_bytes: 0,
            capacity_bytes,
        }
    }

    pub fn shared(capacity_bytes: usize) -> SharedImageCache {
        Arc::new(Mutex::new(Self::new(capacity_bytes)))
    }

    /// Look up an image, marking it most recently used
    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        self.entries.get(key).cloned()
    }

    /// Store an image, evicting least recently used entries until the budget fits.
    ///
    /// Returns false when the image alone exceeds the budget; it is not stored
    /// and any previous entry for the key is dropped.
    pub fn put(&mut self, key: impl Into<String>, bytes: Bytes) -> bool {
        let key = key.into();
        let size = bytes.len();

        if size > self.capacity_bytes {
            tracing::debug!(
                "Image {} ({} bytes) exceeds cache budget of {} bytes",
                key,
                size,
                self.capacity_bytes
            );
            if let Some(old) = self.entries.pop(&key) {
                self.total_bytes -= old.len();
            }
            return false;
        }

        if let Some((_, old)) = self.entries.push(key, bytes) {
            self.total_bytes -= old.len();
        }
        self.total_bytes += size;

        while self.total_bytes > self.capacity_bytes {
            match self.entries.pop_lru() {
                Some((evicted, old)) => {
                    tracing::debug!("Evicting image {} ({} bytes)", evicted, old.len());
                    self.total_bytes -= old.len();
                }
                None => break,
            }
        }
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
    }
}
