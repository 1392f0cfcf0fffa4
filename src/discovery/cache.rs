// src/discovery/cache.rs
//! Short-lived fetch cache keyed by URL.
//!
//! Shared by the pages one adapter fetches within a single process lifetime
//! so repeated discovery calls don't hammer the same portal. Owned
//! explicitly and injected into adapters, not a module-level static, so
//! tests can construct isolated instances. A miss just re-fetches; the cache
//! is never a correctness dependency.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct FetchCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl FetchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached body if it is younger than the TTL.
    pub fn get(&self, url: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(url)
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, body)| body.clone())
    }

    /// Last write wins.
    pub fn put(&self, url: &str, body: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(url.to_string(), (Instant::now(), body.to_string()));
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
