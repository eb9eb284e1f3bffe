//! Response freshness cache.
//!
//! Successful response bodies are kept by request URL for a fixed time to
//! live. A fresh hit skips the network entirely. Not-found answers are never
//! stored, so a resource that appears later is picked up on the next call.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Storage for response bodies keyed by URL.
pub trait ResponseCache: Send + Sync {
    /// The cached body for `url`, if present and still fresh.
    fn get(&self, url: &str) -> Option<String>;
    fn set(&self, url: &str, body: String);
    /// Drop every entry older than the time to live.
    fn expire(&self);
}

struct Entry {
    stored: Instant,
    body: String,
}

/// In-process cache with a fixed time to live.
pub struct MemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, url: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(url)?;
        (entry.stored.elapsed() < self.ttl).then(|| entry.body.clone())
    }

    fn set(&self, url: &str, body: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                url.to_string(),
                Entry {
                    stored: Instant::now(),
                    body,
                },
            );
        }
    }

    fn expire(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.stored.elapsed() < ttl);
        }
    }
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl ResponseCache for NoCache {
    fn get(&self, _url: &str) -> Option<String> {
        None
    }

    fn set(&self, _url: &str, _body: String) {}

    fn expire(&self) {}
}
