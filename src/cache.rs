use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::analyzer::PageSummary;

#[derive(Debug, Clone)]
pub struct CachedSummary {
    pub summary: PageSummary,
    pub cached_at: DateTime<Utc>,
}

impl CachedSummary {
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.cached_at < ttl
    }
}

/// Key/value store for finished summaries, keyed by normalized URL.
pub trait SummaryCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedSummary>;
    fn set(&self, key: String, summary: PageSummary);
}

#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CachedSummary>>,
    /// Entries older than this are dropped on the next `set`.
    ttl: Option<Duration>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        InMemoryCache {
            entries: Mutex::default(),
            ttl: Some(ttl),
        }
    }
}

impl SummaryCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<CachedSummary> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: String, summary: PageSummary) {
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ttl) = self.ttl {
            entries.retain(|_, entry| entry.is_fresh(ttl, now));
        }
        entries.insert(
            key,
            CachedSummary {
                summary,
                cached_at: now,
            },
        );
    }
}
