pub mod analyzer;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;

use std::sync::Arc;

use analyzer::Analyzer;
use cache::{InMemoryCache, SummaryCache};
use config::Config;
use error::Result;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: Arc<Analyzer>,
    pub cache: Arc<dyn SummaryCache>,
}

impl AppState {
    /// Wires the reqwest-backed analyzer and an empty in-memory cache that
    /// expires entries after `cache_ttl`.
    pub fn from_config(config: Config) -> Result<Self> {
        let analyzer = Analyzer::from_config(&config)?;
        // Zero disables lookups; a TTL too large for chrono never expires.
        let cache = match chrono::Duration::from_std(config.cache_ttl) {
            Ok(ttl) if !config.cache_ttl.is_zero() => InMemoryCache::with_ttl(ttl),
            _ => InMemoryCache::new(),
        };
        Ok(AppState {
            config: Arc::new(config),
            analyzer: Arc::new(analyzer),
            cache: Arc::new(cache),
        })
    }
}
