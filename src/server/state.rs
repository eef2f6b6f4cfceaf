use crate::cache::ManifestCache;
use crate::config::Config;
use crate::fetch::{HttpFetcher, ManifestFetcher};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Upstream playlist fetcher (trait object so tests can stub it)
    pub fetcher: Arc<dyn ManifestFetcher>,
    /// Process-wide parsed-manifest cache
    pub cache: ManifestCache,
}

impl AppState {
    /// Create an AppState backed by the real HTTP fetcher.
    pub fn new(config: Config) -> Self {
        let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(
            config.fetch_timeout_secs,
        )));
        Self::with_fetcher(config, fetcher)
    }

    /// Create an AppState with an injected fetcher.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn ManifestFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            cache: ManifestCache::new(),
        }
    }
}
