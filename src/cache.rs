//! Process-wide parsed-manifest cache.
//!
//! Keyed by (source URL, rendition discriminator). Entries are canonical
//! parsed playlists and are treated as immutable once inserted; request
//! handlers deep-clone before transforming. There is no eviction and no
//! TTL: memory grows with the number of distinct (URL, rendition) pairs
//! served. Two requests racing on the same miss may both fetch; the last
//! writer wins with an equal tree.

use crate::hls::playlist::Playlist;
use crate::metrics;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Which rendition of a source a cache entry holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rendition {
    Master,
    Variant(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    url: String,
    rendition: Rendition,
}

#[derive(Clone, Debug)]
pub struct ManifestCache {
    entries: Arc<DashMap<CacheKey, Arc<Playlist>>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, url: &str, rendition: Rendition) -> Option<Arc<Playlist>> {
        let key = CacheKey {
            url: url.to_string(),
            rendition,
        };
        match self.entries.get(&key) {
            Some(entry) => {
                debug!("manifest cache HIT for {} {:?}", key.url, key.rendition);
                metrics::record_cache_lookup("hit");
                Some(Arc::clone(&entry))
            }
            None => {
                debug!("manifest cache MISS for {} {:?}", key.url, key.rendition);
                metrics::record_cache_lookup("miss");
                None
            }
        }
    }

    /// Insert a freshly parsed playlist and hand back the shared handle.
    pub fn put(&self, url: &str, rendition: Rendition, playlist: Playlist) -> Arc<Playlist> {
        let key = CacheKey {
            url: url.to_string(),
            rendition,
        };
        let entry = Arc::new(playlist);
        self.entries.insert(key, Arc::clone(&entry));
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Test hook.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for ManifestCache {
    fn default() -> Self {
        Self::new()
    }
}
