//! Upstream manifest resolution.
//!
//! Bridges the fetcher, parser, and cache: a master request fetches and
//! caches the root playlist; a variant request selects a rendition URI
//! from the cached master (variants first, then `EXT-X-MEDIA` entries),
//! resolves it against the master URL, and fetches and caches the media
//! playlist with its own URL as the base so segment and map URIs
//! normalize to absolute form. A playlist enters the cache only after a
//! successful parse.

use crate::cache::{ManifestCache, Rendition};
use crate::error::{ReliveError, Result};
use crate::fetch::ManifestFetcher;
use crate::hls::parser;
use crate::hls::playlist::{Playlist, PlaylistKind};
use crate::hls::tag::names;
use std::sync::Arc;
use tracing::info;

/// Fetch (or reuse) the parsed root playlist for `url`. Despite the name
/// this may turn out to be a media playlist; callers branch on `kind`.
pub async fn master_playlist(
    fetcher: &dyn ManifestFetcher,
    cache: &ManifestCache,
    url: &str,
) -> Result<Arc<Playlist>> {
    if let Some(cached) = cache.get(url, Rendition::Master) {
        return Ok(cached);
    }

    info!("fetching upstream master: {}", url);
    let body = fetcher.fetch(url).await?;
    let parsed = parser::parse(&body, url)?;
    Ok(cache.put(url, Rendition::Master, parsed))
}

/// Fetch (or reuse) the media playlist for rendition `index` of the master
/// at `url`. When the root is already a media playlist it is served
/// directly and the index is ignored.
pub async fn media_playlist(
    fetcher: &dyn ManifestFetcher,
    cache: &ManifestCache,
    url: &str,
    index: usize,
) -> Result<Arc<Playlist>> {
    let master = master_playlist(fetcher, cache, url).await?;
    if master.kind == PlaylistKind::Media {
        return Ok(master);
    }

    if let Some(cached) = cache.get(url, Rendition::Variant(index)) {
        return Ok(cached);
    }

    let target = select_rendition_uri(&master, index)?;
    let resolved = parser::resolve_uri(&target, &master.source_url);

    info!("fetching upstream variant {}: {}", index, resolved);
    let body = fetcher.fetch(&resolved).await?;
    let parsed = parser::parse(&body, &resolved)?;
    Ok(cache.put(url, Rendition::Variant(index), parsed))
}

/// The rendition URI space: variant URIs in order, then `EXT-X-MEDIA` URI
/// attributes in tag order.
fn select_rendition_uri(master: &Playlist, index: usize) -> Result<String> {
    let mut uris: Vec<&str> = master.variants.iter().map(|v| v.uri.as_str()).collect();
    for tag in &master.tags {
        if tag.name() == names::MEDIA {
            if let Some(uri) = tag.attribute("URI") {
                uris.push(uri);
            }
        }
    }

    uris.get(index)
        .map(|uri| uri.to_string())
        .ok_or(ReliveError::VariantIndex {
            index,
            available: uris.len(),
        })
}
