//! Master playlist rewriting.
//!
//! Variant URIs and `EXT-X-MEDIA` URI attributes are replaced with
//! self-referential URLs so the player re-enters this gateway for each
//! rendition, carrying whatever request parameters are needed to derive a
//! consistent playlist. Indices are assigned walking variants first, then
//! `EXT-X-MEDIA` tags, matching how variant requests select a rendition.

use crate::hls::playlist::Playlist;
use crate::hls::tag::names;
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Vod,
    Live,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Vod => "vod",
            Mode::Live => "live",
        }
    }
}

/// Request parameters propagated into the rewritten variant URLs.
#[derive(Debug, Default)]
pub struct RewriteQuery<'a> {
    pub stream: Option<&'a str>,
    pub start_ms: Option<i64>,
    pub duration: Option<f64>,
    pub ad: Option<&'a str>,
}

pub fn rewrite_master(master: &Playlist, mode: Mode, query: &RewriteQuery) -> Playlist {
    let mut out = master.clone();
    let mut index = 0usize;

    for variant in &mut out.variants {
        variant.uri = entry_url(mode, index, query);
        index += 1;
    }

    for tag in &mut out.tags {
        if tag.name() == names::MEDIA && tag.attribute("URI").is_some() {
            let url = entry_url(mode, index, query);
            tag.set_attribute("URI", url);
            index += 1;
        }
    }

    out
}

fn entry_url(mode: Mode, index: usize, query: &RewriteQuery) -> String {
    let mut qs = form_urlencoded::Serializer::new(String::new());
    qs.append_pair("variant", &index.to_string());
    if let Some(stream) = query.stream {
        qs.append_pair("stream", stream);
    }
    if let Some(start_ms) = query.start_ms {
        qs.append_pair("start", &start_ms.to_string());
    }
    if let Some(duration) = query.duration {
        qs.append_pair("duration", &duration.to_string());
    }
    if let Some(ad) = query.ad {
        qs.append_pair("ad", ad);
    }
    format!("/{}.m3u8?{}", mode.as_str(), qs.finish())
}
