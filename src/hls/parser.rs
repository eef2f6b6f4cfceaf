//! M3U8 text parser.
//!
//! Lossy only for tags outside the recognized set, and even those keep
//! their raw line so the encoder can re-emit them untouched. Segment URIs
//! and `EXT-X-MAP` URIs are resolved to absolute form against the source
//! URL at ingest; variant URIs are left as-is for the master rewriter.

use crate::error::{ReliveError, Result};
use crate::hls::playlist::{Playlist, PlaylistKind, Segment, Variant};
use crate::hls::tag::{names, Tag};
use tracing::debug;
use url::Url;

/// Per-segment tags: they decorate the open segment context, or are
/// buffered for the next segment when none is open.
const SEGMENT_TAGS: &[&str] = &[
    names::DISCONTINUITY,
    names::KEY,
    names::MAP,
    names::PROGRAM_DATE_TIME,
    names::BYTERANGE,
    names::DATERANGE,
];

/// Parse a playlist body fetched from `source_url`.
pub fn parse(body: &str, source_url: &str) -> Result<Playlist> {
    let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());

    match lines.next() {
        Some(first) if first.starts_with("#EXTM3U") => {}
        _ => {
            return Err(ReliveError::Parse(
                "first line is not #EXTM3U".to_string(),
            ))
        }
    }

    let mut playlist = Playlist::empty(PlaylistKind::Media, source_url);
    let mut is_master = false;
    let mut pending: Vec<Tag> = Vec::new();
    let mut open_segment: Option<Segment> = None;
    let mut open_variant: Option<Vec<Tag>> = None;

    for line in lines {
        if line.starts_with('#') {
            let mut tag = Tag::parse(line);
            // Owned copy: several arms below move or mutate the tag.
            let tag_name = tag.name().to_string();
            match tag_name.as_str() {
                names::EXTM3U => {}
                names::STREAM_INF => {
                    is_master = true;
                    let mut tags = std::mem::take(&mut pending);
                    tags.push(tag);
                    open_variant = Some(tags);
                }
                names::EXTINF => {
                    let (duration, title) = parse_extinf(&tag)?;
                    let mut tags = std::mem::take(&mut pending);
                    let discontinuity =
                        tags.iter().any(|t| t.name() == names::DISCONTINUITY);
                    tags.push(tag);
                    open_segment = Some(Segment {
                        duration,
                        title,
                        uri: String::new(),
                        discontinuity,
                        tags,
                    });
                }
                names::MEDIA => {
                    is_master = true;
                    playlist.tags.push(tag);
                }
                names::VERSION => {
                    playlist.version = tag.value().and_then(|v| v.parse().ok());
                    playlist.tags.push(tag);
                }
                names::INDEPENDENT_SEGMENTS => {
                    playlist.independent_segments = true;
                    playlist.tags.push(tag);
                }
                name if SEGMENT_TAGS.contains(&name) => {
                    if tag.name() == names::MAP {
                        resolve_map_uri(&mut tag, source_url);
                    }
                    match open_segment.as_mut() {
                        Some(segment) => {
                            if tag.name() == names::DISCONTINUITY {
                                segment.discontinuity = true;
                            }
                            segment.tags.push(tag);
                        }
                        None => pending.push(tag),
                    }
                }
                _ => {
                    if let Some(segment) = open_segment.as_mut() {
                        segment.tags.push(tag);
                    } else if let Some(variant_tags) = open_variant.as_mut() {
                        variant_tags.push(tag);
                    } else {
                        playlist.tags.push(tag);
                    }
                }
            }
        } else if let Some(mut segment) = open_segment.take() {
            segment.uri = resolve_uri(line, source_url);
            playlist.segments.push(segment);
        } else if let Some(tags) = open_variant.take() {
            playlist.variants.push(build_variant(line, tags)?);
        } else {
            return Err(ReliveError::Parse(format!(
                "URI line '{line}' without an open EXTINF or EXT-X-STREAM-INF context"
            )));
        }
    }

    if open_segment.is_some() {
        return Err(ReliveError::Parse(
            "EXTINF without a following URI line".to_string(),
        ));
    }
    if open_variant.is_some() {
        return Err(ReliveError::Parse(
            "EXT-X-STREAM-INF without a following URI line".to_string(),
        ));
    }
    if is_master && !playlist.segments.is_empty() {
        return Err(ReliveError::Parse(
            "playlist mixes variants and segments".to_string(),
        ));
    }

    playlist.kind = if is_master {
        PlaylistKind::Master
    } else {
        PlaylistKind::Media
    };

    debug!(
        "parsed {} playlist: {} segments, {} variants",
        if is_master { "master" } else { "media" },
        playlist.segments.len(),
        playlist.variants.len()
    );

    Ok(playlist)
}

/// `EXTINF:DURATION[,TITLE]`
fn parse_extinf(tag: &Tag) -> Result<(f64, Option<String>)> {
    let tail = tag
        .value()
        .ok_or_else(|| ReliveError::Parse("EXTINF without a duration".to_string()))?;
    let (duration, title) = match tail.split_once(',') {
        Some((duration, title)) => (duration, Some(title)),
        None => (tail, None),
    };
    let duration: f64 = duration.trim().parse().map_err(|_| {
        ReliveError::Parse(format!("invalid EXTINF duration '{duration}'"))
    })?;
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    Ok((duration, title))
}

fn build_variant(uri: &str, tags: Vec<Tag>) -> Result<Variant> {
    let stream_inf = tags
        .iter()
        .find(|t| t.name() == names::STREAM_INF)
        .ok_or_else(|| ReliveError::Parse("variant without EXT-X-STREAM-INF".to_string()))?;

    let bandwidth: u64 = stream_inf
        .attribute("BANDWIDTH")
        .and_then(|b| b.parse().ok())
        .ok_or_else(|| {
            ReliveError::Parse(format!(
                "EXT-X-STREAM-INF missing a valid BANDWIDTH for '{uri}'"
            ))
        })?;

    let attr = |key: &str| stream_inf.attribute(key).map(str::to_string);

    Ok(Variant {
        uri: uri.to_string(),
        bandwidth,
        average_bandwidth: stream_inf
            .attribute("AVERAGE-BANDWIDTH")
            .and_then(|b| b.parse().ok()),
        codecs: attr("CODECS"),
        resolution: attr("RESOLUTION"),
        frame_rate: stream_inf
            .attribute("FRAME-RATE")
            .and_then(|f| f.parse().ok()),
        audio: attr("AUDIO"),
        video: attr("VIDEO"),
        subtitles: attr("SUBTITLES"),
        closed_captions: attr("CLOSED-CAPTIONS"),
        tags,
    })
}

fn resolve_map_uri(tag: &mut Tag, base: &str) {
    if let Some(uri) = tag.attribute("URI") {
        let resolved = resolve_uri(uri, base);
        if resolved != uri {
            tag.set_attribute("URI", resolved);
        }
    }
}

/// Resolve a possibly-relative URI against the playlist's own URL.
pub fn resolve_uri(uri: &str, base: &str) -> String {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return uri.to_string();
    }
    match Url::parse(base).and_then(|b| b.join(uri)) {
        Ok(url) => url.to_string(),
        Err(_) => uri.to_string(),
    }
}
