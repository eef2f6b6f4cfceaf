//! Playlist serialization.
//!
//! Every tag is emitted via its preserved (or freshly generated) raw line,
//! so tags the engine never touched round-trip byte-for-byte.
//! `EXT-X-ENDLIST` is held back until after the last segment.

use crate::hls::playlist::{Playlist, PlaylistKind};
use crate::hls::tag::names;

pub fn encode(playlist: &Playlist) -> String {
    let mut out = String::with_capacity(estimate_capacity(playlist));
    out.push_str("#EXTM3U\n");

    let mut endlist = None;
    for tag in &playlist.tags {
        if tag.name() == names::ENDLIST {
            endlist = Some(tag);
            continue;
        }
        out.push_str(tag.raw());
        out.push('\n');
    }

    match playlist.kind {
        PlaylistKind::Master => {
            for variant in &playlist.variants {
                for tag in &variant.tags {
                    out.push_str(tag.raw());
                    out.push('\n');
                }
                out.push_str(&variant.uri);
                out.push('\n');
            }
        }
        PlaylistKind::Media => {
            for segment in &playlist.segments {
                for tag in &segment.tags {
                    out.push_str(tag.raw());
                    out.push('\n');
                }
                out.push_str(&segment.uri);
                out.push('\n');
            }
        }
    }

    if let Some(tag) = endlist {
        out.push_str(tag.raw());
        out.push('\n');
    }

    out
}

fn estimate_capacity(playlist: &Playlist) -> usize {
    // Rough per-line budget; avoids repeated growth on big windows.
    64 * (playlist.tags.len() + 2 * playlist.segments.len() + 2 * playlist.variants.len() + 1)
}
