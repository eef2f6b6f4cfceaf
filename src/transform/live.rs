//! Live windower: project a VOD source onto a wall-clock live timeline.
//!
//! The source loops forever. At any instant the window holds the
//! `min(window_size, source_len)` segments a live origin would currently
//! advertise, with media-sequence and discontinuity-sequence counters
//! accounting for everything that has already slid out of view.

use crate::hls::playlist::{Playlist, Segment};
use crate::hls::tag::{names, Attr};

pub const DEFAULT_WINDOW_SIZE: usize = 3;

/// A computed live window plus the source-timeline offset (seconds) at
/// which its first segment starts. The offset feeds the ad injector.
#[derive(Debug)]
pub struct LiveWindow {
    pub playlist: Playlist,
    pub start_offset: f64,
}

/// Slide the window to where wall-clock `now_ms` lands for a stream that
/// started at `start_ms`. Deterministic given its inputs.
///
/// Advancement is boundary-based: the head is shifted out only once the
/// elapsed time strictly exceeds its full duration, so a partially played
/// head segment stays in the window.
pub fn slide_window(
    source: &Playlist,
    start_ms: i64,
    now_ms: i64,
    window_size: usize,
) -> LiveWindow {
    let mut out = source.clone();
    let len = source.segments.len();
    let effective = window_size.min(len);

    if effective == 0 {
        out.segments.clear();
        finalize_live(&mut out, 0, 0);
        return LiveWindow {
            playlist: out,
            start_offset: 0.0,
        };
    }

    let mut window: Vec<Segment> = source.segments[..effective].to_vec();
    let mut media_sequence: u64 = 0;
    let mut discontinuity_sequence: u64 = 0;
    let mut next_tail = effective;
    let mut start_offset = 0.0f64;
    let mut elapsed = (now_ms - start_ms) as f64 / 1000.0;

    // A source with no playable time cannot advance; guards the loop
    // against zero-duration segment lists.
    if source.total_duration() > 0.0 {
        while elapsed > window[0].duration {
            let idx = next_tail % len;
            let mut tail = source.segments[idx].clone();
            if idx == 0 {
                tail.mark_discontinuity();
            }
            window.push(tail);

            let head = window.remove(0);
            if head.discontinuity {
                discontinuity_sequence += 1;
            }
            elapsed -= head.duration;
            start_offset += head.duration;
            media_sequence += 1;
            next_tail += 1;
        }
    }

    out.segments = window;
    finalize_live(&mut out, media_sequence, discontinuity_sequence);
    LiveWindow {
        playlist: out,
        start_offset,
    }
}

/// Set the live tag block and strip the VOD closers.
fn finalize_live(playlist: &mut Playlist, media_sequence: u64, discontinuity_sequence: u64) {
    let target_duration = playlist.max_segment_duration().ceil() as u64;
    playlist.set_tag_value(names::TARGETDURATION, target_duration.to_string());
    playlist.set_tag_value(names::MEDIA_SEQUENCE, media_sequence.to_string());
    playlist.set_tag_value(
        names::DISCONTINUITY_SEQUENCE,
        discontinuity_sequence.to_string(),
    );
    playlist.set_tag_attributes(names::START, vec![Attr::unquoted("TIME-OFFSET", "0.0")]);
    playlist.remove_tag(names::PLAYLIST_TYPE);
    playlist.remove_tag(names::ENDLIST);
}
