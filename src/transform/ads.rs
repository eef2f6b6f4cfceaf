//! Ad-break scheduling and cue-tag injection.
//!
//! The schedule comes from the `ad` query parameter:
//! `interval,<duration_s>,<interval_s>` starts a break at every multiple of
//! the interval (never at t=0); `ts,<duration_s>,<HH:MM:SS>[,...]` starts
//! breaks at the listed absolute offsets. Injection overlays
//! CUE-OUT / CUE-OUT-CONT / CUE-IN tags onto an already fitted or windowed
//! segment list.

use crate::error::{ReliveError, Result};
use crate::hls::playlist::Segment;
use crate::hls::tag::{names, Tag};

/// Slack applied when matching a segment start to a break boundary, so
/// float drift across a long window does not misclassify the first
/// in-break segment.
const BOUNDARY_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub enum AdConfig {
    /// A break every `interval` seconds, starting at `interval`.
    Interval { duration: f64, interval: f64 },
    /// Breaks at fixed offsets (seconds) on the playback timeline.
    Timestamps { duration: f64, starts: Vec<f64> },
}

#[derive(Debug, Clone, Copy)]
struct AdBreak {
    start: f64,
    duration: f64,
}

impl AdConfig {
    /// Parse the `ad` query parameter.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split(',');
        let mode = parts.next().unwrap_or_default();
        let duration = parse_seconds(parts.next(), "ad duration")?;
        if duration <= 0.0 {
            return Err(ReliveError::AdConfig(
                "ad duration must be positive".to_string(),
            ));
        }

        match mode {
            "interval" => {
                let interval = parse_seconds(parts.next(), "ad interval")?;
                if interval <= 0.0 {
                    return Err(ReliveError::AdConfig(
                        "ad interval must be positive".to_string(),
                    ));
                }
                Ok(AdConfig::Interval { duration, interval })
            }
            "ts" => {
                let mut starts: Vec<f64> = parts
                    .map(parse_timestamp)
                    .collect::<Result<Vec<f64>>>()?;
                if starts.is_empty() {
                    return Err(ReliveError::AdConfig(
                        "ts mode needs at least one timestamp".to_string(),
                    ));
                }
                starts.sort_by(|a, b| a.total_cmp(b));
                Ok(AdConfig::Timestamps { duration, starts })
            }
            other => Err(ReliveError::AdConfig(format!("unknown ad mode '{other}'"))),
        }
    }

    /// Breaks whose [start, start + duration) intersects the window span.
    fn breaks_in(&self, window_start: f64, window_end: f64) -> Vec<AdBreak> {
        match self {
            AdConfig::Interval { duration, interval } => {
                // First multiple that could still cover window_start,
                // starting one early to absorb floor rounding.
                let mut k = (((window_start - duration) / interval).floor() as i64 - 1).max(1);
                let mut breaks = Vec::new();
                while (k as f64) * interval < window_end {
                    let b = AdBreak {
                        start: (k as f64) * interval,
                        duration: *duration,
                    };
                    if b.start + b.duration > window_start {
                        breaks.push(b);
                    }
                    k += 1;
                }
                breaks
            }
            AdConfig::Timestamps { duration, starts } => starts
                .iter()
                .filter(|s| **s < window_end && **s + duration > window_start)
                .map(|s| AdBreak {
                    start: *s,
                    duration: *duration,
                })
                .collect(),
        }
    }
}

/// Overlay cue tags onto `segments`, whose first segment starts at
/// `start_offset` seconds on the playback timeline. Segments are
/// classified by their start time; a break ending mid-segment rounds up
/// to the next boundary for the CUE-IN.
pub fn inject_ad_breaks(segments: &mut [Segment], config: &AdConfig, start_offset: f64) {
    if segments.is_empty() {
        return;
    }
    let span: f64 = segments.iter().map(|s| s.duration).sum();
    let breaks = config.breaks_in(start_offset, start_offset + span);
    if breaks.is_empty() {
        return;
    }

    let mut current = start_offset;
    let mut prev_in_ad = false;

    for segment in segments.iter_mut() {
        let seg_start = current;
        let hit = breaks.iter().find(|b| {
            seg_start >= b.start - BOUNDARY_EPSILON && seg_start < b.start + b.duration
        });

        match hit {
            Some(ad_break) => {
                let elapsed = seg_start - ad_break.start;
                let tag = if elapsed < BOUNDARY_EPSILON {
                    Tag::with_value(names::CUE_OUT, format_seconds(ad_break.duration))
                } else {
                    Tag::with_value(
                        names::CUE_OUT_CONT,
                        format!("{:.1}/{}", elapsed, format_seconds(ad_break.duration)),
                    )
                };
                segment.tags.insert(0, tag);
                prev_in_ad = true;
            }
            None => {
                if prev_in_ad {
                    segment.tags.insert(0, Tag::new(names::CUE_IN));
                    prev_in_ad = false;
                }
            }
        }

        current += segment.duration;
    }
}

fn parse_seconds(part: Option<&str>, what: &str) -> Result<f64> {
    part.filter(|p| !p.is_empty())
        .ok_or_else(|| ReliveError::AdConfig(format!("missing {what}")))?
        .parse()
        .map_err(|_| ReliveError::AdConfig(format!("invalid {what}")))
}

/// `HH:MM:SS` to seconds.
fn parse_timestamp(raw: &str) -> Result<f64> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 3 {
        return Err(ReliveError::AdConfig(format!(
            "malformed timestamp '{raw}', expected HH:MM:SS"
        )));
    }
    let mut total = 0u64;
    for part in parts {
        let field: u64 = part.parse().map_err(|_| {
            ReliveError::AdConfig(format!("malformed timestamp '{raw}', expected HH:MM:SS"))
        })?;
        total = total * 60 + field;
    }
    Ok(total as f64)
}

/// Integer formatting for whole-second durations, else the float as-is.
fn format_seconds(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
