//! In-memory playlist model.
//!
//! A `Playlist` is either a master (variant list) or a media (segment list)
//! playlist. It is treated as immutable once it enters the manifest cache;
//! transformations work on deep clones. Mutation goes through the explicit
//! tag mutators so raw lines stay in sync with structured fields.

use crate::hls::tag::{names, Attr, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistKind {
    Master,
    Media,
}

/// One media segment: its `EXTINF`, any preceding per-segment tags, and the
/// URI line that closed it. The tag list emitted in order followed by the
/// URI re-parses to an equivalent segment.
#[derive(Debug, Clone)]
pub struct Segment {
    pub duration: f64,
    pub title: Option<String>,
    pub uri: String,
    pub discontinuity: bool,
    pub tags: Vec<Tag>,
}

impl Segment {
    /// Flag the segment as discontinuous and prepend the marker tag.
    /// Idempotent.
    pub fn mark_discontinuity(&mut self) {
        if !self.discontinuity {
            self.discontinuity = true;
            self.tags.insert(0, Tag::new(names::DISCONTINUITY));
        }
    }

    fn find_tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name() == name)
    }

    pub fn key(&self) -> Option<&Tag> {
        self.find_tag(names::KEY)
    }

    pub fn map(&self) -> Option<&Tag> {
        self.find_tag(names::MAP)
    }

    pub fn program_date_time(&self) -> Option<&str> {
        self.find_tag(names::PROGRAM_DATE_TIME).and_then(Tag::value)
    }

    pub fn byte_range(&self) -> Option<&str> {
        self.find_tag(names::BYTERANGE).and_then(Tag::value)
    }

    pub fn date_range(&self) -> Option<&Tag> {
        self.find_tag(names::DATERANGE)
    }
}

/// One rendition of a master playlist: the `EXT-X-STREAM-INF` (plus any
/// other preceding tags) and the URI line that closed it. The full
/// attribute list lives on the tag; the parsed fields are views.
#[derive(Debug, Clone)]
pub struct Variant {
    pub uri: String,
    pub bandwidth: u64,
    pub average_bandwidth: Option<u64>,
    pub codecs: Option<String>,
    pub resolution: Option<String>,
    pub frame_rate: Option<f64>,
    pub audio: Option<String>,
    pub video: Option<String>,
    pub subtitles: Option<String>,
    pub closed_captions: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone)]
pub struct Playlist {
    pub kind: PlaylistKind,
    pub version: Option<u64>,
    pub independent_segments: bool,
    pub tags: Vec<Tag>,
    pub segments: Vec<Segment>,
    pub variants: Vec<Variant>,
    /// Absolute URL the playlist was fetched from; base for relative URIs.
    pub source_url: String,
}

impl Playlist {
    pub fn empty(kind: PlaylistKind, source_url: impl Into<String>) -> Self {
        Playlist {
            kind,
            version: None,
            independent_segments: false,
            tags: Vec::new(),
            segments: Vec::new(),
            variants: Vec::new(),
            source_url: source_url.into(),
        }
    }

    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name() == name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tag(name).is_some()
    }

    /// Update an existing playlist-level tag's scalar value in place, or
    /// append a fresh tag.
    pub fn set_tag_value(&mut self, name: &str, value: impl Into<String>) {
        match self.tags.iter_mut().find(|t| t.name() == name) {
            Some(tag) => tag.set_value(value),
            None => self.tags.push(Tag::with_value(name, value)),
        }
    }

    /// Update an existing playlist-level tag's attribute list in place, or
    /// append a fresh tag.
    pub fn set_tag_attributes(&mut self, name: &str, attributes: Vec<Attr>) {
        match self.tags.iter_mut().find(|t| t.name() == name) {
            Some(tag) => tag.set_attributes(attributes),
            None => self.tags.push(Tag::with_attributes(name, attributes)),
        }
    }

    /// Append a name-only tag unless it is already present.
    pub fn ensure_tag(&mut self, name: &str) {
        if !self.has_tag(name) {
            self.tags.push(Tag::new(name));
        }
    }

    pub fn remove_tag(&mut self, name: &str) {
        self.tags.retain(|t| t.name() != name);
    }

    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    pub fn max_segment_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).fold(0.0, f64::max)
    }
}
