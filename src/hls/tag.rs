//! Tag model with raw-line preservation.
//!
//! Off-the-shelf M3U8 parsers drop tags they do not model, which breaks
//! pass-through of anything outside their vocabulary. Every tag here keeps
//! the exact line it was parsed from; the line is reused verbatim on output
//! until a recognized field is mutated, at which point it is regenerated
//! from the structured fields on the same code path as the mutation.

/// Tag names the engine reads or writes.
pub mod names {
    pub const EXTM3U: &str = "EXTM3U";
    pub const EXTINF: &str = "EXTINF";
    pub const VERSION: &str = "EXT-X-VERSION";
    pub const INDEPENDENT_SEGMENTS: &str = "EXT-X-INDEPENDENT-SEGMENTS";
    pub const STREAM_INF: &str = "EXT-X-STREAM-INF";
    pub const MEDIA: &str = "EXT-X-MEDIA";
    pub const DISCONTINUITY: &str = "EXT-X-DISCONTINUITY";
    pub const KEY: &str = "EXT-X-KEY";
    pub const MAP: &str = "EXT-X-MAP";
    pub const PROGRAM_DATE_TIME: &str = "EXT-X-PROGRAM-DATE-TIME";
    pub const BYTERANGE: &str = "EXT-X-BYTERANGE";
    pub const DATERANGE: &str = "EXT-X-DATERANGE";
    pub const TARGETDURATION: &str = "EXT-X-TARGETDURATION";
    pub const MEDIA_SEQUENCE: &str = "EXT-X-MEDIA-SEQUENCE";
    pub const DISCONTINUITY_SEQUENCE: &str = "EXT-X-DISCONTINUITY-SEQUENCE";
    pub const PLAYLIST_TYPE: &str = "EXT-X-PLAYLIST-TYPE";
    pub const ENDLIST: &str = "EXT-X-ENDLIST";
    pub const START: &str = "EXT-X-START";
    pub const CUE_OUT: &str = "EXT-X-CUE-OUT";
    pub const CUE_OUT_CONT: &str = "EXT-X-CUE-OUT-CONT";
    pub const CUE_IN: &str = "EXT-X-CUE-IN";
}

/// One entry of an attribute-list tag. `quoted` records whether the value
/// was (or should be) wrapped in double quotes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: String,
    pub quoted: bool,
}

impl Attr {
    pub fn unquoted(key: impl Into<String>, value: impl Into<String>) -> Self {
        Attr {
            key: key.into(),
            value: value.into(),
            quoted: false,
        }
    }

    pub fn quoted(key: impl Into<String>, value: impl Into<String>) -> Self {
        Attr {
            key: key.into(),
            value: value.into(),
            quoted: true,
        }
    }
}

/// A single `#NAME` or `#NAME:TAIL` playlist line.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    name: String,
    value: Option<String>,
    attributes: Vec<Attr>,
    raw: String,
}

impl Tag {
    /// A name-only tag, e.g. `#EXT-X-ENDLIST`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let raw = format!("#{name}");
        Tag {
            name,
            value: None,
            attributes: Vec::new(),
            raw,
        }
    }

    /// A scalar-value tag, e.g. `#EXT-X-TARGETDURATION:10`.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut tag = Tag::new(name);
        tag.value = Some(value.into());
        tag.regenerate_raw();
        tag
    }

    /// An attribute-list tag, e.g. `#EXT-X-START:TIME-OFFSET=0.0`.
    pub fn with_attributes(name: impl Into<String>, attributes: Vec<Attr>) -> Self {
        let mut tag = Tag::new(name);
        tag.attributes = attributes;
        tag.regenerate_raw();
        tag
    }

    /// Parse a raw tag line (leading `#` included). The original line is
    /// preserved for re-emission.
    pub fn parse(line: &str) -> Self {
        let body = line.strip_prefix('#').unwrap_or(line);
        let (name, tail) = match body.split_once(':') {
            Some((name, tail)) => (name.to_string(), Some(tail)),
            None => (body.to_string(), None),
        };

        let (value, attributes) = match tail {
            Some(tail) if is_attribute_list(tail) => (None, parse_attributes(tail)),
            Some(tail) => (Some(tail.to_string()), Vec::new()),
            None => (None, Vec::new()),
        };

        Tag {
            name,
            value,
            attributes,
            raw: line.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    pub fn attributes(&self) -> &[Attr] {
        &self.attributes
    }

    /// Replace the scalar value and regenerate the raw line.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
        self.attributes.clear();
        self.regenerate_raw();
    }

    /// Replace one attribute value (quoting style preserved; a missing key
    /// is appended unquoted) and regenerate the raw line.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.key == key) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attr::unquoted(key, value)),
        }
        self.regenerate_raw();
    }

    /// Replace the whole attribute list and regenerate the raw line.
    pub fn set_attributes(&mut self, attributes: Vec<Attr>) {
        self.attributes = attributes;
        self.value = None;
        self.regenerate_raw();
    }

    fn regenerate_raw(&mut self) {
        let mut raw = format!("#{}", self.name);
        if !self.attributes.is_empty() {
            raw.push(':');
            let rendered: Vec<String> = self
                .attributes
                .iter()
                .map(|a| {
                    if a.quoted {
                        format!("{}=\"{}\"", a.key, a.value)
                    } else {
                        format!("{}={}", a.key, a.value)
                    }
                })
                .collect();
            raw.push_str(&rendered.join(","));
        } else if let Some(value) = &self.value {
            raw.push(':');
            raw.push_str(value);
        }
        self.raw = raw;
    }
}

/// Attribute-list heuristic: the tail contains an `=` directly preceded by
/// an uppercase/digit/hyphen identifier.
fn is_attribute_list(tail: &str) -> bool {
    match tail.find('=') {
        Some(eq) => {
            let ident = &tail[..eq];
            !ident.is_empty()
                && ident
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        }
        None => false,
    }
}

/// Split `KEY=VALUE,KEY="VAL,UE"` pairs. Commas inside quotes are literal;
/// whitespace after a comma is skipped.
fn parse_attributes(tail: &str) -> Vec<Attr> {
    let mut attrs = Vec::new();
    let chars: Vec<char> = tail.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && (chars[i] == ',' || chars[i].is_whitespace()) {
            i += 1;
        }
        let key_start = i;
        while i < chars.len() && chars[i] != '=' {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        let key: String = chars[key_start..i].iter().collect();
        i += 1; // consume '='

        let (value, quoted) = if i < chars.len() && chars[i] == '"' {
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != '"' {
                i += 1;
            }
            let value: String = chars[start..i].iter().collect();
            if i < chars.len() {
                i += 1; // consume closing quote
            }
            (value, true)
        } else {
            let start = i;
            while i < chars.len() && chars[i] != ',' {
                i += 1;
            }
            let value: String = chars[start..i].iter().collect();
            (value, false)
        };

        attrs.push(Attr {
            key,
            value,
            quoted,
        });
    }

    attrs
}
