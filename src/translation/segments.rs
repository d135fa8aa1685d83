/*!
 * Tag-boundary segmentation of HTML content.
 *
 * A region of markup is split into an ordered list of segments so that text
 * can be translated run by run while every tag is carried over verbatim.
 * Joining the segments back together always reproduces the input exactly.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use crate::language_utils::contains_japanese;

/// Any `<...>` tag, comment or doctype
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").unwrap()
});

/// One contiguous span of a content region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A tag, copied verbatim
    Markup(String),
    /// Text with at least one non-whitespace character
    Text(String),
    /// Whitespace between tags, never translated
    Whitespace(String),
}

impl Segment {
    /// Raw content of the segment
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Markup(s) | Segment::Text(s) | Segment::Whitespace(s) => s,
        }
    }

    /// Whether the segment should be sent to a translation backend
    pub fn is_translatable(&self) -> bool {
        matches!(self, Segment::Text(text) if contains_japanese(text))
    }

    fn from_text(part: &str) -> Self {
        if part.trim().is_empty() {
            Segment::Whitespace(part.to_string())
        } else {
            Segment::Text(part.to_string())
        }
    }
}

/// Split content into markup and text segments, in document order
pub fn split_segments(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for tag in TAG_REGEX.find_iter(content) {
        if tag.start() > last_end {
            segments.push(Segment::from_text(&content[last_end..tag.start()]));
        }
        segments.push(Segment::Markup(tag.as_str().to_string()));
        last_end = tag.end();
    }

    if last_end < content.len() {
        segments.push(Segment::from_text(&content[last_end..]));
    }

    segments
}

/// Concatenate segments back into a single string
pub fn join_segments(segments: &[Segment]) -> String {
    let capacity = segments.iter().map(|s| s.as_str().len()).sum();
    let mut joined = String::with_capacity(capacity);
    for segment in segments {
        joined.push_str(segment.as_str());
    }
    joined
}

/// Start/end marker pair delimiting the translatable block of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMarkers {
    pub start: String,
    pub end: String,
}

impl Default for RegionMarkers {
    fn default() -> Self {
        Self::new("<main>", "</main>")
    }
}

impl RegionMarkers {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Byte range of the content between the first start marker and the
    /// nearest end marker after it
    pub fn locate(&self, document: &str) -> Option<Range<usize>> {
        if self.start.is_empty() || self.end.is_empty() {
            return None;
        }

        let content_start = document.find(&self.start)? + self.start.len();
        let content_len = document[content_start..].find(&self.end)?;

        Some(content_start..content_start + content_len)
    }
}
