//! Structure-aware splitting of large markdown documents.
//!
//! [`split`] cuts a document into contiguous slices of roughly `chunk_size` bytes. Cuts prefer
//! natural breaks near the target (paragraphs, sentence ends, lines, words) and avoid landing
//! inside a fenced code block. Concatenating the slices always reproduces the input exactly.
//!
//! ```rust
//! use mdreveal_markdown::segment::{split, ChunkOptions};
//!
//! let doc = "First paragraph.\n\nSecond paragraph.";
//! let parts = split(doc, &ChunkOptions::with_chunk_size(20));
//! assert_eq!(parts, vec!["First paragraph.\n\n", "Second paragraph."]);
//! assert_eq!(parts.concat(), doc);
//! ```

use crate::error::OptionsError;
use std::ops::Range;

pub const DEFAULT_CHUNK_SIZE: usize = 5000;
pub const DEFAULT_OVERLAP_SIZE: usize = 100;
pub const DEFAULT_MAX_GROWTH_PERCENT: usize = 150;

const FENCE: &str = "```";

/// Break patterns in priority order. Each is searched for its last occurrence in the window and
/// the cut goes right after it.
const BREAK_PATTERNS: [&str; 5] = ["\n\n", ".\n", "\n", ". ", " "];

/// How [`split`] sizes segments. Lengths are UTF-8 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ChunkOptions {
    /// Target segment length.
    pub chunk_size: usize,
    /// Half-width of the window around the target searched for a natural break.
    pub overlap_size: usize,
    /// Search for natural breaks; when `false` every cut is a hard cut at the target.
    pub respect_boundaries: bool,
    /// Upper bound on a segment, in percent of `chunk_size`. A cut that would land inside a code
    /// fence moves past the closing fence only while the segment stays under this bound.
    pub max_growth_percent: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap_size: DEFAULT_OVERLAP_SIZE,
            respect_boundaries: true,
            max_growth_percent: DEFAULT_MAX_GROWTH_PERCENT,
        }
    }
}

impl ChunkOptions {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.chunk_size == 0 {
            return Err(OptionsError::ZeroChunkSize);
        }
        if self.max_growth_percent < 100 {
            return Err(OptionsError::GrowthBelowChunk {
                percent: self.max_growth_percent,
            });
        }
        Ok(())
    }

    /// Longest segment [`split`] produces for these options.
    ///
    /// The bound can only be exceeded when `chunk_size` is smaller than a single character or a
    /// fence marker, since a cut never splits either.
    pub fn max_segment_len(&self) -> usize {
        let chunk = self.chunk_size.max(1);
        (chunk.saturating_mul(self.max_growth_percent.max(100)) / 100).max(chunk)
    }
}

/// Splits `content` into ordered, non-empty slices whose concatenation equals `content`.
///
/// Content no longer than `chunk_size` comes back as a single slice (`""` yields `[""]`).
pub fn split<'a>(content: &'a str, options: &ChunkOptions) -> Vec<&'a str> {
    split_ranges(content, options)
        .into_iter()
        .map(|r| &content[r])
        .collect()
}

/// Byte ranges of the segments [`split`] would return.
pub fn split_ranges(content: &str, options: &ChunkOptions) -> Vec<Range<usize>> {
    let chunk_size = options.chunk_size.max(1);
    let len = content.len();
    if len <= chunk_size {
        return vec![0..len];
    }

    let fences = FenceIndex::new(content);
    let max_len = options.max_segment_len();
    let mut out = Vec::with_capacity(len / chunk_size + 1);
    let mut pos = 0usize;

    while pos < len {
        let target = pos + chunk_size;
        if target >= len {
            out.push(pos..len);
            break;
        }

        let tentative = if options.respect_boundaries {
            find_break(content, pos, target, options.overlap_size, max_len).unwrap_or(target)
        } else {
            target
        };
        let mut end = floor_char_boundary(content, tentative);
        if end <= pos {
            end = ceil_char_boundary(content, pos + 1);
        }
        let end = fences.settle(pos, end, max_len);

        out.push(pos..end);
        pos = end;
    }

    tracing::debug!(
        bytes = len,
        segments = out.len(),
        chunk_size,
        "split markdown into segments"
    );
    out
}

fn find_break(
    content: &str,
    pos: usize,
    target: usize,
    overlap: usize,
    max_len: usize,
) -> Option<usize> {
    let lo = target.saturating_sub(overlap).max(pos);
    let hi = target
        .saturating_add(overlap)
        .min(content.len())
        .min(pos.saturating_add(max_len));
    if lo >= hi {
        return None;
    }

    // Patterns are ASCII, so any match starts and ends on a char boundary even when the window
    // edges do not.
    let window = &content.as_bytes()[lo..hi];
    BREAK_PATTERNS.iter().find_map(|pat| {
        let pat = pat.as_bytes();
        window
            .windows(pat.len())
            .rposition(|w| w == pat)
            .map(|i| lo + i + pat.len())
            .filter(|&end| end > pos)
    })
}

/// Start offsets of every triple-backtick marker, scanned left to right without overlap.
struct FenceIndex {
    starts: Vec<usize>,
}

impl FenceIndex {
    fn new(content: &str) -> Self {
        Self {
            starts: content.match_indices(FENCE).map(|(i, _)| i).collect(),
        }
    }

    /// Markers lying entirely before `end`.
    fn count_before(&self, end: usize) -> usize {
        self.starts.partition_point(|&s| s + FENCE.len() <= end)
    }

    /// A marker that `end` would cut in half.
    fn straddling(&self, end: usize) -> Option<usize> {
        let i = self.starts.partition_point(|&s| s < end);
        let s = *self.starts.get(i.checked_sub(1)?)?;
        (s + FENCE.len() > end).then_some(s)
    }

    /// End of the first marker starting at or after `end`.
    fn next_marker_end(&self, end: usize) -> Option<usize> {
        let i = self.starts.partition_point(|&s| s < end);
        self.starts.get(i).map(|s| s + FENCE.len())
    }

    /// Adjusts a tentative cut so it does not split a marker or, within `max_len`, a code block.
    fn settle(&self, pos: usize, end: usize, max_len: usize) -> usize {
        let end = match self.straddling(end) {
            Some(s) if s > pos => s,
            Some(s) => s + FENCE.len(),
            None => end,
        };

        if self.count_before(end) % 2 == 0 {
            return end;
        }
        match self.next_marker_end(end) {
            Some(close) if close - pos <= max_len => close,
            Some(_) => {
                tracing::trace!(pos, end, "code fence outgrows segment, cutting inside it");
                end
            }
            None => end,
        }
    }
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
