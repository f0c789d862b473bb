//! Greedy word wrapping over styled spans.
//!
//! Words keep their styles across span boundaries (`**bold**tail` is one word), whitespace runs
//! collapse at line breaks, and words wider than the line are split by character.

use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    /// One output line per input line; overflow is left to horizontal scrolling.
    None,
    #[default]
    Word,
}

#[derive(Clone, Debug, Default)]
struct Piece {
    parts: Vec<(Style, String)>,
    width: usize,
    space: bool,
}

impl Piece {
    fn push(&mut self, style: Style, ch: char) {
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
        match self.parts.last_mut() {
            Some((s, text)) if *s == style => text.push(ch),
            _ => self.parts.push((style, ch.to_string())),
        }
    }
}

fn pieces(spans: &[Span<'_>]) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::new();
    for span in spans {
        for ch in span.content.chars() {
            let ch = if ch == '\t' { ' ' } else { ch };
            let space = ch.is_whitespace();
            match out.last_mut() {
                Some(p) if p.space == space => p.push(span.style, ch),
                _ => {
                    let mut p = Piece {
                        space,
                        ..Piece::default()
                    };
                    p.push(span.style, ch);
                    out.push(p);
                }
            }
        }
    }
    out
}

struct LineBuilder<'p> {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    current_w: usize,
    has_text: bool,
    subsequent_prefix: &'p [Span<'static>],
    subsequent_w: usize,
}

impl LineBuilder<'_> {
    fn push_parts(&mut self, parts: &[(Style, String)], width: usize) {
        for (style, text) in parts {
            self.current.push(Span::styled(text.clone(), *style));
        }
        self.current_w += width;
        self.has_text = true;
    }

    fn break_line(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
        self.current = self.subsequent_prefix.to_vec();
        self.current_w = self.subsequent_w;
        self.has_text = false;
    }

    /// Splits a word that cannot fit on any line.
    fn push_split_word(&mut self, piece: &Piece, max_cols: usize) {
        for (style, text) in &piece.parts {
            for ch in text.chars() {
                let w = UnicodeWidthChar::width(ch).unwrap_or(0);
                if self.has_text && self.current_w + w > max_cols {
                    self.break_line();
                }
                self.push_parts(&[(*style, ch.to_string())], w);
            }
        }
    }
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans
        .iter()
        .map(|s| UnicodeWidthStr::width(s.content.as_ref()))
        .sum()
}

/// Wraps `spans` to `width` columns. The first output line starts with `initial_prefix`, every
/// following line with `subsequent_prefix` (list markers, blockquote bars, indentation).
pub fn wrap_spans(
    spans: &[Span<'_>],
    width: u16,
    mode: WrapMode,
    initial_prefix: &[Span<'static>],
    subsequent_prefix: &[Span<'static>],
) -> Vec<Line<'static>> {
    let mut b = LineBuilder {
        lines: Vec::new(),
        current: initial_prefix.to_vec(),
        current_w: spans_width(initial_prefix),
        has_text: false,
        subsequent_prefix,
        subsequent_w: spans_width(subsequent_prefix),
    };

    let max_cols = width as usize;
    let mut pending_space: Option<Piece> = None;

    for piece in pieces(spans) {
        if piece.space {
            if b.has_text {
                pending_space = Some(piece);
            }
            continue;
        }

        let space_w = pending_space.as_ref().map_or(0, |p| p.width);
        let fits = b.current_w + space_w + piece.width <= max_cols;
        if mode == WrapMode::None || max_cols == 0 || fits {
            if let Some(space) = pending_space.take() {
                b.push_parts(&space.parts, space.width);
            }
            b.push_parts(&piece.parts, piece.width);
            continue;
        }

        pending_space = None;
        if b.has_text {
            b.break_line();
        }
        if b.current_w + piece.width <= max_cols {
            b.push_parts(&piece.parts, piece.width);
        } else {
            b.push_split_word(&piece, max_cols);
        }
    }

    if b.has_text || b.lines.is_empty() {
        b.lines.push(Line::from(std::mem::take(&mut b.current)));
    }
    b.lines
}
