//! Cheap document metadata for view chrome (titles, previews) that does not need a full parse.

pub const DEFAULT_TITLE_MAX_CHARS: usize = 200;
pub const DEFAULT_SNIPPET_MAX_CHARS: usize = 200;

const UNTITLED: &str = "Untitled";

/// Picks a display title for a markdown document.
///
/// Tries, in order: the first `# ` heading, the first `## ` heading, the first non-empty line.
/// Empty input yields `"Untitled"`; whitespace-only input yields an empty title. The result is
/// truncated to `max_chars` characters.
pub fn extract_title(content: &str, max_chars: usize) -> String {
    if content.is_empty() {
        return UNTITLED.to_string();
    }
    let content = content.trim();

    if let Some(title) = find_heading(content, "#").or_else(|| find_heading(content, "##")) {
        return truncate_chars(title, max_chars).to_string();
    }

    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|line| truncate_chars(line, max_chars).to_string())
        .unwrap_or_default()
}

/// Trimmed preview of `content`, cut to `max_chars` characters with a trailing `...`.
pub fn snippet(content: &str, max_chars: usize) -> String {
    let content = content.trim();
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    format!("{}...", truncate_chars(content, max_chars))
}

/// First `marker` heading (`#`, `##`) with non-empty text.
fn find_heading<'a>(content: &'a str, marker: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        let rest = line.strip_prefix(marker)?;
        if !rest.starts_with([' ', '\t']) {
            return None;
        }
        let title = rest.trim();
        (!title.is_empty()).then_some(title)
    })
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
