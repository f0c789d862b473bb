//! Per-segment rendering into terminal lines.
//!
//! The progressive view never renders a whole document at once: each revealed segment goes
//! through a [`SegmentRenderer`] on its own. [`MarkdownRenderer`] is the default, a compact
//! `pulldown-cmark` based renderer; [`PlainTextRenderer`] shows the raw text; any
//! `Fn(&str, u16, &Theme) -> Vec<Line<'static>>` closure works as well.
//!
//! Renderers must be pure: the same `(segment, width, theme)` always yields the same lines, so
//! the view can cache them per width.

use mdreveal_core::theme::Theme;
use mdreveal_core::wrapping::WrapMode;
use mdreveal_core::wrapping::wrap_spans;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::Event;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use unicode_width::UnicodeWidthStr;
use url::Url;

pub trait SegmentRenderer {
    fn render(&self, segment: &str, width: u16, theme: &Theme) -> Vec<Line<'static>>;
}

impl<F> SegmentRenderer for F
where
    F: Fn(&str, u16, &Theme) -> Vec<Line<'static>>,
{
    fn render(&self, segment: &str, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        self(segment, width, theme)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MarkdownRenderOptions {
    pub wrap_prose: bool,
    pub show_heading_markers: bool,
    /// Append `(url)` after link text.
    pub show_link_destinations: bool,
    /// Base that relative link destinations are resolved against.
    pub base_url: Option<String>,
    pub blockquote_prefix: String,
    pub bullet: String,
    pub code_block_indent: u16,
    pub show_code_language: bool,
}

impl Default for MarkdownRenderOptions {
    fn default() -> Self {
        Self {
            wrap_prose: true,
            show_heading_markers: false,
            show_link_destinations: false,
            base_url: None,
            blockquote_prefix: "│ ".to_string(),
            bullet: "• ".to_string(),
            code_block_indent: 4,
            show_code_language: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MarkdownRenderer {
    options: MarkdownRenderOptions,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MarkdownRenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MarkdownRenderOptions {
        &self.options
    }
}

impl SegmentRenderer for MarkdownRenderer {
    fn render(&self, segment: &str, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        render_markdown(segment, width, theme, &self.options)
    }
}

/// Shows segment text as-is, word wrapped, without interpreting markdown. Trailing blank lines
/// are dropped; the view separates segments itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextRenderer;

impl SegmentRenderer for PlainTextRenderer {
    fn render(&self, segment: &str, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        segment
            .trim_end_matches('\n')
            .lines()
            .flat_map(|line| {
                wrap_spans(
                    &[Span::styled(line, theme.text_primary)],
                    width,
                    WrapMode::Word,
                    &[],
                    &[],
                )
            })
            .collect()
    }
}

/// Renders one markdown fragment. Unterminated constructs (an open code fence, a table without
/// its last row) render as far as they go.
pub fn render_markdown(
    input: &str,
    width: u16,
    theme: &Theme,
    options: &MarkdownRenderOptions,
) -> Vec<Line<'static>> {
    let mut parser_options = Options::empty();
    parser_options.insert(Options::ENABLE_TABLES);
    parser_options.insert(Options::ENABLE_TASKLISTS);
    parser_options.insert(Options::ENABLE_FOOTNOTES);
    parser_options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut b = Builder {
        options,
        theme,
        width,
        lines: Vec::new(),
        inline: Vec::new(),
        styles: Vec::new(),
        quote_depth: 0,
        lists: Vec::new(),
        item_widths: Vec::new(),
        pending_marker: None,
        code: None,
        link_dest: None,
        table: None,
        needs_blank: false,
    };

    for ev in Parser::new_ext(input, parser_options) {
        b.event(ev);
    }
    b.finish()
}

#[derive(Debug, Default)]
struct CodeState {
    language: Option<String>,
    text: String,
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    header_rows: usize,
    row: Vec<String>,
    cell: String,
    in_head: bool,
}

struct Builder<'a> {
    options: &'a MarkdownRenderOptions,
    theme: &'a Theme,
    width: u16,
    lines: Vec<Line<'static>>,
    inline: Vec<Span<'static>>,
    styles: Vec<Style>,
    quote_depth: usize,
    /// `None` for bullet lists, `Some(next)` for ordered lists.
    lists: Vec<Option<u64>>,
    item_widths: Vec<usize>,
    pending_marker: Option<String>,
    code: Option<CodeState>,
    link_dest: Option<String>,
    table: Option<TableState>,
    needs_blank: bool,
}

impl Builder<'_> {
    fn event(&mut self, ev: Event<'_>) {
        match ev {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                let style = self.style();
                self.push_text(&text, style);
            }
            Event::Code(code) => {
                let style = self.style().patch(self.theme.code_inline);
                self.push_text(&code, style);
            }
            Event::SoftBreak => {
                let style = self.style();
                self.push_text(" ", style);
            }
            Event::HardBreak => self.flush_inline(),
            Event::Rule => {
                self.start_block();
                let mut spans = self.quote_prefix();
                spans.push(Span::styled(
                    "─".repeat(self.width.max(1) as usize),
                    self.theme.text_muted,
                ));
                self.lines.push(Line::from(spans));
                self.needs_blank = true;
            }
            Event::Html(html) => {
                for line in html.lines() {
                    let mut spans = self.quote_prefix();
                    spans.push(Span::styled(line.to_string(), self.theme.text_muted));
                    self.lines.push(Line::from(spans));
                }
            }
            Event::InlineHtml(html) => self.push_text(&html, self.theme.text_muted),
            Event::FootnoteReference(label) => {
                self.push_text(&format!("[^{label}]"), self.theme.text_muted);
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_text(marker, self.theme.accent);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.start_block(),
            Tag::Heading { level, .. } => {
                self.start_block();
                self.styles.push(self.theme.heading);
                if self.options.show_heading_markers {
                    let hashes = "#".repeat(level as usize);
                    self.push_text(&format!("{hashes} "), self.theme.heading);
                }
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.start_block();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|l| !l.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeState {
                    language,
                    text: String::new(),
                });
            }
            Tag::HtmlBlock => self.start_block(),
            Tag::List(start) => {
                self.flush_inline();
                if self.lists.is_empty() {
                    self.start_block();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_inline();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => self.options.bullet.clone(),
                };
                self.item_widths
                    .push(UnicodeWidthStr::width(marker.as_str()));
                self.pending_marker = Some(marker);
            }
            Tag::FootnoteDefinition(label) => {
                self.start_block();
                self.push_text(&format!("[^{label}]: "), self.theme.text_muted);
            }
            Tag::Table(_) => {
                self.start_block();
                self.table = Some(TableState::default());
            }
            Tag::TableHead => {
                if let Some(t) = &mut self.table {
                    t.in_head = true;
                    t.row.clear();
                }
            }
            Tag::TableRow => {
                if let Some(t) = &mut self.table {
                    t.row.clear();
                }
            }
            Tag::TableCell => {
                if let Some(t) = &mut self.table {
                    t.cell.clear();
                }
            }
            Tag::Emphasis => self.styles.push(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.styles.push(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self
                .styles
                .push(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } => {
                self.styles.push(self.theme.link);
                self.link_dest = Some(resolve_url(self.options.base_url.as_deref(), &dest_url));
            }
            Tag::Image { .. } => {
                self.push_text("[image: ", self.theme.text_muted);
                self.styles.push(self.theme.text_muted);
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::FootnoteDefinition | TagEnd::HtmlBlock => self.end_block(),
            TagEnd::Heading(_) => {
                self.end_block();
                self.styles.pop();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_inline();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.needs_blank = true;
            }
            TagEnd::CodeBlock => self.flush_code(),
            TagEnd::List(_) => {
                self.flush_inline();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.needs_blank = true;
                }
            }
            TagEnd::Item => {
                self.flush_inline();
                if self.pending_marker.is_some() {
                    let (initial, _) = self.prefixes();
                    self.lines.push(Line::from(initial));
                }
                self.item_widths.pop();
            }
            TagEnd::TableCell => {
                if let Some(t) = &mut self.table {
                    let cell = std::mem::take(&mut t.cell);
                    t.row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(t) = &mut self.table {
                    let row = std::mem::take(&mut t.row);
                    t.rows.push(row);
                    if t.in_head {
                        t.header_rows = t.rows.len();
                        t.in_head = false;
                    }
                }
            }
            TagEnd::Table => self.flush_table(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                let dest = self.link_dest.take().filter(|d| !d.is_empty());
                if let (true, Some(dest)) = (self.options.show_link_destinations, dest) {
                    self.push_text(&format!(" ({dest})"), self.theme.text_muted);
                }
            }
            TagEnd::Image => {
                self.styles.pop();
                self.push_text("]", self.theme.text_muted);
            }
            _ => {}
        }
    }

    fn style(&self) -> Style {
        self.styles
            .iter()
            .fold(Style::default(), |acc, s| acc.patch(*s))
    }

    fn push_text(&mut self, text: &str, style: Style) {
        if let Some(code) = &mut self.code {
            code.text.push_str(text);
            return;
        }
        if let Some(table) = &mut self.table {
            table.cell.push_str(text);
            return;
        }
        self.inline.push(Span::styled(text.to_string(), style));
    }

    fn quote_prefix(&self) -> Vec<Span<'static>> {
        (0..self.quote_depth)
            .map(|_| Span::styled(self.options.blockquote_prefix.clone(), self.theme.blockquote))
            .collect()
    }

    /// Prefix for the first line of the next block and for its continuation lines. The first
    /// line of a list item carries the item marker.
    fn prefixes(&mut self) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
        let quote = self.quote_prefix();
        let indent: usize = self.item_widths.iter().sum();

        let mut subsequent = quote.clone();
        if indent > 0 {
            subsequent.push(Span::raw(" ".repeat(indent)));
        }

        let initial = match self.pending_marker.take() {
            Some(marker) => {
                let mut initial = quote;
                let outer = indent.saturating_sub(UnicodeWidthStr::width(marker.as_str()));
                if outer > 0 {
                    initial.push(Span::raw(" ".repeat(outer)));
                }
                initial.push(Span::styled(marker, self.theme.accent));
                initial
            }
            None => subsequent.clone(),
        };
        (initial, subsequent)
    }

    fn flush_inline(&mut self) {
        if self.inline.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.inline);
        let (initial, subsequent) = self.prefixes();
        let mode = if self.options.wrap_prose {
            WrapMode::Word
        } else {
            WrapMode::None
        };
        self.lines
            .extend(wrap_spans(&spans, self.width, mode, &initial, &subsequent));
    }

    fn start_block(&mut self) {
        self.flush_inline();
        if self.needs_blank && !self.lines.is_empty() {
            self.lines.push(Line::from(self.quote_prefix()));
        }
        self.needs_blank = false;
    }

    fn end_block(&mut self) {
        self.flush_inline();
        self.needs_blank = true;
    }

    fn flush_code(&mut self) {
        let Some(code) = self.code.take() else {
            return;
        };
        let (_, prefix) = self.prefixes();
        let indent = " ".repeat(self.options.code_block_indent as usize);

        if self.options.show_code_language {
            if let Some(lang) = &code.language {
                let mut spans = prefix.clone();
                spans.push(Span::raw(indent.clone()));
                spans.push(Span::styled(lang.clone(), self.theme.text_muted));
                self.lines.push(Line::from(spans));
            }
        }

        let text = code.text.strip_suffix('\n').unwrap_or(&code.text);
        for line in text.split('\n') {
            let mut spans = prefix.clone();
            spans.push(Span::raw(indent.clone()));
            spans.push(Span::styled(line.to_string(), self.theme.code_block));
            self.lines.push(Line::from(spans));
        }
        self.needs_blank = true;
    }

    fn flush_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        let (_, prefix) = self.prefixes();
        let cols = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut col_w = vec![0usize; cols];
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                col_w[i] = col_w[i].max(UnicodeWidthStr::width(cell.as_str()));
            }
        }

        let header_style = Style::default().add_modifier(Modifier::BOLD);
        for (r, row) in table.rows.iter().enumerate() {
            let mut spans = prefix.clone();
            for (i, w) in col_w.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(" │ ", self.theme.text_muted));
                }
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let pad = w.saturating_sub(UnicodeWidthStr::width(cell));
                let style = if r < table.header_rows {
                    header_style
                } else {
                    self.theme.text_primary
                };
                spans.push(Span::styled(format!("{cell}{}", " ".repeat(pad)), style));
            }
            self.lines.push(Line::from(spans));

            if r + 1 == table.header_rows {
                let rule = col_w
                    .iter()
                    .map(|w| "─".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("─┼─");
                let mut spans = prefix.clone();
                spans.push(Span::styled(rule, self.theme.text_muted));
                self.lines.push(Line::from(spans));
            }
        }
        self.needs_blank = true;
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_inline();
        // An unterminated fence or table ends with the fragment.
        self.flush_code();
        self.flush_table();
        self.lines
    }
}

fn resolve_url(base_url: Option<&str>, dest: &str) -> String {
    let dest = dest.trim();
    if dest.is_empty() || dest.starts_with('#') || Url::parse(dest).is_ok() {
        return dest.to_string();
    }
    let Some(base) = base_url.map(str::trim).filter(|s| !s.is_empty()) else {
        return dest.to_string();
    };
    Url::parse(base)
        .and_then(|base| base.join(dest))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| dest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdreveal_core::render::line_to_plain;

    fn plain(md: &str, width: u16) -> Vec<String> {
        plain_with(md, width, &MarkdownRenderOptions::default())
    }

    fn plain_with(md: &str, width: u16, options: &MarkdownRenderOptions) -> Vec<String> {
        render_markdown(md, width, &Theme::default(), options)
            .iter()
            .map(line_to_plain)
            .collect()
    }

    #[test]
    fn heading_and_paragraph_are_separated_by_blank_line() {
        assert_eq!(
            plain("# Title\n\nBody text.", 40),
            vec!["Title", "", "Body text."]
        );
    }

    #[test]
    fn heading_uses_theme_style() {
        let theme = Theme::default();
        let lines = render_markdown("## Sub", 40, &theme, &MarkdownRenderOptions::default());
        assert_eq!(lines[0].spans[0].style, theme.heading);
    }

    #[test]
    fn heading_markers_are_optional() {
        let options = MarkdownRenderOptions {
            show_heading_markers: true,
            ..MarkdownRenderOptions::default()
        };
        assert_eq!(plain_with("## Sub", 40, &options), vec!["## Sub"]);
    }

    #[test]
    fn paragraphs_wrap_to_width() {
        assert_eq!(
            plain("one two three four", 9),
            vec!["one two", "three", "four"]
        );
    }

    #[test]
    fn soft_breaks_join_lines() {
        assert_eq!(plain("one\ntwo", 40), vec!["one two"]);
    }

    #[test]
    fn bullet_list_items_get_markers_and_hanging_indent() {
        assert_eq!(
            plain("- alpha beta gamma\n- delta", 12),
            vec!["• alpha beta", "  gamma", "• delta"]
        );
    }

    #[test]
    fn ordered_lists_count_from_start() {
        assert_eq!(plain("3. a\n4. b\n5. c", 20), vec!["3. a", "4. b", "5. c"]);
    }

    #[test]
    fn nested_lists_indent_under_parent_text() {
        assert_eq!(
            plain("- parent\n  - child", 20),
            vec!["• parent", "  • child"]
        );
    }

    #[test]
    fn task_list_markers_render() {
        assert_eq!(plain("- [x] done\n- [ ] todo", 20), vec!["• [x] done", "• [ ] todo"]);
    }

    #[test]
    fn code_blocks_keep_lines_and_indent() {
        let md = "```rust\nfn main() {\n    run();\n}\n```";
        assert_eq!(
            plain(md, 10),
            vec!["    rust", "    fn main() {", "        run();", "    }"]
        );
    }

    #[test]
    fn unterminated_fence_renders_to_end_of_fragment() {
        let md = "Intro.\n\n```\nlet a = 1;\nlet b = 2;\n";
        assert_eq!(
            plain(md, 40),
            vec!["Intro.", "", "    let a = 1;", "    let b = 2;"]
        );
    }

    #[test]
    fn blockquotes_are_prefixed() {
        assert_eq!(plain("> quoted text", 40), vec!["│ quoted text"]);
    }

    #[test]
    fn links_show_resolved_destinations_when_enabled() {
        let options = MarkdownRenderOptions {
            show_link_destinations: true,
            base_url: Some("https://example.com/docs/".to_string()),
            ..MarkdownRenderOptions::default()
        };
        assert_eq!(
            plain_with("[guide](intro.md)", 80, &options),
            vec!["guide (https://example.com/docs/intro.md)"]
        );
        assert_eq!(plain("[guide](intro.md)", 80), vec!["guide"]);
    }

    #[test]
    fn tables_align_columns() {
        let md = "| a | bb |\n|---|----|\n| ccc | d |";
        assert_eq!(
            plain(md, 40),
            vec!["a   │ bb", "────┼───", "ccc │ d "]
        );
    }

    #[test]
    fn empty_fragment_renders_nothing() {
        assert!(plain("", 40).is_empty());
    }

    #[test]
    fn closures_are_renderers() {
        let r = |s: &str, _w: u16, _t: &Theme| vec![Line::from(s.to_uppercase())];
        let lines = r.render("abc", 10, &Theme::default());
        assert_eq!(line_to_plain(&lines[0]), "ABC");
    }

    #[test]
    fn plain_text_renderer_keeps_markdown_syntax() {
        let lines = PlainTextRenderer.render("# not a heading\n\nx", 40, &Theme::default());
        let lines: Vec<String> = lines.iter().map(line_to_plain).collect();
        assert_eq!(lines, vec!["# not a heading", "", "x"]);
    }

    #[test]
    fn relative_urls_without_base_are_kept() {
        assert_eq!(resolve_url(None, "./a.md"), "./a.md");
        assert_eq!(resolve_url(Some("https://x.dev/"), "#anchor"), "#anchor");
        assert_eq!(
            resolve_url(Some("https://x.dev/a/"), "b.md"),
            "https://x.dev/a/b.md"
        );
    }
}
