//! The progressive markdown view.
//!
//! [`ProgressiveMarkdownView`] draws the revealed segments of a document one after another and,
//! while more remain, a sentinel row followed by a loading placeholder. Each frame the host calls
//! [`ProgressiveMarkdownView::render_ref`] and [`ProgressiveMarkdownView::tick`]; the view does the
//! rest:
//!
//! 1. `render_ref` lays out newly revealed segments (each rendered once per width) and reports the
//!    sentinel position to the intersection monitor.
//! 2. `tick` applies a reveal queued on the previous frame, then queues the next one if the
//!    sentinel is near the viewport (or, in auto-load mode, once the debounce delay has passed).
//! 3. The first time nothing is left to reveal, the completion callback runs, once per document.

use std::time::Instant;

use mdreveal_core::input::InputEvent;
use mdreveal_core::render::render_line_clipped;
use mdreveal_core::render::render_scrollbar;
use mdreveal_core::scroll::ScrollAction;
use mdreveal_core::theme::Theme;
use mdreveal_core::viewport::ViewportState;
use mdreveal_markdown::meta;
use mdreveal_markdown::placeholder::LoadingPlaceholder;
use mdreveal_markdown::placeholder::SkeletonPlaceholder;
use mdreveal_markdown::render::MarkdownRenderer;
use mdreveal_markdown::render::SegmentRenderer;
use mdreveal_markdown::segment::ChunkOptions;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Line;

use crate::disclosure::DisclosureState;
use crate::disclosure::RevealController;
use crate::monitor::IntersectionMonitor;
use crate::monitor::IntersectionObserver;
use crate::monitor::MarkerId;
use crate::monitor::ViewportObserver;
use crate::options::ProgressiveOptions;
use crate::options::RevealRequest;

/// Documents longer than this many characters are worth revealing progressively; shorter ones
/// can be rendered whole.
pub const PROGRESSIVE_THRESHOLD: usize = 10_000;

pub fn should_reveal_progressively(content: &str) -> bool {
    content.len() > PROGRESSIVE_THRESHOLD && content.chars().count() > PROGRESSIVE_THRESHOLD
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealAction {
    None,
    Redraw,
    /// The last segment was revealed; implies a redraw.
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPhase {
    /// Nothing revealed beyond the initial segments yet.
    Initial,
    Revealing,
    /// Every segment is visible. Only a content change leaves this phase.
    Complete,
}

type CompletionCallback = Box<dyn FnMut() + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Sentinel {
    id: MarkerId,
    generation: u64,
    visible: usize,
}

/// Rendered rows, cached for one width.
#[derive(Debug, Default)]
struct Layout {
    width: Option<u16>,
    segments: Vec<Vec<Line<'static>>>,
    /// First row of each rendered segment.
    starts: Vec<u32>,
    placeholder: Vec<Line<'static>>,
    content_w: u32,
}

impl Layout {
    fn segments_end(&self) -> u32 {
        match (self.starts.last(), self.segments.last()) {
            (Some(start), Some(lines)) => start + lines.len() as u32,
            _ => 0,
        }
    }
}

pub struct ProgressiveMarkdownView {
    controller: RevealController,
    monitor: IntersectionMonitor,
    renderer: Box<dyn SegmentRenderer + Send>,
    placeholder: Box<dyn LoadingPlaceholder + Send>,
    options: ProgressiveOptions,
    pub state: ViewportState,
    layout: Layout,
    sentinel: Option<Sentinel>,
    next_marker: u64,
    auto_deadline: Option<Instant>,
    completed_for: Option<u64>,
    on_render_complete: Option<CompletionCallback>,
    /// Set by the first `set_content`; nothing completes before a document arrives.
    has_content: bool,
    mounted: bool,
}

impl std::fmt::Debug for ProgressiveMarkdownView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveMarkdownView")
            .field("disclosure", &self.controller.state())
            .field("monitor", &self.monitor)
            .field("state", &self.state)
            .field("sentinel", &self.sentinel)
            .field("mounted", &self.mounted)
            .finish_non_exhaustive()
    }
}

impl Default for ProgressiveMarkdownView {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressiveMarkdownView {
    pub fn new() -> Self {
        Self::with_options(ProgressiveOptions::default())
    }

    pub fn with_options(options: ProgressiveOptions) -> Self {
        let controller =
            RevealController::new("", options.chunk, options.initial_chunks, options.increment);
        let monitor = IntersectionMonitor::new(Box::new(ViewportObserver::new()), options.monitor);
        Self {
            controller,
            monitor,
            renderer: Box::new(MarkdownRenderer::new()),
            placeholder: Box::new(SkeletonPlaceholder::default()),
            options,
            state: ViewportState::default(),
            layout: Layout::default(),
            sentinel: None,
            next_marker: 0,
            auto_deadline: None,
            completed_for: None,
            on_render_complete: None,
            has_content: false,
            mounted: true,
        }
    }

    pub fn options(&self) -> &ProgressiveOptions {
        &self.options
    }

    /// Replaces the document. Identical content keeps the current progress; anything else starts
    /// over from the initial segments at the top.
    pub fn set_content(&mut self, content: &str) {
        self.has_content = true;
        if !self.controller.set_content(content) {
            return;
        }
        self.layout = Layout::default();
        self.state.to_top();
        self.state.x = 0;
        self.auto_deadline = None;
        self.sync_sentinel();
    }

    pub fn content(&self) -> &str {
        self.controller.content()
    }

    pub fn set_chunk_options(&mut self, chunk: ChunkOptions) {
        self.options.chunk = chunk;
        if self.controller.set_chunk_options(chunk) {
            self.layout = Layout::default();
            self.sentinel = None;
            self.sync_sentinel();
        }
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn SegmentRenderer + Send>) {
        self.renderer = renderer;
        self.layout = Layout::default();
    }

    pub fn set_placeholder(&mut self, placeholder: Box<dyn LoadingPlaceholder + Send>) {
        self.placeholder = placeholder;
        self.layout = Layout::default();
    }

    /// Swaps the visibility source. `None` means the host cannot report visibility; reveals then
    /// only happen through [`Self::load_more`], [`Self::load_all`] or auto-load mode.
    pub fn set_observer(&mut self, observer: Option<Box<dyn IntersectionObserver + Send>>) {
        self.monitor.disconnect();
        self.monitor = match observer {
            Some(observer) => IntersectionMonitor::new(observer, self.options.monitor),
            None => IntersectionMonitor::unsupported(self.options.monitor),
        };
        self.sentinel = None;
        self.sync_sentinel();
    }

    /// Runs `f` the first time a document is fully revealed. Fires again only after the content
    /// changes.
    pub fn set_on_render_complete(&mut self, f: impl FnMut() + Send + 'static) {
        self.on_render_complete = Some(Box::new(f));
    }

    pub fn disclosure(&self) -> DisclosureState {
        self.controller.state()
    }

    pub fn controller(&self) -> &RevealController {
        &self.controller
    }

    pub fn phase(&self) -> RevealPhase {
        let c = &self.controller;
        if !c.has_more() {
            RevealPhase::Complete
        } else if c.visible_count() == c.initial_visible() && !c.is_loading() {
            RevealPhase::Initial
        } else {
            RevealPhase::Revealing
        }
    }

    /// Marker currently placed after the last revealed segment.
    pub fn sentinel_marker(&self) -> Option<MarkerId> {
        self.sentinel.map(|s| s.id)
    }

    /// Title for window chrome: the first heading, else the first line.
    pub fn title(&self) -> String {
        meta::extract_title(self.controller.content(), meta::DEFAULT_TITLE_MAX_CHARS)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn load_more(&mut self) -> bool {
        self.mounted && self.controller.load_more()
    }

    pub fn load_all(&mut self) -> bool {
        self.mounted && self.controller.load_all()
    }

    /// Advances the reveal loop by one frame.
    pub fn tick(&mut self, now: Instant) -> RevealAction {
        if !self.mounted {
            return RevealAction::None;
        }

        let mut action = RevealAction::None;
        if self.controller.on_frame() {
            action = RevealAction::Redraw;
        }
        self.sync_sentinel();

        let signal = self.monitor.poll();
        if self.options.auto_load_all {
            if self.controller.has_more() && !self.controller.is_loading() {
                match self.auto_deadline {
                    None => self.auto_deadline = Some(now + self.options.auto_load_delay),
                    Some(deadline) if now >= deadline => {
                        self.auto_deadline = None;
                        if self.controller.load_all() {
                            action = RevealAction::Redraw;
                        }
                    }
                    Some(_) => {}
                }
            }
        } else if signal.is_intersecting && self.controller.load_more() {
            tracing::trace!("sentinel near viewport, loading more");
            action = RevealAction::Redraw;
        }

        let generation = self.controller.generation();
        if self.has_content
            && !self.controller.has_more()
            && self.completed_for != Some(generation)
        {
            self.completed_for = Some(generation);
            tracing::debug!(
                segments = self.controller.total(),
                "all segments revealed"
            );
            if let Some(f) = self.on_render_complete.as_mut() {
                f();
            }
            action = RevealAction::Completed;
        }
        action
    }

    /// Handles scrolling and reveal keys. Reveal requests take effect on the next `tick`.
    pub fn handle_event(&mut self, event: InputEvent) -> RevealAction {
        match event {
            InputEvent::Key(key) => {
                if let Some(request) = self.options.reveal.action_for(&key) {
                    let queued = match request {
                        RevealRequest::More => self.load_more(),
                        RevealRequest::All => self.load_all(),
                    };
                    return if queued {
                        RevealAction::Redraw
                    } else {
                        RevealAction::None
                    };
                }
                let Some(action) = self.options.scroll.action_for(&key) else {
                    return RevealAction::None;
                };
                self.scroll(action)
            }
            InputEvent::Mouse(m) => {
                let action = self.options.scroll.action_for_mouse(m.kind);
                self.scroll(action)
            }
            InputEvent::Resize(..) => RevealAction::Redraw,
        }
    }

    fn scroll(&mut self, action: ScrollAction) -> RevealAction {
        if self.options.scroll.apply(&mut self.state, action) {
            RevealAction::Redraw
        } else {
            RevealAction::None
        }
    }

    pub fn scroll_y_by(&mut self, delta: i32) {
        self.state.scroll_y_by(delta);
    }

    /// Updates viewport size for `area`, minus scrollbar and padding.
    pub fn set_viewport(&mut self, area: Rect) {
        let content_area = if self.options.show_scrollbar && area.width >= 2 {
            Rect::new(area.x, area.y, area.width - 1, area.height)
        } else {
            area
        };
        let content_area = inset_h(
            content_area,
            self.options.padding_left,
            self.options.padding_right,
        );
        self.state
            .set_viewport(content_area.width, content_area.height);
    }

    pub fn render_ref(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let (content_area, scrollbar_x) = if self.options.show_scrollbar && area.width >= 2 {
            (
                Rect::new(area.x, area.y, area.width - 1, area.height),
                Some(area.x + area.width - 1),
            )
        } else {
            (area, None)
        };

        self.set_viewport(area);
        let inner = inset_h(
            content_area,
            self.options.padding_left,
            self.options.padding_right,
        );
        self.ensure_layout(inner.width, theme);
        self.sync_sentinel();

        for row in 0..content_area.height {
            let y = content_area.y + row;
            buf.set_style(
                Rect::new(content_area.x, y, content_area.width, 1),
                theme.text_primary,
            );
            if let Some(line) = self.line_at(self.state.y.saturating_add(row as u32)) {
                render_line_clipped(
                    inner.x,
                    y,
                    self.state.x,
                    inner.width,
                    buf,
                    line,
                    theme.text_primary,
                );
            }
        }

        if let Some(sb_x) = scrollbar_x {
            render_scrollbar(
                Rect::new(sb_x, area.y, 1, area.height),
                buf,
                &self.state,
                theme.text_muted,
            );
        }

        if self.sentinel.is_some() {
            let rows = self.sentinel_rows();
            self.monitor.on_layout(rows, &self.state);
        }
    }

    /// All rows at `width`, as they would be painted (gaps and placeholder included).
    pub fn lines_for_width(&mut self, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        let width = width
            .saturating_sub(self.options.padding_left)
            .saturating_sub(self.options.padding_right);
        self.ensure_layout(width, theme);
        (0..self.state.content_h)
            .map(|row| self.line_at(row).cloned().unwrap_or_default())
            .collect()
    }

    /// Stops observing and drops any queued reveal. Rendering still works; the reveal loop does
    /// not.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.monitor.disconnect();
        self.controller.cancel();
        self.sentinel = None;
        self.auto_deadline = None;
        self.on_render_complete = None;
        tracing::debug!("progressive view unmounted");
    }

    fn ensure_layout(&mut self, width: u16, theme: &Theme) {
        if self.layout.width != Some(width) {
            if self.layout.width.is_some() {
                tracing::trace!(width, "width changed, re-rendering segments");
            }
            self.layout = Layout {
                width: Some(width),
                ..Layout::default()
            };
        }

        let visible = self.controller.visible_count();
        if self.layout.segments.len() > visible {
            self.layout = Layout {
                width: Some(width),
                ..Layout::default()
            };
        }

        let gap = self.options.segment_gap as u32;
        while self.layout.segments.len() < visible {
            let i = self.layout.segments.len();
            let Some(text) = self.controller.segment(i) else {
                break;
            };
            let lines = self.renderer.render(text, width, theme);
            let start = if i == 0 {
                0
            } else {
                self.layout.segments_end() + gap
            };
            let widest = lines.iter().map(Line::width).max().unwrap_or(0) as u32;
            self.layout.content_w = self.layout.content_w.max(widest);
            tracing::trace!(segment = i, lines = lines.len(), "rendered segment");
            self.layout.starts.push(start);
            self.layout.segments.push(lines);
        }

        let has_more = self.controller.has_more();
        if has_more && self.layout.placeholder.is_empty() {
            self.layout.placeholder =
                self.placeholder
                    .render(self.options.placeholder_lines, width, theme);
        }

        let mut content_h = self.layout.segments_end();
        if has_more {
            content_h += 1 + self.layout.placeholder.len() as u32;
        }
        self.state.set_content(self.layout.content_w, content_h);
    }

    fn line_at(&self, row: u32) -> Option<&Line<'static>> {
        let end = self.layout.segments_end();
        if row < end {
            let i = self
                .layout
                .starts
                .partition_point(|&s| s <= row)
                .checked_sub(1)?;
            let local = (row - self.layout.starts[i]) as usize;
            return self.layout.segments[i].get(local);
        }
        if !self.controller.has_more() || row == end {
            return None;
        }
        self.layout.placeholder.get((row - end - 1) as usize)
    }

    /// The sentinel row and the placeholder below it.
    fn sentinel_rows(&self) -> std::ops::Range<u32> {
        let start = self.layout.segments_end();
        start..start + 1 + self.layout.placeholder.len() as u32
    }

    /// Places a fresh marker whenever the reveal boundary moved, and removes it once everything
    /// is visible.
    fn sync_sentinel(&mut self) {
        if !self.mounted {
            return;
        }
        if !self.controller.has_more() {
            self.sentinel = None;
            self.monitor.set_marker(None);
            return;
        }

        let generation = self.controller.generation();
        let visible = self.controller.visible_count();
        if self
            .sentinel
            .is_some_and(|s| s.generation == generation && s.visible == visible)
        {
            return;
        }

        self.next_marker += 1;
        let id = MarkerId::new(self.next_marker);
        self.sentinel = Some(Sentinel {
            id,
            generation,
            visible,
        });
        self.monitor.set_marker(Some(id));
    }
}

impl Drop for ProgressiveMarkdownView {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn inset_h(area: Rect, left: u16, right: u16) -> Rect {
    let left = left.min(area.width);
    let right = right.min(area.width.saturating_sub(left));
    Rect::new(
        area.x + left,
        area.y,
        area.width.saturating_sub(left + right),
        area.height,
    )
}
