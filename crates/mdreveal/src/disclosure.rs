//! Reveal cursor over a segmented document.
//!
//! [`RevealController`] owns the content, its segments and how many of them are visible. Reveals
//! are two-step: [`RevealController::load_more`] only marks the controller as loading, and the
//! next [`RevealController::on_frame`] applies it. The host gets one frame to paint the loading
//! placeholder before the layout grows.

use std::ops::Range;
use std::sync::Arc;

use mdreveal_markdown::segment;
use mdreveal_markdown::segment::ChunkOptions;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisclosureState {
    pub visible_count: usize,
    pub total: usize,
    pub is_loading: bool,
}

impl DisclosureState {
    pub fn has_more(&self) -> bool {
        self.visible_count < self.total
    }

    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.visible_count as f64 / self.total as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RevealTarget {
    More,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingReveal {
    target: RevealTarget,
    generation: u64,
}

#[derive(Clone, Debug)]
pub struct RevealController {
    content: Arc<str>,
    chunk: ChunkOptions,
    segments: Vec<Range<usize>>,
    initial_visible: usize,
    increment: usize,
    visible_count: usize,
    is_loading: bool,
    pending: Option<PendingReveal>,
    /// Bumped on every content change; reveals queued under an older value are discarded.
    generation: u64,
}

impl RevealController {
    /// `initial_visible` is clamped to `1..=total`; an `increment` of zero is treated as one.
    pub fn new(
        content: impl Into<Arc<str>>,
        chunk: ChunkOptions,
        initial_visible: usize,
        increment: usize,
    ) -> Self {
        let content = content.into();
        let segments = segment::split_ranges(&content, &chunk);
        let visible_count = clamp_visible(initial_visible, segments.len());
        Self {
            content,
            chunk,
            segments,
            initial_visible,
            increment: increment.max(1),
            visible_count,
            is_loading: false,
            pending: None,
            generation: 0,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn chunk_options(&self) -> &ChunkOptions {
        &self.chunk
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the document. Identical content is a no-op; anything else starts over at the
    /// initial visible count. Returns whether the content changed.
    pub fn set_content(&mut self, content: &str) -> bool {
        if *self.content == *content {
            return false;
        }
        self.content = Arc::from(content);
        self.segments = segment::split_ranges(&self.content, &self.chunk);
        self.visible_count = clamp_visible(self.initial_visible, self.segments.len());
        self.is_loading = false;
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            segments = self.segments.len(),
            visible = self.visible_count,
            "content replaced"
        );
        true
    }

    /// Re-splits the current content. The visible count is kept, clamped to the new total; a
    /// fully revealed document stays fully revealed.
    pub fn set_chunk_options(&mut self, chunk: ChunkOptions) -> bool {
        if self.chunk == chunk {
            return false;
        }
        let complete = !self.has_more();
        self.chunk = chunk;
        self.segments = segment::split_ranges(&self.content, &self.chunk);
        self.visible_count = if complete {
            self.segments.len()
        } else {
            clamp_visible(self.visible_count, self.segments.len())
        };
        true
    }

    /// Queues a reveal of the next `increment` segments. Returns `false` when everything is
    /// already visible or a reveal is still pending.
    pub fn load_more(&mut self) -> bool {
        self.request(RevealTarget::More)
    }

    /// Queues a reveal of all remaining segments, under the same rules as [`Self::load_more`].
    pub fn load_all(&mut self) -> bool {
        self.request(RevealTarget::All)
    }

    fn request(&mut self, target: RevealTarget) -> bool {
        if !self.has_more() || self.is_loading {
            return false;
        }
        self.is_loading = true;
        self.pending = Some(PendingReveal {
            target,
            generation: self.generation,
        });
        true
    }

    /// Applies the queued reveal, if any. Returns whether the visible count changed.
    pub fn on_frame(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if pending.generation != self.generation {
            tracing::trace!(
                queued = pending.generation,
                current = self.generation,
                "dropping reveal queued for replaced content"
            );
            return false;
        }

        let total = self.segments.len();
        let before = self.visible_count;
        self.visible_count = match pending.target {
            RevealTarget::More => self.visible_count.saturating_add(self.increment).min(total),
            RevealTarget::All => total,
        };
        self.is_loading = false;
        tracing::debug!(
            from = before,
            to = self.visible_count,
            total,
            "revealed segments"
        );
        self.visible_count != before
    }

    /// Drops any queued reveal.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.is_loading = false;
    }

    pub fn state(&self) -> DisclosureState {
        DisclosureState {
            visible_count: self.visible_count,
            total: self.segments.len(),
            is_loading: self.is_loading,
        }
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Visible count a fresh document starts with.
    pub fn initial_visible(&self) -> usize {
        clamp_visible(self.initial_visible, self.segments.len())
    }

    pub fn total(&self) -> usize {
        self.segments.len()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn has_more(&self) -> bool {
        self.state().has_more()
    }

    pub fn progress(&self) -> f64 {
        self.state().progress()
    }

    pub fn segment(&self, i: usize) -> Option<&str> {
        self.segments.get(i).map(|r| &self.content[r.clone()])
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().map(|r| &self.content[r.clone()])
    }

    pub fn visible_segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments().take(self.visible_count)
    }
}

fn clamp_visible(count: usize, total: usize) -> usize {
    count.clamp(1.min(total), total)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `n` paragraphs of about 100 bytes each; with a chunk size of 100 every paragraph becomes
    /// one segment.
    fn doc(n: usize) -> String {
        (0..n)
            .map(|i| format!("{i:03} {}\n\n", "word ".repeat(19)))
            .collect()
    }

    fn controller(n: usize, initial: usize, increment: usize) -> RevealController {
        RevealController::new(
            doc(n),
            ChunkOptions {
                chunk_size: 100,
                overlap_size: 10,
                ..ChunkOptions::default()
            },
            initial,
            increment,
        )
    }

    #[test]
    fn starts_at_initial_count() {
        let c = controller(5, 2, 1);
        assert_eq!(c.total(), 5);
        assert_eq!(c.visible_count(), 2);
        assert!(c.has_more());
        assert!(!c.is_loading());
    }

    #[test]
    fn initial_count_is_clamped() {
        assert_eq!(controller(3, 10, 1).visible_count(), 3);
        assert_eq!(controller(3, 0, 1).visible_count(), 1);
    }

    #[test]
    fn short_content_has_nothing_more() {
        let c = RevealController::new("short text", ChunkOptions::default(), 1, 1);
        assert_eq!(c.total(), 1);
        assert!(!c.has_more());
        assert_eq!(c.progress(), 1.0);
    }

    #[test]
    fn load_more_is_deferred_to_next_frame() {
        let mut c = controller(5, 1, 2);
        assert!(c.load_more());
        assert!(c.is_loading());
        assert_eq!(c.visible_count(), 1);

        assert!(c.on_frame());
        assert!(!c.is_loading());
        assert_eq!(c.visible_count(), 3);
    }

    #[test]
    fn requests_while_loading_are_ignored() {
        let mut c = controller(5, 1, 1);
        assert!(c.load_more());
        assert!(!c.load_more());
        assert!(!c.load_all());
        c.on_frame();
        assert_eq!(c.visible_count(), 2);
    }

    #[test]
    fn load_all_reveals_everything() {
        let mut c = controller(5, 1, 1);
        assert!(c.load_all());
        c.on_frame();
        assert_eq!(c.visible_count(), 5);
        assert!(!c.has_more());
        assert!(!c.load_more());
    }

    #[test]
    fn increment_never_overshoots() {
        let mut c = controller(4, 3, 5);
        c.load_more();
        c.on_frame();
        assert_eq!(c.visible_count(), 4);
    }

    #[test]
    fn content_change_resets_progress_and_drops_pending_reveal() {
        let mut c = controller(5, 2, 1);
        c.load_all();
        c.on_frame();
        c.load_more();
        assert_eq!(c.visible_count(), 5);

        let mut c2 = controller(6, 2, 1);
        c2.load_more();
        assert!(c2.set_content(&doc(8)));
        assert_eq!(c2.visible_count(), 2);
        assert!(!c2.is_loading());
        assert!(!c2.on_frame());
        assert_eq!(c2.visible_count(), 2);
    }

    #[test]
    fn same_content_is_not_a_change() {
        let mut c = controller(5, 1, 1);
        c.load_more();
        c.on_frame();
        let same = c.content().to_string();
        assert!(!c.set_content(&same));
        assert_eq!(c.visible_count(), 2);
        assert_eq!(c.generation(), 0);
    }

    #[test]
    fn cancel_discards_pending_reveal() {
        let mut c = controller(5, 1, 1);
        c.load_more();
        c.cancel();
        assert!(!c.is_loading());
        assert!(!c.on_frame());
        assert_eq!(c.visible_count(), 1);
    }

    #[test]
    fn rechunking_keeps_visible_count_within_total() {
        let mut c = controller(5, 5, 1);
        assert!(c.set_chunk_options(ChunkOptions::default()));
        assert_eq!(c.total(), 1);
        assert_eq!(c.visible_count(), 1);
        assert!(!c.set_chunk_options(ChunkOptions::default()));
    }

    #[test]
    fn rechunking_a_complete_document_keeps_it_complete() {
        let mut c = controller(3, 1, 1);
        c.load_all();
        c.on_frame();
        assert!(!c.has_more());

        assert!(c.set_chunk_options(ChunkOptions {
            chunk_size: 30,
            overlap_size: 5,
            ..ChunkOptions::default()
        }));
        assert!(c.total() > 3);
        assert_eq!(c.visible_count(), c.total());
        assert!(!c.has_more());
        assert_eq!(c.generation(), 0);
    }

    #[test]
    fn rechunking_mid_reveal_keeps_count() {
        let mut c = controller(4, 2, 1);
        c.set_chunk_options(ChunkOptions {
            chunk_size: 30,
            overlap_size: 5,
            ..ChunkOptions::default()
        });
        assert_eq!(c.visible_count(), 2);
        assert!(c.has_more());
    }

    #[test]
    fn visible_segments_follow_count() {
        let mut c = controller(4, 1, 1);
        assert_eq!(c.visible_segments().count(), 1);
        c.load_more();
        c.on_frame();
        let visible: Vec<&str> = c.visible_segments().collect();
        assert_eq!(visible.len(), 2);
        assert!(visible[1].starts_with("001 "));
        assert_eq!(c.segments().collect::<String>(), c.content());
    }

    #[test]
    fn progress_tracks_visible_fraction() {
        let mut c = controller(4, 1, 1);
        assert_eq!(c.progress(), 0.25);
        c.load_more();
        assert_eq!(c.state().visible_count, 1);
        assert!(c.state().is_loading);
        c.on_frame();
        assert_eq!(c.progress(), 0.5);
    }
}
