use mdreveal::ProgressiveMarkdownView;
use mdreveal::ProgressiveOptions;
use mdreveal::RevealAction;
use mdreveal::core::input::InputEvent;
use mdreveal::core::input::KeyCode;
use mdreveal::core::input::KeyEvent;
use mdreveal::core::theme::Theme;
use mdreveal::markdown::segment::ChunkOptions;
use mdreveal::monitor::ManualObserver;
use mdreveal::view::RevealPhase;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

/// Plain prose with paragraph breaks, exactly `len` bytes.
fn prose(len: usize) -> String {
    let sentence = "The quick brown fox jumps over the lazy dog. ";
    let mut s = String::new();
    while s.len() < len {
        for _ in 0..9 {
            s.push_str(sentence);
        }
        s.push_str("End of paragraph.\n\n");
    }
    s.truncate(len);
    s
}

/// `n` paragraphs of 101 bytes; a chunk size of 100 makes each one a segment.
fn paragraphs(n: usize) -> String {
    (0..n)
        .map(|i| format!("{i:03} {}\n\n", "word ".repeat(19)))
        .collect()
}

fn small_chunks() -> ChunkOptions {
    ChunkOptions {
        chunk_size: 100,
        overlap_size: 10,
        ..ChunkOptions::default()
    }
}

fn counter(view: &mut ProgressiveMarkdownView) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    view.set_on_render_complete(move || {
        c.fetch_add(1, Ordering::SeqCst);
    });
    count
}

fn manual(options: ProgressiveOptions) -> (ProgressiveMarkdownView, ManualObserver) {
    let handle = ManualObserver::new();
    let mut view = ProgressiveMarkdownView::with_options(options);
    view.set_observer(Some(Box::new(handle.clone())));
    (view, handle)
}

/// Signals the current sentinel as visible and runs the two frames a reveal takes.
fn reveal_once(view: &mut ProgressiveMarkdownView, handle: &ManualObserver) -> RevealAction {
    let marker = view.sentinel_marker().expect("sentinel while more remains");
    handle.signal(marker, true);
    view.tick(Instant::now());
    view.tick(Instant::now())
}

#[test]
fn short_text_is_complete_immediately() {
    let mut view = ProgressiveMarkdownView::new();
    let done = counter(&mut view);
    view.set_content("short text");

    let state = view.disclosure();
    assert_eq!(state.total, 1);
    assert!(!state.has_more());
    assert_eq!(view.sentinel_marker(), None);

    assert_eq!(view.tick(Instant::now()), RevealAction::Completed);
    assert_eq!(view.tick(Instant::now()), RevealAction::None);
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[test]
fn twelve_thousand_chars_need_one_reveal_after_two_initial_segments() {
    let (mut view, handle) = manual(ProgressiveOptions {
        initial_chunks: 2,
        ..ProgressiveOptions::default()
    });
    let done = counter(&mut view);
    view.set_content(&prose(12_000));

    assert_eq!(view.disclosure().total, 3);
    assert_eq!(view.disclosure().visible_count, 2);
    assert_eq!(view.tick(Instant::now()), RevealAction::None);

    assert_eq!(reveal_once(&mut view, &handle), RevealAction::Completed);
    assert_eq!(view.disclosure().visible_count, 3);
    assert!(!view.disclosure().has_more());
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[test]
fn auto_load_all_completes_without_visibility_signals() {
    let mut view = ProgressiveMarkdownView::with_options(ProgressiveOptions {
        chunk: small_chunks(),
        auto_load_all: true,
        ..ProgressiveOptions::default()
    });
    view.set_observer(None);
    let done = counter(&mut view);
    view.set_content(&paragraphs(4));
    assert_eq!(view.disclosure().total, 4);

    let start = Instant::now();
    let mut now = start;
    while view.disclosure().has_more() && now < start + Duration::from_secs(1) {
        view.tick(now);
        now += Duration::from_millis(16);
    }
    view.tick(now);

    assert_eq!(view.disclosure().visible_count, 4);
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[test]
fn completion_fires_once_across_several_reveals() {
    let (mut view, handle) = manual(ProgressiveOptions {
        chunk: small_chunks(),
        ..ProgressiveOptions::default()
    });
    let done = counter(&mut view);
    view.set_content(&paragraphs(4));

    assert_eq!(reveal_once(&mut view, &handle), RevealAction::Redraw);
    assert_eq!(reveal_once(&mut view, &handle), RevealAction::Redraw);
    assert_eq!(done.load(Ordering::SeqCst), 0);
    assert_eq!(reveal_once(&mut view, &handle), RevealAction::Completed);
    assert_eq!(done.load(Ordering::SeqCst), 1);

    for _ in 0..5 {
        view.tick(Instant::now());
    }
    assert!(!view.load_more());
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[test]
fn disclosure_only_grows_until_content_changes() {
    let (mut view, handle) = manual(ProgressiveOptions {
        chunk: small_chunks(),
        increment: 2,
        ..ProgressiveOptions::default()
    });
    view.set_content(&paragraphs(9));

    let mut last = view.disclosure().visible_count;
    for step in 0..30 {
        match step % 3 {
            0 => {
                if let Some(marker) = view.sentinel_marker() {
                    handle.signal(marker, true);
                }
            }
            1 => {
                view.load_more();
            }
            _ => {}
        }
        view.tick(Instant::now());
        let state = view.disclosure();
        assert!(state.visible_count >= last);
        assert!(state.visible_count <= state.total);
        last = state.visible_count;
    }
    assert_eq!(last, 9);
}

#[test]
fn content_change_resets_progress_and_completion() {
    let (mut view, handle) = manual(ProgressiveOptions {
        chunk: small_chunks(),
        ..ProgressiveOptions::default()
    });
    let done = counter(&mut view);
    view.set_content(&paragraphs(2));
    assert_eq!(reveal_once(&mut view, &handle), RevealAction::Completed);
    assert_eq!(view.phase(), RevealPhase::Complete);

    view.set_content(&paragraphs(3));
    let state = view.disclosure();
    assert_eq!(state.visible_count, 1);
    assert!(!state.is_loading);
    assert_eq!(view.phase(), RevealPhase::Initial);

    reveal_once(&mut view, &handle);
    assert_eq!(reveal_once(&mut view, &handle), RevealAction::Completed);
    assert_eq!(done.load(Ordering::SeqCst), 2);
}

#[test]
fn rechunking_a_complete_document_stays_complete() {
    let (mut view, handle) = manual(ProgressiveOptions {
        chunk: small_chunks(),
        ..ProgressiveOptions::default()
    });
    let done = counter(&mut view);
    view.set_content(&paragraphs(3));
    assert!(view.load_all());
    assert_eq!(view.tick(Instant::now()), RevealAction::Completed);
    assert_eq!(view.phase(), RevealPhase::Complete);

    view.set_chunk_options(ChunkOptions {
        chunk_size: 30,
        overlap_size: 5,
        ..ChunkOptions::default()
    });
    let state = view.disclosure();
    assert!(state.total > 3);
    assert_eq!(state.visible_count, state.total);
    assert_eq!(view.phase(), RevealPhase::Complete);
    assert_eq!(view.sentinel_marker(), None);

    assert_eq!(view.tick(Instant::now()), RevealAction::None);
    assert!(handle.observed().is_empty());
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[test]
fn same_content_keeps_progress() {
    let (mut view, handle) = manual(ProgressiveOptions {
        chunk: small_chunks(),
        ..ProgressiveOptions::default()
    });
    let doc = paragraphs(3);
    view.set_content(&doc);
    reveal_once(&mut view, &handle);
    view.set_content(&doc);
    assert_eq!(view.disclosure().visible_count, 2);
}

#[test]
fn reveal_queued_before_content_change_is_dropped() {
    let (mut view, _) = manual(ProgressiveOptions {
        chunk: small_chunks(),
        ..ProgressiveOptions::default()
    });
    view.set_content(&paragraphs(5));
    assert!(view.load_all());
    view.set_content(&paragraphs(6));
    view.tick(Instant::now());
    assert_eq!(view.disclosure().visible_count, 1);
}

#[test]
fn signals_for_an_old_sentinel_are_ignored() {
    let (mut view, handle) = manual(ProgressiveOptions {
        chunk: small_chunks(),
        ..ProgressiveOptions::default()
    });
    view.set_content(&paragraphs(4));
    let first = view.sentinel_marker().expect("sentinel");
    reveal_once(&mut view, &handle);
    assert_eq!(view.disclosure().visible_count, 2);

    handle.signal(first, true);
    view.tick(Instant::now());
    view.tick(Instant::now());
    assert_eq!(view.disclosure().visible_count, 2);
}

#[test]
fn unmount_tears_down_reveal_loop() {
    let (mut view, handle) = manual(ProgressiveOptions {
        chunk: small_chunks(),
        ..ProgressiveOptions::default()
    });
    let done = counter(&mut view);
    view.set_content(&paragraphs(3));
    let marker = view.sentinel_marker().expect("sentinel");
    assert!(handle.is_observing(marker));

    assert!(view.load_all());
    view.unmount();
    assert!(handle.observed().is_empty());

    handle.signal(marker, true);
    assert_eq!(view.tick(Instant::now()), RevealAction::None);
    assert_eq!(view.disclosure().visible_count, 1);
    assert!(!view.load_more());
    assert_eq!(done.load(Ordering::SeqCst), 0);
}

#[test]
fn dropping_the_view_unobserves() {
    let (mut view, handle) = manual(ProgressiveOptions {
        chunk: small_chunks(),
        ..ProgressiveOptions::default()
    });
    view.set_content(&paragraphs(3));
    assert_eq!(handle.observed().len(), 1);
    drop(view);
    assert!(handle.observed().is_empty());
}

#[test]
fn without_observer_only_explicit_reveals_happen() {
    let mut view = ProgressiveMarkdownView::with_options(ProgressiveOptions {
        chunk: small_chunks(),
        ..ProgressiveOptions::default()
    });
    view.set_observer(None);
    view.set_content(&paragraphs(3));

    let area = Rect::new(0, 0, 40, 40);
    let mut buf = Buffer::empty(area);
    for _ in 0..5 {
        view.render_ref(area, &mut buf, &Theme::default());
        view.tick(Instant::now());
    }
    assert_eq!(view.disclosure().visible_count, 1);

    assert!(view.load_all());
    view.tick(Instant::now());
    assert!(!view.disclosure().has_more());
}

#[test]
fn scrolling_towards_the_sentinel_reveals_more() {
    let mut view = ProgressiveMarkdownView::with_options(ProgressiveOptions {
        chunk: small_chunks(),
        ..ProgressiveOptions::default()
    });
    view.set_content(&paragraphs(30));

    let theme = Theme::default();
    let area = Rect::new(0, 0, 40, 10);
    let mut buf = Buffer::empty(area);
    let mut frames = |view: &mut ProgressiveMarkdownView| {
        for _ in 0..40 {
            view.render_ref(area, &mut buf, &theme);
            view.tick(Instant::now());
        }
    };

    frames(&mut view);
    let settled = view.disclosure().visible_count;
    assert!(settled > 1, "lookahead reveals past the first screen");
    assert!(view.disclosure().has_more(), "reveals stop once the sentinel is out of reach");

    view.handle_event(InputEvent::Key(KeyEvent::new(KeyCode::End)));
    frames(&mut view);
    assert!(view.disclosure().visible_count > settled);
}
