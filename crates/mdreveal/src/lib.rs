//! Progressive markdown rendering for `ratatui`.
//!
//! Large documents are split into segments ([`mdreveal_markdown::segment`]), the first few are
//! rendered right away, and the rest are revealed as the user scrolls towards the end of what is
//! already visible.
//!
//! ## Pieces
//!
//! - [`disclosure::RevealController`]: how many segments are visible; reveals are applied one
//!   frame after they are requested.
//! - [`monitor::IntersectionMonitor`]: tracks whether the sentinel after the last revealed
//!   segment is near the viewport.
//! - [`view::ProgressiveMarkdownView`]: the widget tying both to rendering and input.
//!
//! ```rust
//! use mdreveal::view::ProgressiveMarkdownView;
//!
//! let mut view = ProgressiveMarkdownView::new();
//! view.set_content("# Notes\n\nShort documents are a single segment.");
//! assert!(!view.disclosure().has_more());
//! assert_eq!(view.title(), "Notes");
//! ```
pub mod disclosure;
pub mod monitor;
pub mod options;
pub mod view;

pub use mdreveal_core as core;
pub use mdreveal_markdown as markdown;

pub use options::ProgressiveOptions;
pub use view::ProgressiveMarkdownView;
pub use view::RevealAction;
