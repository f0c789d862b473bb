//! Markdown-specific pieces of `mdreveal`.
//!
//! - [`segment`]: splits a large document into contiguous segments without breaking code fences.
//! - [`render`]: turns one segment into terminal lines ([`render::SegmentRenderer`]).
//! - [`placeholder`]: what is drawn below the revealed segments while more is pending.
//! - [`meta`]: cheap title/snippet extraction for window chrome.
pub mod error;
pub mod meta;
pub mod placeholder;
pub mod render;
pub mod segment;

pub use error::OptionsError;
pub use segment::ChunkOptions;
