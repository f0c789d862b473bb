//! `mdreveal-core` provides the terminal building blocks the progressive markdown view is made of.
//!
//! Nothing in here knows about markdown or segments. The crate covers what every terminal
//! document viewer needs: a scrollable [`viewport::ViewportState`], key/mouse input types that are
//! independent of the terminal backend, configurable bindings, clipped span painting, and
//! span-aware word wrapping.
//!
//! ## Design goals
//!
//! - Event-loop agnostic: you drive input + rendering from your app.
//! - No async runtime: all components run on the main thread.
//! - Backend adapters are opt-in (`crossterm` feature).
pub mod theme;

#[cfg(feature = "crossterm")]
pub mod crossterm_input;

pub mod input;
pub mod keymap;
pub mod render;
pub mod scroll;
pub mod viewport;
pub mod wrapping;
