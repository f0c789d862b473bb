use std::time::Duration;

use mdreveal_core::input::KeyEvent;
use mdreveal_core::keymap;
use mdreveal_core::keymap::Binding;
use mdreveal_core::scroll::ScrollBindings;
use mdreveal_markdown::OptionsError;
use mdreveal_markdown::segment::ChunkOptions;

use crate::monitor::MonitorOptions;

pub const DEFAULT_AUTO_LOAD_DELAY: Duration = Duration::from_millis(100);

/// Explicit reveal requests, independent of scrolling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealRequest {
    More,
    All,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealBindings {
    pub load_more: Binding,
    pub load_all: Binding,
}

impl Default for RevealBindings {
    fn default() -> Self {
        Self {
            load_more: Binding::new("n", "load more", vec![keymap::key_char('n')]),
            load_all: Binding::new("a", "load all", vec![keymap::key_char('a')]),
        }
    }
}

impl RevealBindings {
    pub fn action_for(&self, key: &KeyEvent) -> Option<RevealRequest> {
        if self.load_more.matches(key) {
            Some(RevealRequest::More)
        } else if self.load_all.matches(key) {
            Some(RevealRequest::All)
        } else {
            None
        }
    }

    /// `"n load more  a load all"`
    pub fn help_line(&self) -> String {
        format!("{}  {}", self.load_more.help(), self.load_all.help())
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ProgressiveOptions {
    pub chunk: ChunkOptions,
    /// Segments visible before any reveal.
    pub initial_chunks: usize,
    /// Segments added per reveal.
    pub increment: usize,
    /// Reveal everything shortly after mount, without waiting for the sentinel.
    pub auto_load_all: bool,
    pub auto_load_delay: Duration,
    pub monitor: MonitorOptions,
    pub placeholder_lines: u16,
    /// Blank rows between consecutive segments.
    pub segment_gap: u16,
    pub show_scrollbar: bool,
    pub padding_left: u16,
    pub padding_right: u16,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub scroll: ScrollBindings,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub reveal: RevealBindings,
}

impl Default for ProgressiveOptions {
    fn default() -> Self {
        Self {
            chunk: ChunkOptions::default(),
            initial_chunks: 1,
            increment: 1,
            auto_load_all: false,
            auto_load_delay: DEFAULT_AUTO_LOAD_DELAY,
            monitor: MonitorOptions::default(),
            placeholder_lines: 3,
            segment_gap: 1,
            show_scrollbar: true,
            padding_left: 0,
            padding_right: 0,
            scroll: ScrollBindings::default(),
            reveal: RevealBindings::default(),
        }
    }
}

impl ProgressiveOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        self.chunk.validate()?;
        if self.increment == 0 {
            return Err(OptionsError::ZeroIncrement);
        }
        Ok(())
    }
}
