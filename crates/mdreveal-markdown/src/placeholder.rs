use mdreveal_core::theme::Theme;
use ratatui::text::Line;
use ratatui::text::Span;

/// Content shown below the revealed segments while more of the document is pending.
pub trait LoadingPlaceholder {
    fn render(&self, line_count: u16, width: u16, theme: &Theme) -> Vec<Line<'static>>;
}

/// Shimmer-free skeleton: shaded bars of varying length, like a paragraph being typeset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkeletonPlaceholder {
    pub fill: char,
    /// Bar widths as a percentage of the available width, cycled per line.
    pub widths_percent: Vec<u16>,
}

impl Default for SkeletonPlaceholder {
    fn default() -> Self {
        Self {
            fill: '░',
            widths_percent: vec![100, 92, 76],
        }
    }
}

impl LoadingPlaceholder for SkeletonPlaceholder {
    fn render(&self, line_count: u16, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        if self.widths_percent.is_empty() {
            return (0..line_count).map(|_| Line::default()).collect();
        }
        (0..line_count as usize)
            .map(|i| {
                let pct = self.widths_percent[i % self.widths_percent.len()].min(100) as usize;
                let cols = (width as usize * pct / 100).max(1);
                let bar: String = std::iter::repeat_n(self.fill, cols).collect();
                Line::from(Span::styled(bar, theme.placeholder))
            })
            .collect()
    }
}

/// A single muted text line such as `Loading…`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextPlaceholder {
    pub text: String,
}

impl Default for TextPlaceholder {
    fn default() -> Self {
        Self {
            text: "Loading…".to_string(),
        }
    }
}

impl LoadingPlaceholder for TextPlaceholder {
    fn render(&self, line_count: u16, _width: u16, theme: &Theme) -> Vec<Line<'static>> {
        if line_count == 0 {
            return Vec::new();
        }
        vec![Line::from(Span::styled(self.text.clone(), theme.text_muted))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdreveal_core::render::line_to_plain;

    #[test]
    fn skeleton_cycles_bar_widths() {
        let lines = SkeletonPlaceholder::default().render(4, 50, &Theme::default());
        let widths: Vec<usize> = lines.iter().map(|l| line_to_plain(l).chars().count()).collect();
        assert_eq!(widths, vec![50, 46, 38, 50]);
    }

    #[test]
    fn skeleton_uses_placeholder_style() {
        let theme = Theme::default();
        let lines = SkeletonPlaceholder::default().render(1, 10, &theme);
        assert_eq!(lines[0].spans[0].style, theme.placeholder);
    }

    #[test]
    fn zero_lines_render_nothing() {
        assert!(SkeletonPlaceholder::default().render(0, 10, &Theme::default()).is_empty());
        assert!(TextPlaceholder::default().render(0, 10, &Theme::default()).is_empty());
    }

    #[test]
    fn narrow_width_still_shows_a_bar() {
        let lines = SkeletonPlaceholder::default().render(1, 0, &Theme::default());
        assert_eq!(line_to_plain(&lines[0]), "░");
    }
}
