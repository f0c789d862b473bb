use ratatui::style::Style;

/// Styles shared by the markdown renderer, the loading placeholder and the view chrome.
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub text_primary: Style,
    pub text_muted: Style,
    pub accent: Style,
    pub heading: Style,
    pub link: Style,
    pub code_inline: Style,
    pub code_block: Style,
    pub blockquote: Style,
    pub placeholder: Style,
}

impl Default for Theme {
    fn default() -> Self {
        use ratatui::style::Stylize;

        Self {
            text_primary: Style::default(),
            text_muted: Style::default().dark_gray(),
            accent: Style::default().cyan(),
            heading: Style::default().cyan().bold(),
            link: Style::default().blue().underlined(),
            code_inline: Style::default().cyan(),
            code_block: Style::default().yellow(),
            blockquote: Style::default().dark_gray().italic(),
            placeholder: Style::default().dark_gray(),
        }
    }
}
