use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::KeyModifiers;

/// A named group of keys, with the text shown for it in a help/status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub keys: Vec<KeyEvent>,
    pub help_key: String,
    pub help_desc: String,
}

impl Binding {
    pub fn new(
        help_key: impl Into<String>,
        help_desc: impl Into<String>,
        keys: Vec<KeyEvent>,
    ) -> Self {
        Self {
            keys,
            help_key: help_key.into(),
            help_desc: help_desc.into(),
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.keys.iter().any(|k| key_event_matches(k, event))
    }

    /// `"key desc"`, as rendered in a help line.
    pub fn help(&self) -> String {
        format!("{} {}", self.help_key, self.help_desc)
    }
}

pub fn key_event_matches(pattern: &KeyEvent, event: &KeyEvent) -> bool {
    if pattern.code != event.code {
        return false;
    }
    // Shifted letters already arrive as uppercase chars; only ctrl/alt must agree for them.
    if matches!(pattern.code, KeyCode::Char(_)) {
        return pattern.modifiers.ctrl == event.modifiers.ctrl
            && pattern.modifiers.alt == event.modifiers.alt;
    }
    pattern.modifiers == event.modifiers
}

pub fn matches_any(patterns: &[KeyEvent], event: &KeyEvent) -> bool {
    patterns.iter().any(|p| key_event_matches(p, event))
}

pub fn key_char(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c))
}

pub fn key_ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c)).with_modifiers(KeyModifiers::ctrl())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_requires_matching_ctrl() {
        let b = Binding::new("n", "load more", vec![key_char('n')]);
        assert!(b.matches(&key_char('n')));
        assert!(!b.matches(&key_ctrl('n')));
    }

    #[test]
    fn shifted_chars_match_without_shift_in_pattern() {
        let shifted = key_char('G').with_modifiers(KeyModifiers {
            shift: true,
            ..KeyModifiers::none()
        });
        assert!(matches_any(&[key_char('G')], &shifted));
    }

    #[test]
    fn non_char_keys_compare_all_modifiers() {
        let plain = KeyEvent::new(KeyCode::End);
        let shifted = KeyEvent::new(KeyCode::End).with_modifiers(KeyModifiers {
            shift: true,
            ..KeyModifiers::none()
        });
        assert!(!key_event_matches(&plain, &shifted));
    }

    #[test]
    fn help_joins_key_and_description() {
        let b = Binding::new("a", "reveal all", vec![key_char('a')]);
        assert_eq!(b.help(), "a reveal all");
    }
}
