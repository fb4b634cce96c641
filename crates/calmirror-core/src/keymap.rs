//! Keyboard shortcuts for date navigation and view switching.

use std::fmt;
use std::str::FromStr;

use crate::view::{CalendarView, Direction};

/// A key press with its modifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChord {
    /// Lowercased key name, e.g. `"t"` or `"arrowleft"`.
    pub key: String,
    pub ctrl: bool,
    /// The Command key on macOS.
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

/// The action a shortcut triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Navigate(Direction),
    Today,
    SetView(CalendarView),
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Resolves this chord to a shortcut.
    ///
    /// Returns `None` when a text input has focus or when the chord is not
    /// bound.
    pub fn resolve(&self, input_focused: bool) -> Option<Shortcut> {
        if input_focused {
            return None;
        }
        let plain = !self.shift && !self.ctrl && !self.meta;
        match self.key.as_str() {
            "arrowleft" if plain => Some(Shortcut::Navigate(Direction::Prev)),
            "arrowright" if plain => Some(Shortcut::Navigate(Direction::Next)),
            "t" if self.command() => Some(Shortcut::Today),
            "d" if self.command() && !self.shift => Some(Shortcut::SetView(CalendarView::Day)),
            "w" if self.command() && !self.shift => Some(Shortcut::SetView(CalendarView::Week)),
            "w" if self.command() => Some(Shortcut::SetView(CalendarView::WorkWeek)),
            "m" if self.command() && !self.shift => Some(Shortcut::SetView(CalendarView::Month)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseChordError {
    #[error("empty key chord")]
    Empty,
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
}

impl FromStr for KeyChord {
    type Err = ParseChordError;

    /// Parses chords like `ctrl+shift+w`, `cmd+t` or `left`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let key = match parts.pop() {
            Some(k) if !k.is_empty() => k.to_ascii_lowercase(),
            _ => return Err(ParseChordError::Empty),
        };
        let key = match key.as_str() {
            "left" => "arrowleft".to_string(),
            "right" => "arrowright".to_string(),
            _ => key,
        };

        let mut chord = KeyChord::new(key);
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "cmd" | "meta" | "super" => chord.meta = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                other => return Err(ParseChordError::UnknownModifier(other.to_string())),
            }
        }
        Ok(chord)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.meta {
            f.write_str("cmd+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(chord: &str) -> Option<Shortcut> {
        chord.parse::<KeyChord>().unwrap().resolve(false)
    }

    #[test]
    fn arrows_navigate_without_modifiers() {
        assert_eq!(resolve("left"), Some(Shortcut::Navigate(Direction::Prev)));
        assert_eq!(resolve("ArrowRight"), Some(Shortcut::Navigate(Direction::Next)));
        assert_eq!(resolve("shift+left"), None);
        assert_eq!(resolve("ctrl+right"), None);
    }

    #[test]
    fn view_shortcuts() {
        assert_eq!(resolve("ctrl+t"), Some(Shortcut::Today));
        assert_eq!(resolve("cmd+t"), Some(Shortcut::Today));
        assert_eq!(resolve("ctrl+d"), Some(Shortcut::SetView(CalendarView::Day)));
        assert_eq!(resolve("ctrl+w"), Some(Shortcut::SetView(CalendarView::Week)));
        assert_eq!(resolve("cmd+m"), Some(Shortcut::SetView(CalendarView::Month)));
        assert_eq!(
            resolve("ctrl+shift+w"),
            Some(Shortcut::SetView(CalendarView::WorkWeek))
        );
        assert_eq!(resolve("t"), None);
        assert_eq!(resolve("ctrl+shift+m"), None);
    }

    #[test]
    fn ignored_while_typing() {
        let chord = KeyChord::new("arrowleft");
        assert_eq!(chord.resolve(true), None);
        assert_eq!(KeyChord::new("t").with_ctrl().resolve(true), None);
    }

    #[test]
    fn parse_errors() {
        assert_eq!("".parse::<KeyChord>(), Err(ParseChordError::Empty));
        assert_eq!(
            "hyper+t".parse::<KeyChord>(),
            Err(ParseChordError::UnknownModifier("hyper".into()))
        );
        assert_eq!(
            "Ctrl+Shift+W".parse::<KeyChord>().unwrap().to_string(),
            "ctrl+shift+w"
        );
    }
}
