//! Keyboard shortcut matching.

use crate::dispatch::{Key, KeyEvent};
use crate::model::node::MarkType;

/// Mark shortcuts, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    /// `mod+b`
    Bold,
    /// `mod+i`
    Italic,
    /// `mod+u`
    Underlined,
    /// ``mod+` ``
    Code,
}

impl Hotkey {
    pub const ALL: [Hotkey; 4] = [Self::Bold, Self::Italic, Self::Underlined, Self::Code];

    pub fn key(self) -> char {
        match self {
            Self::Bold => 'b',
            Self::Italic => 'i',
            Self::Underlined => 'u',
            Self::Code => '`',
        }
    }

    pub fn mark(self) -> MarkType {
        match self {
            Self::Bold => MarkType::Bold,
            Self::Italic => MarkType::Italic,
            Self::Underlined => MarkType::Underlined,
            Self::Code => MarkType::Code,
        }
    }

    /// Exact match: platform modifier held, shift and alt released.
    pub fn matches(self, event: &KeyEvent) -> bool {
        let Key::Char(pressed) = event.key else {
            return false;
        };
        let modifiers = event.modifiers;
        modifiers.is_mod()
            && !modifiers.shift
            && !modifiers.alt
            && pressed.to_ascii_lowercase() == self.key()
    }

    /// First hotkey matching `event`.
    pub fn find(event: &KeyEvent) -> Option<Self> {
        Self::ALL.into_iter().find(|hotkey| hotkey.matches(event))
    }
}
