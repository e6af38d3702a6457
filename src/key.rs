//! Type-safe key bindings shared by the widgets in this crate.
//!
//! A [`Binding`] groups one or more key presses with the help text shown for
//! them. Widgets keep their bindings in a key map struct and implement
//! [`KeyMap`] so an application can render help for them.
//!
//! ```rust
//! use countdown_widgets::key::Binding;
//! use crossterm::event::{KeyCode, KeyModifiers};
//!
//! let start = Binding::new(vec![KeyCode::Char('s')]).with_help("s", "start countdown");
//! let quit = Binding::new(vec![(KeyCode::Char('c'), KeyModifiers::CONTROL)]).with_help("ctrl+c", "quit");
//! assert_eq!(start.help().key, "s");
//! assert!(!quit.keys().is_empty());
//! ```

use bubbletea_rs::KeyMsg;
use crossterm::event::{KeyCode, KeyModifiers};

/// A single key press: a key code plus the modifiers that must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key code.
    pub code: KeyCode,
    /// Modifiers that must be held. `SHIFT` is ignored for character keys
    /// and back-tab.
    pub mods: KeyModifiers,
}

impl From<KeyCode> for KeyPress {
    fn from(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::NONE,
        }
    }
}

impl From<(KeyCode, KeyModifiers)> for KeyPress {
    fn from((code, mods): (KeyCode, KeyModifiers)) -> Self {
        Self { code, mods }
    }
}

impl KeyPress {
    fn matches(&self, msg: &KeyMsg) -> bool {
        if self.code != msg.key {
            return false;
        }
        // Terminals report shifted characters with SHIFT set; the character
        // itself already carries the case.
        let mods = match msg.key {
            KeyCode::Char(_) | KeyCode::BackTab => msg.modifiers.difference(KeyModifiers::SHIFT),
            _ => msg.modifiers,
        };
        mods == self.mods
    }
}

/// Help text for a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Help {
    /// Human readable key, e.g. `"ctrl+c"`.
    pub key: String,
    /// What the binding does.
    pub desc: String,
}

/// A set of key presses bound to one action.
#[derive(Debug, Clone)]
pub struct Binding {
    keys: Vec<KeyPress>,
    help: Help,
    enabled: bool,
}

impl Binding {
    /// Creates a binding from anything convertible into [`KeyPress`].
    pub fn new<K: Into<KeyPress>>(keys: Vec<K>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            help: Help::default(),
            enabled: true,
        }
    }

    /// Sets the help text.
    pub fn with_help(mut self, key: impl Into<String>, desc: impl Into<String>) -> Self {
        self.help = Help {
            key: key.into(),
            desc: desc.into(),
        };
        self
    }

    /// The key presses of this binding.
    pub fn keys(&self) -> &[KeyPress] {
        &self.keys
    }

    /// The help text of this binding.
    pub fn help(&self) -> &Help {
        &self.help
    }

    /// Enables or disables the binding. Disabled bindings never match.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the binding is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled && !self.keys.is_empty()
    }

    /// Reports whether `msg` triggers this binding.
    pub fn matches(&self, msg: &KeyMsg) -> bool {
        self.enabled() && self.keys.iter().any(|k| k.matches(msg))
    }
}

/// Implemented by widget key maps so applications can render help.
pub trait KeyMap {
    /// Bindings shown in the compact, single-line help.
    fn short_help(&self) -> Vec<&Binding>;

    /// Bindings shown in the expanded help, grouped into columns.
    fn full_help(&self) -> Vec<Vec<&Binding>>;
}

/// Reports whether `msg` matches any of `bindings`.
pub fn matches(msg: &KeyMsg, bindings: &[&Binding]) -> bool {
    bindings.iter().any(|b| b.matches(msg))
}

/// Renders the short help of a key map as `key desc • key desc`.
pub fn short_help_view<K: KeyMap + ?Sized>(keymap: &K) -> String {
    keymap
        .short_help()
        .into_iter()
        .filter(|b| b.enabled())
        .map(|b| format!("{} {}", b.help().key, b.help().desc))
        .collect::<Vec<_>>()
        .join(" • ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyMsg {
        KeyMsg {
            key: code,
            modifiers,
        }
    }

    #[test]
    fn test_plain_binding_matches() {
        let b = Binding::new(vec![KeyCode::Enter, KeyCode::Char(' ')]);
        assert!(b.matches(&key(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(b.matches(&key(KeyCode::Char(' '), KeyModifiers::NONE)));
        assert!(!b.matches(&key(KeyCode::Esc, KeyModifiers::NONE)));
    }

    #[test]
    fn test_modifiers_must_match() {
        let b = Binding::new(vec![(KeyCode::Char('c'), KeyModifiers::CONTROL)]);
        assert!(b.matches(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!b.matches(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_shift_ignored_for_chars() {
        let b = Binding::new(vec![KeyCode::Char('S')]);
        assert!(b.matches(&key(KeyCode::Char('S'), KeyModifiers::SHIFT)));
    }

    #[test]
    fn test_disabled_binding_never_matches() {
        let mut b = Binding::new(vec![KeyCode::Enter]);
        b.set_enabled(false);
        assert!(!b.matches(&key(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn test_short_help_view() {
        struct Keys {
            a: Binding,
            b: Binding,
        }
        impl KeyMap for Keys {
            fn short_help(&self) -> Vec<&Binding> {
                vec![&self.a, &self.b]
            }
            fn full_help(&self) -> Vec<Vec<&Binding>> {
                vec![vec![&self.a, &self.b]]
            }
        }
        let keys = Keys {
            a: Binding::new(vec![KeyCode::Char('s')]).with_help("s", "start"),
            b: Binding::new(vec![KeyCode::Tab]).with_help("tab", "next"),
        };
        assert_eq!(short_help_view(&keys), "s start • tab next");
    }
}
