#![forbid(unsafe_code)]

//! Canonical input events.
//!
//! Everything above the terminal layer speaks these types instead of raw
//! crossterm events, so models and tests can build input by hand.
//!
//! - `KeyEventKind` defaults to `Press` when the terminal cannot report kinds
//! - `Modifiers` are bitflags and combine with `|`
//! - Mouse input is not captured by the console and has no variant here

use bitflags::bitflags;
use crossterm::event as cte;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// Terminal was resized.
    Resize {
        /// New terminal width in columns.
        width: u16,
        /// New terminal height in rows.
        height: u16,
    },

    /// Text delivered through bracketed paste.
    Paste(String),

    /// Focus gained (`true`) or lost (`false`).
    Focus(bool),

    /// A tick from the runtime or a subscription.
    Tick,
}

impl Event {
    /// Convert a crossterm event. Returns `None` for input the console ignores.
    #[must_use]
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        match event {
            cte::Event::Key(key) => map_key_event(key).map(Event::Key),
            cte::Event::Resize(width, height) => Some(Event::Resize { width, height }),
            cte::Event::Paste(text) => Some(Event::Paste(text)),
            cte::Event::FocusGained => Some(Event::Focus(true)),
            cte::Event::FocusLost => Some(Event::Focus(false)),
            cte::Event::Mouse(_) => None,
        }
    }

    /// The key event, if this is one.
    #[must_use]
    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            Event::Key(key) => Some(key),
            _ => None,
        }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Press, repeat or release.
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a press event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Shorthand for a plain character press.
    #[must_use]
    pub const fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Press and repeat count as activations; release does not.
    #[must_use]
    pub const fn is_activation(&self) -> bool {
        !matches!(self.kind, KeyEventKind::Release)
    }

    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    /// Shift+Tab.
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// Function key `F(n)`.
    F(u8),
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held.
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        /// Super/Meta/Command.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

// ---------------------------------------------------------------------------
// crossterm mapping
// ---------------------------------------------------------------------------

fn map_key_event(event: cte::KeyEvent) -> Option<KeyEvent> {
    let code = map_key_code(event.code)?;
    Some(KeyEvent {
        code,
        modifiers: map_modifiers(event.modifiers),
        kind: match event.kind {
            cte::KeyEventKind::Press => KeyEventKind::Press,
            cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
            cte::KeyEventKind::Release => KeyEventKind::Release,
        },
    })
}

fn map_key_code(code: cte::KeyCode) -> Option<KeyCode> {
    let mapped = match code {
        cte::KeyCode::Char(c) => KeyCode::Char(c),
        cte::KeyCode::Enter => KeyCode::Enter,
        cte::KeyCode::Esc => KeyCode::Escape,
        cte::KeyCode::Backspace => KeyCode::Backspace,
        cte::KeyCode::Delete => KeyCode::Delete,
        cte::KeyCode::Tab => KeyCode::Tab,
        cte::KeyCode::BackTab => KeyCode::BackTab,
        cte::KeyCode::Up => KeyCode::Up,
        cte::KeyCode::Down => KeyCode::Down,
        cte::KeyCode::Left => KeyCode::Left,
        cte::KeyCode::Right => KeyCode::Right,
        cte::KeyCode::Home => KeyCode::Home,
        cte::KeyCode::End => KeyCode::End,
        cte::KeyCode::PageUp => KeyCode::PageUp,
        cte::KeyCode::PageDown => KeyCode::PageDown,
        cte::KeyCode::F(n) => KeyCode::F(n),
        _ => return None,
    };
    Some(mapped)
}

fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.intersects(
        cte::KeyModifiers::SUPER | cte::KeyModifiers::HYPER | cte::KeyModifiers::META,
    ) {
        mapped |= Modifiers::SUPER;
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ct_key(code: cte::KeyCode, modifiers: cte::KeyModifiers) -> cte::Event {
        cte::Event::Key(cte::KeyEvent::new(code, modifiers))
    }

    #[test]
    fn maps_plain_char_press() {
        let event = Event::from_crossterm(ct_key(cte::KeyCode::Char('k'), cte::KeyModifiers::NONE));
        assert_eq!(event, Some(Event::Key(KeyEvent::char('k'))));
    }

    #[test]
    fn maps_modifiers() {
        let event = Event::from_crossterm(ct_key(
            cte::KeyCode::Char('?'),
            cte::KeyModifiers::SHIFT | cte::KeyModifiers::CONTROL,
        ))
        .expect("mapped");
        let key = event.as_key().expect("key");
        assert!(key.shift());
        assert!(key.ctrl());
        assert!(!key.alt());
    }

    #[test]
    fn esc_becomes_escape() {
        let event = Event::from_crossterm(ct_key(cte::KeyCode::Esc, cte::KeyModifiers::NONE));
        assert_eq!(event, Some(Event::Key(KeyEvent::new(KeyCode::Escape))));
    }

    #[test]
    fn release_kind_is_preserved() {
        let raw = cte::KeyEvent::new_with_kind(
            cte::KeyCode::Char('n'),
            cte::KeyModifiers::NONE,
            cte::KeyEventKind::Release,
        );
        let event = Event::from_crossterm(cte::Event::Key(raw)).expect("mapped");
        let key = event.as_key().expect("key");
        assert_eq!(key.kind, KeyEventKind::Release);
        assert!(!key.is_activation());
    }

    #[test]
    fn unsupported_keys_are_dropped() {
        let event = Event::from_crossterm(ct_key(cte::KeyCode::CapsLock, cte::KeyModifiers::NONE));
        assert_eq!(event, None);
    }

    #[test]
    fn resize_and_focus_map_through() {
        assert_eq!(
            Event::from_crossterm(cte::Event::Resize(120, 40)),
            Some(Event::Resize {
                width: 120,
                height: 40
            })
        );
        assert_eq!(
            Event::from_crossterm(cte::Event::FocusLost),
            Some(Event::Focus(false))
        );
    }

    #[test]
    fn key_event_builders() {
        let key = KeyEvent::char('x')
            .with_modifiers(Modifiers::ALT)
            .with_kind(KeyEventKind::Repeat);
        assert!(key.is_char('x'));
        assert!(key.alt());
        assert!(key.is_activation());
    }
}
