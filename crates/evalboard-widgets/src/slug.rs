#![forbid(unsafe_code)]

//! URL-safe identifiers derived from display names.

use evalboard_core::event::Event;

use crate::text_input::TextInput;

/// Lowercase, whitespace runs become a single `-`, anything outside
/// `[a-z0-9-]` is dropped, and leading/trailing hyphens are trimmed.
///
/// `"Acme Corp"` → `"acme-corp"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = !slug.is_empty();
        } else if c.is_ascii_alphanumeric() {
            if pending_hyphen {
                slug.push('-');
                pending_hyphen = false;
            }
            slug.push(c);
        }
    }
    slug
}

/// Slug input paired with a name input.
///
/// Name edits rewrite the slug until the user edits the slug directly;
/// from then on the slug is theirs. Clearing the slug hands control back.
#[derive(Debug, Clone, Default)]
pub struct SlugField {
    input: TextInput,
    manually_edited: bool,
}

impl SlugField {
    pub fn new() -> Self {
        Self {
            input: TextInput::new().with_placeholder("derived from name"),
            manually_edited: false,
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.input.set_focused(focused);
    }

    pub fn is_manually_edited(&self) -> bool {
        self.manually_edited
    }

    /// Call after every change to the paired name field.
    pub fn name_changed(&mut self, name: &str) {
        if !self.manually_edited {
            self.input.set_value(slugify(name));
        }
    }

    /// Direct edit of the slug itself.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        let before = self.input.value().to_string();
        let changed = self.input.handle_event(event);
        if changed && self.input.value() != before {
            self.manually_edited = !self.input.value().is_empty();
        }
        changed
    }

    pub fn reset(&mut self) {
        self.input.clear();
        self.manually_edited = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::event::{KeyCode, KeyEvent};

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("  Acme   Corp  "), "acme-corp");
        assert_eq!(slugify("R&D Lab #2"), "rd-lab-2");
        assert_eq!(slugify("already-slugged"), "already-slugged");
        assert_eq!(slugify("Ünïcode"), "ncode");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn follows_name_until_edited() {
        let mut slug = SlugField::new();
        slug.name_changed("Acme");
        slug.name_changed("Acme Corp");
        assert_eq!(slug.value(), "acme-corp");

        slug.handle_event(&Event::Key(KeyEvent::new(KeyCode::Backspace)));
        slug.handle_event(&Event::Key(KeyEvent::char('x')));
        assert!(slug.is_manually_edited());
        assert_eq!(slug.value(), "acme-corx");

        slug.name_changed("Acme Corporation");
        assert_eq!(slug.value(), "acme-corx");
    }

    #[test]
    fn clearing_slug_resumes_derivation() {
        let mut slug = SlugField::new();
        slug.name_changed("Acme");
        slug.handle_event(&Event::Key(KeyEvent::char('!')));
        slug.handle_event(&Event::Key(KeyEvent::char('z')));
        assert!(slug.is_manually_edited());
        for _ in 0..10 {
            slug.handle_event(&Event::Key(KeyEvent::new(KeyCode::Backspace)));
        }
        assert!(!slug.is_manually_edited());
        slug.name_changed("Beta");
        assert_eq!(slug.value(), "beta");
    }

    #[test]
    fn cursor_moves_do_not_mark_edited() {
        let mut slug = SlugField::new();
        slug.name_changed("Acme");
        slug.handle_event(&Event::Key(KeyEvent::new(KeyCode::Home)));
        assert!(!slug.is_manually_edited());
    }
}
