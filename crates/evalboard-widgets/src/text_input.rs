#![forbid(unsafe_code)]

//! Single-line text input.
//!
//! Grapheme-aware cursor, horizontal scrolling, optional mask for secrets.
//! A focused input is what puts the dispatch registry into editing mode.

use evalboard_core::event::{Event, KeyCode, KeyEvent};
use evalboard_core::geometry::Rect;
use evalboard_runtime::render::{Frame, Style};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::{Widget, theme};

/// A single-line text input widget.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    /// Cursor position in graphemes.
    cursor: usize,
    placeholder: String,
    mask_char: Option<char>,
    max_length: Option<usize>,
    style: Style,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Builder methods ---

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value);
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Render every grapheme as `mask` (API keys, passwords).
    pub fn with_mask(mut self, mask: char) -> Self {
        self.mask_char = Some(mask);
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    // --- State ---

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value and put the cursor at the end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.grapheme_count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    // --- Event handling ---

    /// Handle a terminal event.
    ///
    /// Returns `true` if the value or cursor changed.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.is_activation() => self.handle_key(key),
            Event::Paste(text) => {
                let line = text.lines().next().unwrap_or_default();
                let mut changed = false;
                for c in line.chars() {
                    changed |= self.insert_char(c);
                }
                changed
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let ctrl = key.ctrl();
        match key.code {
            KeyCode::Char('u') if ctrl => {
                let changed = !self.value.is_empty();
                self.clear();
                changed
            }
            KeyCode::Char('w') if ctrl => self.delete_word_back(),
            KeyCode::Char(c) if !ctrl && !key.alt() => self.insert_char(c),
            KeyCode::Backspace => self.delete_char_back(),
            KeyCode::Delete => self.delete_char_forward(),
            KeyCode::Left if self.cursor > 0 => {
                self.cursor -= 1;
                true
            }
            KeyCode::Right if self.cursor < self.grapheme_count() => {
                self.cursor += 1;
                true
            }
            KeyCode::Home => {
                let moved = self.cursor != 0;
                self.cursor = 0;
                moved
            }
            KeyCode::End => {
                let end = self.grapheme_count();
                let moved = self.cursor != end;
                self.cursor = end;
                moved
            }
            _ => false,
        }
    }

    // --- Editing operations ---

    fn insert_char(&mut self, c: char) -> bool {
        if c.is_control() {
            return false;
        }
        if let Some(max) = self.max_length
            && self.grapheme_count() >= max
        {
            return false;
        }
        let byte_offset = self.grapheme_byte_offset(self.cursor);
        self.value.insert(byte_offset, c);
        // A combining mark joins the previous grapheme instead of adding one.
        self.cursor = self.value[..byte_offset + c.len_utf8()]
            .graphemes(true)
            .count();
        true
    }

    fn delete_char_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = self.grapheme_byte_offset(self.cursor - 1);
        let end = self.grapheme_byte_offset(self.cursor);
        self.value.drain(start..end);
        self.cursor -= 1;
        true
    }

    fn delete_char_forward(&mut self) -> bool {
        if self.cursor >= self.grapheme_count() {
            return false;
        }
        let start = self.grapheme_byte_offset(self.cursor);
        let end = self.grapheme_byte_offset(self.cursor + 1);
        self.value.drain(start..end);
        true
    }

    fn delete_word_back(&mut self) -> bool {
        let graphemes: Vec<&str> = self.value.graphemes(true).collect();
        let mut target = self.cursor;
        while target > 0 && graphemes[target - 1].trim().is_empty() {
            target -= 1;
        }
        while target > 0 && !graphemes[target - 1].trim().is_empty() {
            target -= 1;
        }
        if target == self.cursor {
            return false;
        }
        let start = self.grapheme_byte_offset(target);
        let end = self.grapheme_byte_offset(self.cursor);
        self.value.drain(start..end);
        self.cursor = target;
        true
    }

    // --- Helpers ---

    fn grapheme_count(&self) -> usize {
        self.value.graphemes(true).count()
    }

    fn grapheme_byte_offset(&self, index: usize) -> usize {
        self.value
            .grapheme_indices(true)
            .nth(index)
            .map_or(self.value.len(), |(offset, _)| offset)
    }

    fn display_graphemes(&self) -> Vec<String> {
        match self.mask_char {
            Some(mask) => (0..self.grapheme_count()).map(|_| mask.to_string()).collect(),
            None => self.value.graphemes(true).map(str::to_string).collect(),
        }
    }
}

impl Widget for TextInput {
    fn render(&self, area: Rect, frame: &mut Frame) {
        let Some(row) = area.row(0) else { return };
        frame.fill(row, self.style);

        if self.value.is_empty() {
            frame.print_in(row, &self.placeholder, theme::MUTED);
            if self.focused {
                frame.set_cursor(Some((row.x, row.y)));
            }
            return;
        }

        let graphemes = self.display_graphemes();
        let widths: Vec<usize> = graphemes.iter().map(|g| g.as_str().width()).collect();
        let cursor_col: usize = widths[..self.cursor.min(widths.len())].iter().sum();
        let visible = usize::from(row.width.saturating_sub(1)).max(1);
        // Scroll just enough to keep the cursor on screen.
        let scroll = cursor_col.saturating_sub(visible);

        let mut col = 0usize;
        let mut x = row.x;
        for (g, w) in graphemes.iter().zip(&widths) {
            if col < scroll {
                col += w;
                continue;
            }
            x = frame.print(x, row.y, g, self.style, row.right());
            col += w;
        }

        if self.focused {
            let cursor_x = row.x + (cursor_col - scroll) as u16;
            frame.set_cursor(Some((cursor_x.min(row.right().saturating_sub(1)), row.y)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::event::Modifiers;

    fn type_str(input: &mut TextInput, text: &str) {
        for c in text.chars() {
            input.handle_event(&Event::Key(KeyEvent::char(c)));
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::char(c).with_modifiers(Modifiers::CTRL))
    }

    #[test]
    fn typing_and_cursor_movement() {
        let mut input = TextInput::new();
        type_str(&mut input, "helo");
        input.handle_event(&key(KeyCode::Left));
        type_str(&mut input, "l");
        assert_eq!(input.value(), "hello");
        assert_eq!(input.cursor(), 4);
        input.handle_event(&key(KeyCode::End));
        assert_eq!(input.cursor(), 5);
        input.handle_event(&key(KeyCode::Home));
        input.handle_event(&key(KeyCode::Delete));
        assert_eq!(input.value(), "ello");
    }

    #[test]
    fn backspace_at_start_is_noop() {
        let mut input = TextInput::new().with_value("ab");
        input.handle_event(&key(KeyCode::Home));
        assert!(!input.handle_event(&key(KeyCode::Backspace)));
        assert_eq!(input.value(), "ab");
    }

    #[test]
    fn ctrl_u_clears_and_ctrl_w_deletes_word() {
        let mut input = TextInput::new().with_value("acme corp inc");
        assert!(input.handle_event(&ctrl('w')));
        assert_eq!(input.value(), "acme corp ");
        assert!(input.handle_event(&ctrl('w')));
        assert_eq!(input.value(), "acme ");
        assert!(input.handle_event(&ctrl('u')));
        assert_eq!(input.value(), "");
    }

    #[test]
    fn ctrl_chars_are_not_inserted() {
        let mut input = TextInput::new();
        input.handle_event(&ctrl('k'));
        assert_eq!(input.value(), "");
    }

    #[test]
    fn max_length_is_enforced() {
        let mut input = TextInput::new().with_max_length(3);
        type_str(&mut input, "abcdef");
        assert_eq!(input.value(), "abc");
    }

    #[test]
    fn paste_takes_first_line() {
        let mut input = TextInput::new();
        input.handle_event(&Event::Paste("eb_live_123\nsecond".into()));
        assert_eq!(input.value(), "eb_live_123");
    }

    #[test]
    fn release_events_are_ignored() {
        use evalboard_core::event::KeyEventKind;
        let mut input = TextInput::new();
        input.handle_event(&Event::Key(KeyEvent::char('x').with_kind(KeyEventKind::Release)));
        assert_eq!(input.value(), "");
    }

    #[test]
    fn grapheme_aware_deletion() {
        let mut input = TextInput::new().with_value("cafe\u{301}");
        assert_eq!(input.cursor(), 4);
        input.handle_event(&key(KeyCode::Backspace));
        assert_eq!(input.value(), "caf");
    }

    #[test]
    fn mask_hides_value_when_rendered() {
        let input = TextInput::new().with_value("secret").with_mask('•');
        let mut frame = Frame::new(10, 1);
        input.render(frame.area(), &mut frame);
        assert_eq!(frame.buffer.row_text(0).trim_end(), "••••••");
    }

    #[test]
    fn placeholder_renders_when_empty() {
        let input = TextInput::new().with_placeholder("Search…").with_focused(true);
        let mut frame = Frame::new(12, 1);
        input.render(frame.area(), &mut frame);
        assert!(frame.buffer.contains_text("Search…"));
        assert_eq!(frame.cursor(), Some((0, 0)));
    }

    #[test]
    fn long_value_scrolls_to_keep_cursor_visible() {
        let input = TextInput::new().with_value("abcdefghij").with_focused(true);
        let mut frame = Frame::new(5, 1);
        input.render(frame.area(), &mut frame);
        assert!(frame.buffer.row_text(0).starts_with("ghij"));
        assert_eq!(frame.cursor(), Some((4, 0)));
    }
}
