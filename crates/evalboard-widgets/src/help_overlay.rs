#![forbid(unsafe_code)]

//! Shortcut help, built from whatever bindings are live when it opens.

use std::collections::HashSet;

use evalboard_core::event::{Event, KeyCode};
use evalboard_core::geometry::{Rect, Sides, Size};
use evalboard_runtime::keymap::ShortcutEntry;
use evalboard_runtime::render::Frame;

use crate::{Widget, render_hints, theme};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    scope: String,
    chord: String,
    description: String,
    /// An earlier scope already owns this chord.
    shadowed: bool,
}

/// Modal list of the active shortcuts.
#[derive(Debug, Clone, Default)]
pub struct HelpOverlay {
    rows: Vec<Row>,
}

impl HelpOverlay {
    /// Snapshot `entries` (precedence order, as returned by the registry).
    pub fn new(entries: Vec<ShortcutEntry>) -> Self {
        let mut seen = HashSet::new();
        let rows = entries
            .into_iter()
            .map(|entry| {
                let shadowed = !seen.insert(entry.chord.to_lowercase());
                Row {
                    scope: entry.scope,
                    chord: entry.chord,
                    description: entry.description,
                    shadowed,
                }
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Chords listed but unreachable because an earlier scope wins.
    pub fn shadowed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rows
            .iter()
            .filter(|r| r.shadowed)
            .map(|r| (r.scope.as_str(), r.chord.as_str()))
    }

    /// Returns `true` when the overlay should close.
    pub fn handle_event(&self, event: &Event) -> bool {
        let Event::Key(key) = event else { return false };
        key.is_activation()
            && matches!(
                key.code,
                KeyCode::Escape | KeyCode::Enter | KeyCode::Char('?') | KeyCode::Char('q')
            )
    }
}

impl Widget for HelpOverlay {
    fn render(&self, area: Rect, frame: &mut Frame) {
        let height = (self.rows.len() as u16).saturating_add(self.scope_breaks() + 5);
        let modal = area.centered(Size::new(area.width.saturating_sub(4).min(60), height));
        frame.fill(modal, theme::BASE);
        frame.draw_box(modal, theme::FOCUS_BORDER, Some("Keyboard shortcuts"));

        let inner = modal.inner(Sides::new(1, 2, 1, 2));
        let (list, hints) = inner.split_bottom(1);
        let mut y = list.y;
        let mut last_scope: Option<&str> = None;
        for row in &self.rows {
            if y >= list.bottom() {
                break;
            }
            if last_scope != Some(row.scope.as_str()) {
                if last_scope.is_some() {
                    y += 1;
                }
                if y >= list.bottom() {
                    break;
                }
                frame.print(list.x, y, &row.scope, theme::MUTED.bold(), list.right());
                y += 1;
                last_scope = Some(&row.scope);
                if y >= list.bottom() {
                    break;
                }
            }
            let style = if row.shadowed {
                theme::DISABLED
            } else {
                theme::BASE
            };
            frame.print(list.x + 2, y, &row.chord, theme::ACCENT, list.right());
            let x = frame.print(list.x + 14, y, &row.description, style, list.right());
            if row.shadowed {
                frame.print(x + 1, y, "(shadowed)", theme::DISABLED, list.right());
            }
            y += 1;
        }
        render_hints(frame, hints, &[("Esc", "close")]);
    }
}

impl HelpOverlay {
    /// Extra rows for scope headings and the gaps between them.
    fn scope_breaks(&self) -> u16 {
        let mut scopes = 0u16;
        let mut last: Option<&str> = None;
        for row in &self.rows {
            if last != Some(row.scope.as_str()) {
                scopes += 1;
                last = Some(&row.scope);
            }
        }
        (scopes * 2).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::event::KeyEvent;

    fn entry(scope: &str, chord: &str, description: &str) -> ShortcutEntry {
        ShortcutEntry {
            scope: scope.into(),
            chord: chord.into(),
            description: description.into(),
        }
    }

    fn overlay() -> HelpOverlay {
        HelpOverlay::new(vec![
            entry("Global", "k", "Open command palette"),
            entry("Global", "Shift+?", "Show shortcuts"),
            entry("Evaluations", "/", "Filter evaluations"),
            entry("Evaluations", "K", "Open quick search"),
        ])
    }

    #[test]
    fn later_duplicate_chord_is_shadowed() {
        let help = overlay();
        assert_eq!(help.len(), 4);
        assert_eq!(help.shadowed().collect::<Vec<_>>(), vec![("Evaluations", "K")]);
    }

    #[test]
    fn renders_scopes_and_shadow_marker() {
        let help = overlay();
        let mut frame = Frame::new(80, 24);
        help.render(frame.area(), &mut frame);
        assert!(frame.buffer.contains_text("Keyboard shortcuts"));
        assert!(frame.buffer.contains_text("Global"));
        assert!(frame.buffer.contains_text("Open command palette"));
        assert!(frame.buffer.contains_text("(shadowed)"));
    }

    #[test]
    fn closes_on_escape_or_question_mark() {
        let help = overlay();
        assert!(help.handle_event(&Event::Key(KeyEvent::new(KeyCode::Escape))));
        assert!(help.handle_event(&Event::Key(KeyEvent::char('?'))));
        assert!(!help.handle_event(&Event::Key(KeyEvent::char('x'))));
    }
}
