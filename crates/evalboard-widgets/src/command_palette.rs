#![forbid(unsafe_code)]

//! Command palette: a filterable list of destinations, opened by a shortcut.
//!
//! # Filtering
//!
//! An empty query shows the first [`DEFAULT_PAGE_LIMIT`] items of category
//! [`PaletteCategory::Page`]. Any other query keeps every item whose title or
//! description contains it, case-insensitively, in source order. The query
//! is not trimmed: whitespace is part of the substring. There is no fuzzy
//! matching or ranking.
//!
//! # Invariants
//!
//! 1. The selection is `0` when there are no results, otherwise `< results.len()`.
//! 2. Every query change resets the selection to `0`.
//! 3. Enter with no results does nothing.
//! 4. Closing discards query and selection.

use evalboard_core::event::{Event, KeyCode};
use evalboard_core::geometry::{Rect, Sides, Size};
use evalboard_runtime::render::{Frame, truncate_to_width};
use tracing::debug;

use crate::text_input::TextInput;
use crate::{Widget, render_hints, theme};

/// Number of pages listed while the query is empty.
pub const DEFAULT_PAGE_LIMIT: usize = 8;

/// Rows moved by PageUp / PageDown.
const PAGE_STEP: usize = 5;

/// Most result rows drawn at once.
const MAX_VISIBLE: usize = 10;

/// Kind of palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteCategory {
    Page,
    Recent,
    Action,
}

impl PaletteCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Recent => "recent",
            Self::Action => "action",
        }
    }
}

/// One entry in the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: PaletteCategory,
    /// Route path navigated to on activation.
    pub path: String,
}

impl PaletteItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: PaletteCategory,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            category,
            path: path.into(),
        }
    }

    pub fn page(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(id, title, description, PaletteCategory::Page, path)
    }

    fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
    }
}

/// Indices into `items` of the entries shown for `query`.
pub fn filter_items(items: &[PaletteItem], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.category == PaletteCategory::Page)
            .map(|(i, _)| i)
            .take(DEFAULT_PAGE_LIMIT)
            .collect();
    }
    let needle = query.to_lowercase();
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.matches(&needle))
        .map(|(i, _)| i)
        .collect()
}

/// What the owner should do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteAction {
    /// An item was activated; the palette has closed.
    Navigate(String),
    /// Escape; the palette has closed.
    Dismiss,
}

/// Command palette state.
#[derive(Debug, Clone, Default)]
pub struct CommandPalette {
    items: Vec<PaletteItem>,
    input: TextInput,
    results: Vec<usize>,
    selected: usize,
    open: bool,
}

impl CommandPalette {
    pub fn new(items: Vec<PaletteItem>) -> Self {
        let mut palette = Self {
            items,
            input: TextInput::new().with_placeholder("Type to search pages…"),
            ..Self::default()
        };
        palette.refilter();
        palette
    }

    /// Replace the item list (e.g. when recents change), keeping the query.
    pub fn set_items(&mut self, items: Vec<PaletteItem>) {
        self.items = items;
        self.refilter();
    }

    pub fn items(&self) -> &[PaletteItem] {
        &self.items
    }

    /// Show the palette with an empty query and the first entry selected.
    pub fn open(&mut self) {
        self.input.clear();
        self.input.set_focused(true);
        self.open = true;
        self.refilter();
        debug!(target: "evalboard.palette", results = self.results.len(), "opened");
    }

    pub fn close(&mut self) {
        self.open = false;
        self.input.clear();
        self.input.set_focused(false);
        self.refilter();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The palette owns a focused text input whenever it is open.
    pub fn is_editing(&self) -> bool {
        self.open
    }

    pub fn query(&self) -> &str {
        self.input.value()
    }

    /// Replace the query as if typed.
    pub fn set_query(&mut self, query: &str) {
        self.input.set_value(query);
        self.refilter();
    }

    pub fn results(&self) -> impl Iterator<Item = &PaletteItem> {
        self.results.iter().map(|&i| &self.items[i])
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&PaletteItem> {
        self.results.get(self.selected).map(|&i| &self.items[i])
    }

    // --- Event handling ---

    /// Handle an event while open. Closed palettes ignore everything.
    pub fn handle_event(&mut self, event: &Event) -> Option<PaletteAction> {
        if !self.open {
            return None;
        }
        if let Event::Key(key) = event {
            if !key.is_activation() {
                return None;
            }
            match key.code {
                KeyCode::Escape => {
                    self.close();
                    return Some(PaletteAction::Dismiss);
                }
                KeyCode::Enter => return self.activate(),
                KeyCode::Up => {
                    self.select_prev();
                    return None;
                }
                KeyCode::Down | KeyCode::Tab => {
                    self.select_next();
                    return None;
                }
                KeyCode::BackTab => {
                    self.select_prev();
                    return None;
                }
                KeyCode::PageUp => {
                    self.selected = self.selected.saturating_sub(PAGE_STEP);
                    return None;
                }
                KeyCode::PageDown => {
                    self.selected = (self.selected + PAGE_STEP).min(self.last_index());
                    return None;
                }
                KeyCode::Home => {
                    self.selected = 0;
                    return None;
                }
                KeyCode::End => {
                    self.selected = self.last_index();
                    return None;
                }
                _ => {}
            }
        }

        let before = self.input.value().to_string();
        if self.input.handle_event(event) && self.input.value() != before {
            self.refilter();
        }
        None
    }

    fn activate(&mut self) -> Option<PaletteAction> {
        let path = self.selected_item()?.path.clone();
        debug!(target: "evalboard.palette", %path, "activated");
        self.close();
        Some(PaletteAction::Navigate(path))
    }

    fn select_next(&mut self) {
        if !self.results.is_empty() {
            self.selected = (self.selected + 1) % self.results.len();
        }
    }

    fn select_prev(&mut self) {
        if !self.results.is_empty() {
            self.selected = (self.selected + self.results.len() - 1) % self.results.len();
        }
    }

    fn last_index(&self) -> usize {
        self.results.len().saturating_sub(1)
    }

    fn refilter(&mut self) {
        self.results = filter_items(&self.items, self.input.value());
        self.selected = 0;
    }
}

impl Widget for CommandPalette {
    fn render(&self, area: Rect, frame: &mut Frame) {
        if !self.open || area.is_empty() {
            return;
        }
        let visible = self.results.len().clamp(1, MAX_VISIBLE) as u16;
        let width = area.width.saturating_sub(4).min(64);
        let modal = area.centered(Size::new(width, visible + 6));
        frame.fill(modal, theme::BASE);
        frame.draw_box(modal, theme::FOCUS_BORDER, Some("Go to"));

        let inner = modal.inner(Sides::new(1, 2, 1, 2));
        let (input_row, rest) = inner.split_top(1);
        let x = frame.print_in(input_row, "› ", theme::ACCENT);
        let input_area = Rect::new(x, input_row.y, input_row.right().saturating_sub(x), 1);
        self.input.render(input_area, frame);

        let (list, hints) = rest.inner(Sides::new(1, 0, 0, 0)).split_bottom(1);
        if self.results.is_empty() {
            frame.print_in(list, "No matching pages", theme::MUTED);
        } else {
            // Keep the selection within the visible window.
            let window = usize::from(list.height).max(1);
            let first = self.selected.saturating_sub(window - 1);
            for (row_idx, (pos, &item_idx)) in
                self.results.iter().enumerate().skip(first).take(window).enumerate()
            {
                let Some(row) = list.row(row_idx as u16) else { break };
                let item = &self.items[item_idx];
                let style = if pos == self.selected {
                    theme::SELECTED
                } else {
                    theme::BASE
                };
                frame.fill(row, style);
                let tag = format!("{:<7}", item.category.label());
                let x = frame.print(row.x, row.y, &tag, style.patch(theme::MUTED), row.right());
                let x = frame.print(x, row.y, &item.title, style.bold(), row.right());
                let remaining = usize::from(row.right().saturating_sub(x + 2));
                if remaining > 0 && !item.description.is_empty() {
                    let desc = truncate_to_width(&item.description, remaining);
                    frame.print(x + 2, row.y, &desc, style.patch(theme::MUTED), row.right());
                }
            }
        }
        render_hints(
            frame,
            hints,
            &[("↑↓", "select"), ("Enter", "open"), ("Esc", "close")],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::event::{KeyEvent, Modifiers};
    use proptest::prelude::*;

    fn items() -> Vec<PaletteItem> {
        let mut items: Vec<PaletteItem> = (0..10)
            .map(|i| PaletteItem::page(format!("p{i}"), format!("Page {i}"), "", format!("/p{i}")))
            .collect();
        items.push(PaletteItem::new(
            "eval-rag",
            "RAG Pipeline Alpha",
            "Retrieval evaluation",
            PaletteCategory::Recent,
            "/evaluations",
        ));
        items.push(PaletteItem::page("settings", "Settings", "Preferences", "/settings"));
        items
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    fn type_str(palette: &mut CommandPalette, text: &str) {
        for c in text.chars() {
            palette.handle_event(&Event::Key(KeyEvent::char(c)));
        }
    }

    #[test]
    fn empty_query_lists_first_eight_pages() {
        let items = items();
        let shown = filter_items(&items, "");
        assert_eq!(shown.len(), DEFAULT_PAGE_LIMIT);
        assert!(shown.iter().all(|&i| items[i].category == PaletteCategory::Page));
        assert_eq!(shown, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let items = items();
        let shown: Vec<&str> = filter_items(&items, "rag")
            .into_iter()
            .map(|i| items[i].title.as_str())
            .collect();
        assert!(shown.contains(&"RAG Pipeline Alpha"));
        assert!(!shown.contains(&"Settings"));
    }

    #[test]
    fn whitespace_is_part_of_the_query() {
        let items = items();
        // A lone space is a real search, not the default page list.
        let shown = filter_items(&items, " ");
        assert_eq!(shown.len(), 11);
        assert!(!shown.iter().any(|&i| items[i].id == "settings"));

        assert_eq!(filter_items(&items, "alpha").len(), 1);
        assert!(filter_items(&items, "alpha ").is_empty());
    }

    #[test]
    fn description_is_searched() {
        let items = items();
        let shown = filter_items(&items, "PREFER");
        assert_eq!(shown.len(), 1);
        assert_eq!(items[shown[0]].id, "settings");
    }

    #[test]
    fn open_resets_query_and_selection() {
        let mut palette = CommandPalette::new(items());
        palette.open();
        type_str(&mut palette, "page");
        palette.handle_event(&key(KeyCode::Down));
        assert_eq!(palette.selected_index(), 1);
        palette.close();
        palette.open();
        assert_eq!(palette.query(), "");
        assert_eq!(palette.selected_index(), 0);
    }

    #[test]
    fn selection_wraps_both_directions() {
        let mut palette = CommandPalette::new(items());
        palette.open();
        palette.handle_event(&key(KeyCode::Up));
        assert_eq!(palette.selected_index(), DEFAULT_PAGE_LIMIT - 1);
        palette.handle_event(&key(KeyCode::Down));
        assert_eq!(palette.selected_index(), 0);
    }

    #[test]
    fn enter_navigates_and_closes() {
        let mut palette = CommandPalette::new(items());
        palette.open();
        type_str(&mut palette, "rag");
        let action = palette.handle_event(&key(KeyCode::Enter));
        assert_eq!(action, Some(PaletteAction::Navigate("/evaluations".into())));
        assert!(!palette.is_open());
    }

    #[test]
    fn enter_with_no_results_does_nothing() {
        let mut palette = CommandPalette::new(items());
        palette.open();
        type_str(&mut palette, "zzz");
        assert_eq!(palette.result_count(), 0);
        assert_eq!(palette.handle_event(&key(KeyCode::Enter)), None);
        assert!(palette.is_open());
        palette.handle_event(&key(KeyCode::Down));
        assert_eq!(palette.selected_index(), 0);
    }

    #[test]
    fn escape_dismisses() {
        let mut palette = CommandPalette::new(items());
        palette.open();
        type_str(&mut palette, "set");
        assert_eq!(
            palette.handle_event(&key(KeyCode::Escape)),
            Some(PaletteAction::Dismiss)
        );
        assert!(!palette.is_open());
        assert_eq!(palette.query(), "");
    }

    #[test]
    fn backspace_and_ctrl_u_refilter() {
        let mut palette = CommandPalette::new(items());
        palette.open();
        type_str(&mut palette, "ragx");
        assert_eq!(palette.result_count(), 0);
        palette.handle_event(&key(KeyCode::Backspace));
        assert_eq!(palette.result_count(), 1);
        palette.handle_event(&Event::Key(KeyEvent::char('u').with_modifiers(Modifiers::CTRL)));
        assert_eq!(palette.query(), "");
        assert_eq!(palette.result_count(), DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn page_and_home_end_keys_clamp() {
        let mut palette = CommandPalette::new(items());
        palette.open();
        palette.handle_event(&key(KeyCode::PageDown));
        assert_eq!(palette.selected_index(), 5);
        palette.handle_event(&key(KeyCode::PageDown));
        assert_eq!(palette.selected_index(), 7);
        palette.handle_event(&key(KeyCode::Home));
        assert_eq!(palette.selected_index(), 0);
        palette.handle_event(&key(KeyCode::End));
        assert_eq!(palette.selected_index(), 7);
        palette.handle_event(&key(KeyCode::PageUp));
        assert_eq!(palette.selected_index(), 2);
    }

    #[test]
    fn closed_palette_ignores_events() {
        let mut palette = CommandPalette::new(items());
        assert_eq!(palette.handle_event(&key(KeyCode::Enter)), None);
        type_str(&mut palette, "abc");
        assert_eq!(palette.query(), "");
    }

    #[test]
    fn renders_results_and_empty_state() {
        let mut palette = CommandPalette::new(items());
        palette.open();
        let mut frame = Frame::new(80, 24);
        palette.render(frame.area(), &mut frame);
        assert!(frame.buffer.contains_text("Page 0"));
        assert!(frame.buffer.contains_text("Go to"));

        palette.set_query("nothing-here");
        let mut frame = Frame::new(80, 24);
        palette.render(frame.area(), &mut frame);
        assert!(frame.buffer.contains_text("No matching pages"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Type(char),
        Backspace,
        Up,
        Down,
        PageUp,
        PageDown,
        End,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            prop::sample::select(vec!['p', 'a', 'g', 'e', 'r', 'z', ' ', '1']).prop_map(Op::Type),
            Just(Op::Backspace),
            Just(Op::Up),
            Just(Op::Down),
            Just(Op::PageUp),
            Just(Op::PageDown),
            Just(Op::End),
        ]
    }

    proptest! {
        #[test]
        fn selection_stays_in_bounds(ops in prop::collection::vec(op(), 0..60)) {
            let mut palette = CommandPalette::new(items());
            palette.open();
            for op in ops {
                let event = match op {
                    Op::Type(c) => Event::Key(KeyEvent::char(c)),
                    Op::Backspace => key(KeyCode::Backspace),
                    Op::Up => key(KeyCode::Up),
                    Op::Down => key(KeyCode::Down),
                    Op::PageUp => key(KeyCode::PageUp),
                    Op::PageDown => key(KeyCode::PageDown),
                    Op::End => key(KeyCode::End),
                };
                palette.handle_event(&event);
                let len = palette.result_count();
                if len == 0 {
                    prop_assert_eq!(palette.selected_index(), 0);
                    prop_assert!(palette.selected_item().is_none());
                } else {
                    prop_assert!(palette.selected_index() < len);
                }
            }
        }
    }
}
