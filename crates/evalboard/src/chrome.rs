#![forbid(unsafe_code)]

//! Shared UI chrome: header, sidebar and status bar.
//!
//! Every element the product tour can point at registers an anchor on the
//! frame while it is drawn, so the overlay can find it in the same frame.

use evalboard_client::User;
use evalboard_core::geometry::{Rect, Sides};
use evalboard_runtime::render::{Frame, truncate_to_width};
use evalboard_widgets::theme;

use crate::routes::Route;

// ---------------------------------------------------------------------------
// Anchors
// ---------------------------------------------------------------------------

pub const SEARCH_ANCHOR: &str = "header:search";
pub const SHORTCUTS_ANCHOR: &str = "status:shortcuts";

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

pub const SIDEBAR_WIDTH: u16 = 22;
const HEADER_HEIGHT: u16 = 1;
const STATUS_HEIGHT: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeLayout {
    pub header: Rect,
    pub sidebar: Rect,
    pub content: Rect,
    pub status: Rect,
}

pub fn layout(area: Rect) -> ChromeLayout {
    let (header, rest) = area.split_top(HEADER_HEIGHT);
    let (middle, status) = rest.split_bottom(STATUS_HEIGHT);
    let (sidebar, content) = middle.split_left(SIDEBAR_WIDTH.min(middle.width / 3));
    ChromeLayout {
        header,
        sidebar,
        content,
        status,
    }
}

/// Nav rows that fit in a sidebar of `height` rows (inside its border).
pub fn sidebar_capacity(height: u16) -> usize {
    usize::from(height.saturating_sub(2))
}

/// Smallest change to `scroll` that puts `index` inside the visible window.
pub fn scroll_to_reveal(scroll: usize, index: usize, capacity: usize) -> usize {
    if capacity == 0 {
        return index;
    }
    if index < scroll {
        index
    } else if index >= scroll + capacity {
        index + 1 - capacity
    } else {
        scroll
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

pub fn render_header(frame: &mut Frame, area: Rect, route: Route, user: Option<&User>) {
    let Some(row) = area.row(0) else { return };
    frame.fill(row, theme::SELECTED);
    let mut x = frame.print(row.x + 1, row.y, "evalboard", theme::SELECTED.bold(), row.right());
    x = frame.print(x, row.y, "  ", theme::SELECTED, row.right());
    frame.print(x, row.y, route.title(), theme::SELECTED, row.right());

    let who = user.map(User::display_name).unwrap_or("signed out");
    let who = truncate_to_width(who, 24);
    let search = " k  Search pages… ";
    let right_width = (who.chars().count() + search.chars().count() + 3) as u16;
    if right_width >= row.width {
        return;
    }
    let search_x = row.right() - right_width;
    let end = frame.print(search_x, row.y, search, theme::SELECTED.underline(), row.right());
    frame.register_anchor(
        SEARCH_ANCHOR,
        Rect::new(search_x, row.y, end.saturating_sub(search_x), 1),
    );
    frame.print(end.saturating_add(2), row.y, &who, theme::SELECTED, row.right());
}

// ---------------------------------------------------------------------------
// Sidebar
// ---------------------------------------------------------------------------

/// Nav list starting at entry `scroll`. Only visible entries get anchors.
pub fn render_sidebar(frame: &mut Frame, area: Rect, active: Route, scroll: usize) {
    if area.width < 4 || area.height < 3 {
        return;
    }
    frame.draw_box(area, theme::BORDER, Some("Navigate"));
    let inner = area.inner(Sides::new(1, 1, 1, 1));
    let capacity = sidebar_capacity(area.height);
    for (slot, route) in Route::NAV.iter().skip(scroll).take(capacity).enumerate() {
        let Some(row) = inner.row(slot as u16) else { break };
        let style = if *route == active {
            theme::SELECTED
        } else {
            theme::BASE
        };
        frame.fill(row, style);
        frame.print_in(row, &format!(" {}", route.title()), style);
        frame.register_anchor(route.nav_anchor(), row);
    }
    if scroll > 0 {
        frame.print(inner.right().saturating_sub(1), area.y, "▲", theme::MUTED, area.right());
    }
    if scroll + capacity < Route::NAV.len() {
        frame.print(
            inner.right().saturating_sub(1),
            area.bottom().saturating_sub(1),
            "▼",
            theme::MUTED,
            area.right(),
        );
    }
}

// ---------------------------------------------------------------------------
// Status bar
// ---------------------------------------------------------------------------

const STATUS_HINTS: &[(&str, &str)] = &[
    ("k", "search"),
    ("n", "evaluations"),
    ("r", "reload"),
    ("?", "shortcuts"),
    ("q", "quit"),
];

/// Shortcut hints on the left, then an optional flash message.
pub fn render_status_bar(frame: &mut Frame, area: Rect, flash: Option<&str>) {
    let Some(row) = area.row(0) else { return };
    frame.fill(row, theme::BASE);
    let start = row.x + 1;
    let mut x = start;
    for (i, (key, label)) in STATUS_HINTS.iter().enumerate() {
        if i > 0 {
            x = frame.print(x, row.y, " · ", theme::MUTED, row.right());
        }
        x = frame.print(x, row.y, key, theme::ACCENT, row.right());
        x = frame.print(x, row.y, " ", theme::MUTED, row.right());
        x = frame.print(x, row.y, label, theme::MUTED, row.right());
    }
    if x > start {
        frame.register_anchor(SHORTCUTS_ANCHOR, Rect::new(start, row.y, x - start, 1));
    }
    if let Some(flash) = flash {
        let text = format!("  {flash}");
        frame.print(x, row.y, &text, theme::SUCCESS, row.right());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn layout_partitions_area() {
        let parts = layout(Rect::from_size(100, 30));
        assert_eq!(parts.header, Rect::new(0, 0, 100, 1));
        assert_eq!(parts.status, Rect::new(0, 29, 100, 1));
        assert_eq!(parts.sidebar.width, SIDEBAR_WIDTH);
        assert_eq!(parts.content.x, SIDEBAR_WIDTH);
        assert_eq!(parts.content.height, 28);
    }

    #[test]
    fn sidebar_registers_visible_anchors_only() {
        let mut frame = Frame::new(30, 6);
        render_sidebar(&mut frame, Rect::new(0, 0, 22, 6), Route::Dashboard, 2);
        // Four rows fit; entries 2..6 are drawn.
        assert!(frame.anchor("nav:/").is_none());
        assert!(frame.anchor("nav:/runs").is_some());
        assert!(frame.anchor("nav:/metrics").is_some());
        assert!(frame.anchor("nav:/settings").is_none());
    }

    #[test]
    fn header_and_status_anchors() {
        let mut frame = Frame::new(100, 3);
        render_header(&mut frame, Rect::new(0, 0, 100, 1), Route::Dashboard, None);
        render_status_bar(&mut frame, Rect::new(0, 2, 100, 1), Some("Reloaded"));
        let search = frame.anchor(SEARCH_ANCHOR).expect("search anchor");
        assert_eq!(search.y, 0);
        let shortcuts = frame.anchor(SHORTCUTS_ANCHOR).expect("shortcuts anchor");
        assert_eq!(shortcuts.y, 2);
        assert!(frame.buffer.contains_text("Reloaded"));
    }

    #[test]
    fn reveal_examples() {
        assert_eq!(scroll_to_reveal(0, 5, 4), 2);
        assert_eq!(scroll_to_reveal(3, 1, 4), 1);
        assert_eq!(scroll_to_reveal(1, 2, 4), 1);
    }

    proptest! {
        #[test]
        fn revealed_index_is_visible(scroll in 0usize..10, index in 0usize..10, capacity in 1usize..8) {
            let next = scroll_to_reveal(scroll, index, capacity);
            prop_assert!(next <= index);
            prop_assert!(index < next + capacity);
        }
    }
}
