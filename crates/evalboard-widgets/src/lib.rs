#![forbid(unsafe_code)]

//! Interactive widgets for the evalboard console.
//!
//! Each widget owns its state and exposes `handle_event`, returning what the
//! owner should do next, plus a `render` into a [`Frame`]. None of them touch
//! storage or the network; the app turns their outcomes into commands.

pub mod command_palette;
pub mod help_overlay;
pub mod onboarding;
pub mod slug;
pub mod text_input;
pub mod tour;

pub use command_palette::{CommandPalette, PaletteAction, PaletteCategory, PaletteItem};
pub use help_overlay::HelpOverlay;
pub use slug::{SlugField, slugify};
pub use text_input::TextInput;
pub use tour::{DEFAULT_TOUR_STEPS, Placement, ProductTour, TourEvent, TourStep, tooltip_rect};

use evalboard_core::geometry::Rect;
use evalboard_runtime::render::Frame;

/// A renderable component.
pub trait Widget {
    /// Draw into `frame` within `area`.
    fn render(&self, area: Rect, frame: &mut Frame);
}

/// Shared palette of styles so every widget reads the same.
pub mod theme {
    use evalboard_runtime::render::{Color, Style};

    pub const BASE: Style = Style::new();
    pub const MUTED: Style = Style::new().fg(Color::DarkGrey);
    pub const ACCENT: Style = Style::new().fg(Color::Cyan).bold();
    pub const BORDER: Style = Style::new().fg(Color::Grey);
    pub const FOCUS_BORDER: Style = Style::new().fg(Color::Cyan);
    pub const SELECTED: Style = Style::new().reverse();
    pub const ERROR: Style = Style::new().fg(Color::Red);
    pub const SUCCESS: Style = Style::new().fg(Color::Green);
    pub const DIMMED: Style = Style::new().dim();
    pub const DISABLED: Style = Style::new().fg(Color::DarkGrey).dim();
}

/// Draw a one-line hint row such as `Enter continue · Esc back`.
pub(crate) fn render_hints(frame: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let Some(row) = area.row(0) else { return };
    let mut x = row.x;
    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            x = frame.print(x, row.y, " · ", theme::MUTED, row.right());
        }
        x = frame.print(x, row.y, key, theme::ACCENT, row.right());
        x = frame.print(x, row.y, " ", theme::MUTED, row.right());
        x = frame.print(x, row.y, label, theme::MUTED, row.right());
    }
}

/// Draw a list of options with a cursor marker on `selected`.
pub(crate) fn render_choices<S: AsRef<str>>(
    frame: &mut Frame,
    area: Rect,
    options: &[S],
    selected: usize,
) {
    for (i, option) in options.iter().enumerate() {
        let Some(row) = area.row(i as u16) else { break };
        let (marker, style) = if i == selected {
            ("▸ ", theme::SELECTED)
        } else {
            ("  ", theme::BASE)
        };
        let x = frame.print(row.x, row.y, marker, theme::ACCENT, row.right());
        frame.print(x, row.y, option.as_ref(), style, row.right());
    }
}
