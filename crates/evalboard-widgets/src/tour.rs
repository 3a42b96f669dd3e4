#![forbid(unsafe_code)]

//! Product tour: a spotlight and tooltip walked over a fixed list of anchors.
//!
//! Steps name anchors (`nav:/evaluations`, `header:search`, ...) that the
//! chrome registers on the [`Frame`] while drawing. The overlay is drawn last,
//! so it looks the anchor up in the same frame and positions itself against
//! wherever the target landed this time, which covers resizes and scrolling
//! without extra bookkeeping. A target that was not drawn yields a centered
//! tooltip and no spotlight.
//!
//! # Invariants
//!
//! 1. `step_index() < step_count()` at all times.
//! 2. `prev` on the first step is a no-op.
//! 3. `next` on the last step completes instead of advancing.
//! 4. [`TourEvent::Completed`] is emitted at most once per tour.

use evalboard_core::event::{Event, KeyCode};
use evalboard_core::geometry::{Rect, Sides, Size};
use evalboard_runtime::render::{Frame, wrap_text};
use tracing::debug;

use crate::{Widget, render_hints, theme};

/// Cells between the target edge and the tooltip.
pub const TOOLTIP_GAP: u16 = 1;

const TOOLTIP_MAX_WIDTH: u16 = 44;

/// Side of the target the tooltip sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Top,
    Bottom,
    Left,
    Right,
}

/// One stop of the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TourStep {
    /// Anchor id registered by the chrome.
    pub target: &'static str,
    pub title: &'static str,
    pub content: &'static str,
    pub placement: Placement,
}

pub const DEFAULT_TOUR_STEPS: &[TourStep] = &[
    TourStep {
        target: "header:search",
        title: "Jump anywhere",
        content: "Press k to open the command palette and search every page by name.",
        placement: Placement::Bottom,
    },
    TourStep {
        target: "nav:/evaluations",
        title: "Evaluations",
        content: "Every evaluation run against your agents lives here. Press n to jump straight in.",
        placement: Placement::Right,
    },
    TourStep {
        target: "nav:/datasets",
        title: "Datasets",
        content: "Curate the test cases your agents are scored against.",
        placement: Placement::Right,
    },
    TourStep {
        target: "nav:/metrics",
        title: "Metrics",
        content: "Track accuracy, latency and cost trends across runs.",
        placement: Placement::Right,
    },
    TourStep {
        target: "status:shortcuts",
        title: "Keyboard first",
        content: "Press Shift+? at any time to see every shortcut available on the current screen.",
        placement: Placement::Top,
    },
];

/// Result of a tour transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourEvent {
    StepChanged {
        from: usize,
        to: usize,
        target: &'static str,
    },
    /// Finished or skipped. The owner records the completion flag and drops the overlay.
    Completed,
}

/// Step cursor over a static list of steps.
#[derive(Debug, Clone)]
pub struct ProductTour {
    steps: &'static [TourStep],
    index: usize,
    active: bool,
    completed: bool,
}

impl Default for ProductTour {
    fn default() -> Self {
        Self::new(DEFAULT_TOUR_STEPS)
    }
}

impl ProductTour {
    pub fn new(steps: &'static [TourStep]) -> Self {
        Self {
            steps,
            index: 0,
            active: false,
            completed: false,
        }
    }

    /// Begin at the first step. An empty tour completes immediately.
    pub fn start(&mut self) -> Option<TourEvent> {
        self.index = 0;
        self.completed = false;
        if self.steps.is_empty() {
            self.active = true;
            return self.complete();
        }
        self.active = true;
        debug!(target: "evalboard.tour", steps = self.steps.len(), "started");
        None
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn step_index(&self) -> usize {
        self.index
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn current_step(&self) -> Option<&'static TourStep> {
        if self.active {
            self.steps.get(self.index)
        } else {
            None
        }
    }

    pub fn next(&mut self) -> Option<TourEvent> {
        if !self.active {
            return None;
        }
        if self.index + 1 < self.steps.len() {
            Some(self.move_to(self.index + 1))
        } else {
            self.complete()
        }
    }

    pub fn prev(&mut self) -> Option<TourEvent> {
        if !self.active || self.index == 0 {
            return None;
        }
        Some(self.move_to(self.index - 1))
    }

    pub fn skip(&mut self) -> Option<TourEvent> {
        if !self.active {
            return None;
        }
        debug!(target: "evalboard.tour", step = self.index, "skipped");
        self.complete()
    }

    /// Right/Enter/`l` next, Left/`h` back, Esc/`s` skip.
    pub fn handle_event(&mut self, event: &Event) -> Option<TourEvent> {
        let Event::Key(key) = event else { return None };
        if !key.is_activation() || key.ctrl() || key.alt() {
            return None;
        }
        match key.code {
            KeyCode::Right | KeyCode::Enter | KeyCode::Char('l') => self.next(),
            KeyCode::Left | KeyCode::Char('h') => self.prev(),
            KeyCode::Escape | KeyCode::Char('s') => self.skip(),
            _ => None,
        }
    }

    fn move_to(&mut self, to: usize) -> TourEvent {
        let from = self.index;
        self.index = to;
        TourEvent::StepChanged {
            from,
            to,
            target: self.steps[to].target,
        }
    }

    fn complete(&mut self) -> Option<TourEvent> {
        self.active = false;
        if self.completed {
            return None;
        }
        self.completed = true;
        debug!(target: "evalboard.tour", "completed");
        Some(TourEvent::Completed)
    }
}

/// Where the tooltip goes for a target, clamped into `viewport`.
///
/// Top and bottom placements centre on the target's horizontal midpoint;
/// left and right centre on its vertical midpoint. Without a target the
/// tooltip is centered in the viewport.
pub fn tooltip_rect(target: Option<Rect>, placement: Placement, viewport: Rect, size: Size) -> Rect {
    let Some(target) = target else {
        return viewport.centered(size);
    };
    let (w, h) = (i32::from(size.width), i32::from(size.height));
    let gap = i32::from(TOOLTIP_GAP);
    let mid_x = i32::from(target.x) + i32::from(target.width) / 2;
    let mid_y = i32::from(target.y) + i32::from(target.height) / 2;
    let (x, y) = match placement {
        Placement::Top => (mid_x - w / 2, i32::from(target.y) - gap - h),
        Placement::Bottom => (mid_x - w / 2, i32::from(target.bottom()) + gap),
        Placement::Left => (i32::from(target.x) - gap - w, mid_y - h / 2),
        Placement::Right => (i32::from(target.right()) + gap, mid_y - h / 2),
    };
    let to_u16 = |v: i32| v.clamp(0, i32::from(u16::MAX)) as u16;
    Rect::new(to_u16(x), to_u16(y), size.width, size.height).clamp_within(viewport)
}

impl ProductTour {
    fn tooltip_lines(step: &TourStep, width: u16) -> Vec<String> {
        wrap_text(step.content, usize::from(width.saturating_sub(4)).max(1))
    }
}

impl Widget for ProductTour {
    fn render(&self, area: Rect, frame: &mut Frame) {
        let Some(step) = self.current_step() else { return };
        let target = frame
            .anchor(step.target)
            .and_then(|rect| rect.intersection_opt(&area));

        // Dim everything except the spotlight.
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                if target.is_some_and(|t| t.contains(x, y)) {
                    continue;
                }
                if let Some(cell) = frame.buffer.get_mut(x, y) {
                    cell.style = cell.style.patch(theme::DIMMED);
                }
            }
        }
        if let Some(target) = target {
            frame.restyle(target, theme::ACCENT);
        }

        let width = area.width.saturating_sub(2).min(TOOLTIP_MAX_WIDTH);
        let lines = Self::tooltip_lines(step, width);
        let size = Size::new(width, lines.len() as u16 + 5);
        let rect = tooltip_rect(target, step.placement, area, size);
        frame.fill(rect, theme::BASE);
        frame.draw_box(rect, theme::FOCUS_BORDER, None);

        let inner = rect.inner(Sides::new(1, 2, 1, 2));
        let (title_row, body) = inner.split_top(1);
        frame.print_in(title_row, step.title, theme::ACCENT);
        let counter = format!("{}/{}", self.index + 1, self.steps.len());
        let counter_x = title_row.right().saturating_sub(counter.len() as u16);
        frame.print(counter_x, title_row.y, &counter, theme::MUTED, title_row.right());

        let (text, hints) = body.inner(Sides::new(1, 0, 0, 0)).split_bottom(1);
        for (i, line) in lines.iter().enumerate() {
            if let Some(row) = text.row(i as u16) {
                frame.print_in(row, line, theme::BASE);
            }
        }

        let next_label = if self.index + 1 == self.steps.len() {
            "finish"
        } else {
            "next"
        };
        if self.index == 0 {
            render_hints(frame, hints, &[("→", next_label), ("Esc", "skip")]);
        } else {
            render_hints(
                frame,
                hints,
                &[("←", "back"), ("→", next_label), ("Esc", "skip")],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::event::KeyEvent;
    use proptest::prelude::*;

    const STEPS: &[TourStep] = &[
        TourStep {
            target: "a",
            title: "A",
            content: "first",
            placement: Placement::Bottom,
        },
        TourStep {
            target: "b",
            title: "B",
            content: "second",
            placement: Placement::Right,
        },
        TourStep {
            target: "c",
            title: "C",
            content: "third",
            placement: Placement::Top,
        },
    ];

    fn started() -> ProductTour {
        let mut tour = ProductTour::new(STEPS);
        assert_eq!(tour.start(), None);
        tour
    }

    #[test]
    fn walks_forward_and_back() {
        let mut tour = started();
        assert_eq!(
            tour.next(),
            Some(TourEvent::StepChanged {
                from: 0,
                to: 1,
                target: "b"
            })
        );
        assert_eq!(
            tour.prev(),
            Some(TourEvent::StepChanged {
                from: 1,
                to: 0,
                target: "a"
            })
        );
    }

    #[test]
    fn prev_on_first_step_is_noop() {
        let mut tour = started();
        assert_eq!(tour.prev(), None);
        assert_eq!(tour.step_index(), 0);
    }

    #[test]
    fn next_on_last_step_completes_once() {
        let mut tour = started();
        tour.next();
        tour.next();
        assert_eq!(tour.step_index(), 2);
        assert_eq!(tour.next(), Some(TourEvent::Completed));
        assert!(tour.is_completed());
        assert!(!tour.is_active());
        assert_eq!(tour.next(), None);
        assert_eq!(tour.skip(), None);
        assert_eq!(tour.step_index(), 2);
    }

    #[test]
    fn skip_completes_from_any_step() {
        let mut tour = started();
        tour.next();
        assert_eq!(tour.skip(), Some(TourEvent::Completed));
        assert_eq!(tour.current_step(), None);
    }

    #[test]
    fn keys_drive_the_tour() {
        let mut tour = started();
        tour.handle_event(&Event::Key(KeyEvent::char('l')));
        assert_eq!(tour.step_index(), 1);
        tour.handle_event(&Event::Key(KeyEvent::new(KeyCode::Left)));
        assert_eq!(tour.step_index(), 0);
        assert_eq!(
            tour.handle_event(&Event::Key(KeyEvent::new(KeyCode::Escape))),
            Some(TourEvent::Completed)
        );
    }

    #[test]
    fn tooltip_below_target_is_centered_on_midpoint() {
        let viewport = Rect::from_size(80, 24);
        let target = Rect::new(30, 2, 20, 1);
        let rect = tooltip_rect(Some(target), Placement::Bottom, viewport, Size::new(10, 4));
        assert_eq!(rect, Rect::new(35, 4, 10, 4));
    }

    #[test]
    fn tooltip_right_of_target_is_centered_vertically() {
        let viewport = Rect::from_size(80, 24);
        let target = Rect::new(0, 10, 18, 1);
        let rect = tooltip_rect(Some(target), Placement::Right, viewport, Size::new(20, 6));
        assert_eq!(rect, Rect::new(19, 7, 20, 6));
    }

    #[test]
    fn tooltip_is_clamped_into_viewport() {
        let viewport = Rect::from_size(80, 24);
        let target = Rect::new(2, 23, 10, 1);
        let rect = tooltip_rect(Some(target), Placement::Top, viewport, Size::new(30, 5));
        assert_eq!(rect, Rect::new(0, 17, 30, 5));

        let rect = tooltip_rect(Some(target), Placement::Left, viewport, Size::new(30, 5));
        assert!(viewport.contains_rect(&rect));
    }

    #[test]
    fn missing_target_falls_back_to_center() {
        let viewport = Rect::from_size(80, 24);
        let rect = tooltip_rect(None, Placement::Left, viewport, Size::new(40, 8));
        assert_eq!(rect, Rect::new(20, 8, 40, 8));
    }

    #[test]
    fn render_spotlights_anchor_and_shows_counter() {
        let mut tour = started();
        tour.next();
        let mut frame = Frame::new(80, 24);
        frame.print(1, 5, "Datasets", theme::BASE, 20);
        frame.register_anchor("b", Rect::new(1, 5, 8, 1));
        tour.render(frame.area(), &mut frame);

        assert!(frame.buffer.contains_text("2/3"));
        assert!(frame.buffer.contains_text("second"));
        assert!(frame.buffer.contains_text("back"));
        let spot = frame.buffer.get(1, 5).expect("cell");
        assert!(!spot.style.dim);
        let outside = frame.buffer.get(70, 20).expect("cell");
        assert!(outside.style.dim);
    }

    #[test]
    fn render_without_anchor_does_not_panic() {
        let tour = started();
        let mut frame = Frame::new(30, 8);
        tour.render(frame.area(), &mut frame);
        assert!(frame.buffer.contains_text("1/3"));
        assert!(!frame.buffer.contains_text("back"));
    }

    proptest! {
        #[test]
        fn index_stays_in_bounds(moves in prop::collection::vec(0u8..3, 0..40)) {
            let mut tour = started();
            let mut completions = 0;
            for m in moves {
                let event = match m {
                    0 => tour.next(),
                    1 => tour.prev(),
                    _ => tour.skip(),
                };
                if event == Some(TourEvent::Completed) {
                    completions += 1;
                }
                prop_assert!(tour.step_index() < tour.step_count());
            }
            prop_assert!(completions <= 1);
        }
    }
}
