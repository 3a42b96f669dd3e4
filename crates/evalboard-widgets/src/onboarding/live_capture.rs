#![forbid(unsafe_code)]

//! Simulated trace arrival.
//!
//! A counter that the owner ticks from an interval subscription. It stops at
//! its cap and gates the step's continue action.

use std::time::Duration;

use evalboard_core::geometry::Rect;
use evalboard_runtime::render::Frame;

use crate::theme;

/// Cap for the setup wizard's capture step.
pub const SETUP_CAPTURE_CAP: u32 = 5;
/// Cap for adapter verification.
pub const ADAPTER_VERIFY_CAP: u32 = 6;
/// Interval between simulated arrivals.
pub const CAPTURE_INTERVAL: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveCapture {
    collected: u32,
    cap: u32,
}

impl LiveCapture {
    pub const fn new(cap: u32) -> Self {
        Self { collected: 0, cap }
    }

    /// A counter resumed at `collected`, clamped to `cap`.
    pub fn resumed(cap: u32, collected: u32) -> Self {
        Self {
            collected: collected.min(cap),
            cap,
        }
    }

    pub const fn collected(&self) -> u32 {
        self.collected
    }

    pub const fn cap(&self) -> u32 {
        self.cap
    }

    /// Count one arrival. Returns `false` once the cap has been reached.
    pub fn tick(&mut self) -> bool {
        if self.collected >= self.cap {
            return false;
        }
        self.collected += 1;
        true
    }

    pub const fn can_continue(&self) -> bool {
        self.collected >= self.cap
    }

    /// Whether ticks are still wanted.
    pub const fn is_running(&self) -> bool {
        !self.can_continue()
    }

    /// Progress bar and counter on one row.
    pub fn render(&self, area: Rect, frame: &mut Frame, label: &str) {
        let Some(row) = area.row(0) else { return };
        let counter = format!(" {}/{} {label}", self.collected, self.cap);
        let bar_width = row.width.saturating_sub(counter.chars().count() as u16).min(30);
        let filled = if self.cap == 0 {
            bar_width
        } else {
            (u32::from(bar_width) * self.collected / self.cap) as u16
        };
        let mut x = row.x;
        for i in 0..bar_width {
            let (ch, style) = if i < filled {
                ("█", theme::SUCCESS)
            } else {
                ("░", theme::MUTED)
            };
            x = frame.print(x, row.y, ch, style, row.right());
        }
        let style = if self.can_continue() {
            theme::SUCCESS
        } else {
            theme::BASE
        };
        frame.print(x, row.y, &counter, style, row.right());
    }
}
