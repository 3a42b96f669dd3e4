#![forbid(unsafe_code)]

//! Buffer-diff presenter.
//!
//! Keeps the last presented buffer and writes only the cells that changed.
//! A size change forces a full repaint.

use std::io::{self, Write};

use crossterm::style::{Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, queue, terminal};

use crate::render::{Buffer, Frame, Style};

#[derive(Debug, Default)]
pub struct Presenter {
    previous: Option<Buffer>,
}

impl Presenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last frame so the next present repaints everything.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Write `frame` to `out`. Returns the number of cells emitted.
    pub fn present<W: Write>(&mut self, frame: &Frame, out: &mut W) -> io::Result<usize> {
        let next = &frame.buffer;
        let full = match &self.previous {
            Some(prev) => prev.width() != next.width() || prev.height() != next.height(),
            None => true,
        };
        if full {
            queue!(out, terminal::Clear(terminal::ClearType::All))?;
        }

        let mut emitted = 0usize;
        let mut current: Option<Style> = None;
        let mut expect_cursor: Option<(u16, u16)> = None;
        for y in 0..next.height() {
            for x in 0..next.width() {
                let Some(cell) = next.get(x, y) else { continue };
                if cell.continuation {
                    continue;
                }
                let unchanged = !full
                    && self
                        .previous
                        .as_ref()
                        .and_then(|prev| prev.get(x, y))
                        .is_some_and(|prev| prev == cell);
                if unchanged {
                    continue;
                }
                if expect_cursor != Some((x, y)) {
                    queue!(out, cursor::MoveTo(x, y))?;
                }
                if current != Some(cell.style) {
                    apply_style(out, cell.style)?;
                    current = Some(cell.style);
                }
                queue!(out, Print(cell.ch))?;
                let advance = if next.get(x + 1, y).is_some_and(|c| c.continuation) {
                    2
                } else {
                    1
                };
                expect_cursor = Some((x + advance, y));
                emitted += 1;
            }
        }

        queue!(out, SetAttribute(Attribute::Reset))?;
        match frame.cursor() {
            Some((x, y)) => queue!(out, cursor::MoveTo(x, y), cursor::Show)?,
            None => queue!(out, cursor::Hide)?,
        }
        out.flush()?;

        self.previous = Some(next.clone());
        tracing::trace!(target: "evalboard.render", emitted, full, "frame presented");
        Ok(emitted)
    }
}

fn apply_style<W: Write>(out: &mut W, style: Style) -> io::Result<()> {
    queue!(
        out,
        SetAttribute(Attribute::Reset),
        SetForegroundColor(style.fg.unwrap_or(Color::Reset)),
        SetBackgroundColor(style.bg.unwrap_or(Color::Reset)),
    )?;
    if style.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.dim {
        queue!(out, SetAttribute(Attribute::Dim))?;
    }
    if style.reverse {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    if style.underline {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    Ok(())
}
