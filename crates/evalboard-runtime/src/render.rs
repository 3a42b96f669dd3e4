#![forbid(unsafe_code)]

//! Cell buffer and frame.
//!
//! A [`Frame`] is what [`Model::view`](crate::program::Model::view) draws
//! into. Besides the cell grid it carries the anchor registry: views record
//! the rectangle of every element an overlay may want to point at, and the
//! overlay looks them up by id later in the same pass.

use std::collections::HashMap;

pub use crossterm::style::Color;
use evalboard_core::geometry::Rect;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Text attributes for a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
    pub reverse: bool,
    pub underline: bool,
}

impl Style {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            bold: false,
            dim: false,
            reverse: false,
            underline: false,
        }
    }

    #[must_use]
    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    #[must_use]
    pub const fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub const fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    #[must_use]
    pub const fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    #[must_use]
    pub const fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Layer `top` over `self`: set fields in `top` win.
    #[must_use]
    pub fn patch(self, top: Style) -> Style {
        Style {
            fg: top.fg.or(self.fg),
            bg: top.bg.or(self.bg),
            bold: self.bold || top.bold,
            dim: self.dim || top.dim,
            reverse: self.reverse || top.reverse,
            underline: self.underline || top.underline,
        }
    }
}

/// One terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
    /// Trailing half of a wide character; the presenter skips it.
    pub continuation: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: Style::new(),
            continuation: false,
        }
    }
}

impl Cell {
    #[must_use]
    pub const fn from_char(ch: char) -> Self {
        Self {
            ch,
            style: Style::new(),
            continuation: false,
        }
    }
}

/// A width x height grid of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Buffer {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
        }
    }

    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    pub const fn area(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        self.index(x, y).map(|i| &mut self.cells[i])
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(slot) = self.get_mut(x, y) {
            *slot = cell;
        }
    }

    /// Row `y` as plain text, continuation cells dropped.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        (0..self.width)
            .filter_map(|x| self.get(x, y))
            .filter(|cell| !cell.continuation)
            .map(|cell| cell.ch)
            .collect()
    }

    /// Whole buffer as text, one line per row with trailing spaces trimmed.
    #[must_use]
    pub fn to_text(&self) -> String {
        (0..self.height)
            .map(|y| self.row_text(y).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether `needle` appears anywhere in the rendered text.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        (0..self.height).any(|y| self.row_text(y).contains(needle))
    }
}

/// Render target handed to views.
#[derive(Debug)]
pub struct Frame {
    pub buffer: Buffer,
    anchors: HashMap<String, Rect>,
    cursor: Option<(u16, u16)>,
}

impl Frame {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buffer: Buffer::new(width, height),
            anchors: HashMap::new(),
            cursor: None,
        }
    }

    #[inline]
    pub fn area(&self) -> Rect {
        self.buffer.area()
    }

    /// Place the hardware cursor (for focused text inputs).
    pub fn set_cursor(&mut self, position: Option<(u16, u16)>) {
        self.cursor = position;
    }

    #[must_use]
    pub fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    /// Record where an addressable element was drawn this frame.
    pub fn register_anchor(&mut self, id: impl Into<String>, rect: Rect) {
        self.anchors.insert(id.into(), rect);
    }

    /// Look up an anchor registered earlier in this frame.
    #[must_use]
    pub fn anchor(&self, id: &str) -> Option<Rect> {
        self.anchors.get(id).copied()
    }

    /// Draw `text` starting at `(x, y)`, clipped at `max_x` (exclusive).
    ///
    /// Returns the column after the last drawn grapheme.
    pub fn print(&mut self, mut x: u16, y: u16, text: &str, style: Style, max_x: u16) -> u16 {
        let max_x = max_x.min(self.buffer.width());
        for grapheme in text.graphemes(true) {
            let w = UnicodeWidthStr::width(grapheme) as u16;
            if w == 0 {
                continue;
            }
            if x.saturating_add(w) > max_x {
                break;
            }
            if let Some(ch) = grapheme.chars().next() {
                self.buffer.set(
                    x,
                    y,
                    Cell {
                        ch,
                        style,
                        continuation: false,
                    },
                );
                for dx in 1..w {
                    self.buffer.set(
                        x + dx,
                        y,
                        Cell {
                            ch: ' ',
                            style,
                            continuation: true,
                        },
                    );
                }
            }
            x += w;
        }
        x
    }

    /// Draw `text` on the first row of `area`, clipped to its width.
    pub fn print_in(&mut self, area: Rect, text: &str, style: Style) -> u16 {
        if area.is_empty() {
            return area.x;
        }
        self.print(area.x, area.y, text, style, area.right())
    }

    /// Overwrite every cell in `area` with a blank of the given style.
    pub fn fill(&mut self, area: Rect, style: Style) {
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.buffer.set(
                    x,
                    y,
                    Cell {
                        ch: ' ',
                        style,
                        continuation: false,
                    },
                );
            }
        }
    }

    /// Layer `style` over the existing cells of `area`, keeping their text.
    pub fn restyle(&mut self, area: Rect, style: Style) {
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                if let Some(cell) = self.buffer.get_mut(x, y) {
                    cell.style = cell.style.patch(style);
                }
            }
        }
    }

    /// Single-line box around `area` with an optional title on the top edge.
    pub fn draw_box(&mut self, area: Rect, style: Style, title: Option<&str>) {
        if area.width < 2 || area.height < 2 {
            return;
        }
        let right = area.right() - 1;
        let bottom = area.bottom() - 1;
        for x in area.x + 1..right {
            self.buffer.set(x, area.y, styled('─', style));
            self.buffer.set(x, bottom, styled('─', style));
        }
        for y in area.y + 1..bottom {
            self.buffer.set(area.x, y, styled('│', style));
            self.buffer.set(right, y, styled('│', style));
        }
        self.buffer.set(area.x, area.y, styled('┌', style));
        self.buffer.set(right, area.y, styled('┐', style));
        self.buffer.set(area.x, bottom, styled('└', style));
        self.buffer.set(right, bottom, styled('┘', style));
        if let Some(title) = title {
            let x = self.print(area.x + 2, area.y, " ", style, right);
            let x = self.print(x, area.y, title, style.bold(), right);
            self.print(x, area.y, " ", style, right);
        }
    }
}

fn styled(ch: char, style: Style) -> Cell {
    Cell {
        ch,
        style,
        continuation: false,
    }
}

/// Display width of `text` in cells.
#[must_use]
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Cut `text` to at most `max` cells, ending in `…` when shortened.
#[must_use]
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if display_width(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = UnicodeWidthStr::width(grapheme);
        if used + w > max - 1 {
            break;
        }
        out.push_str(grapheme);
        used += w;
    }
    out.push('…');
    out
}

/// Greedy word wrap to `width` cells.
#[must_use]
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if width == 0 {
        return lines;
    }
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                display_width(word)
            } else {
                display_width(&line) + 1 + display_width(word)
            };
            if candidate > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&truncate_to_width(word, width));
        }
        lines.push(line);
    }
    lines
}
