#![forbid(unsafe_code)]

//! Evaluations list with an inline filter.

use evalboard_core::event::{Event, KeyCode};
use evalboard_core::geometry::Rect;
use evalboard_runtime::render::Frame;
use evalboard_widgets::{TextInput, Widget, theme};

use super::{SAMPLE_EVALUATIONS, SampleEvaluation, page_frame};
use crate::routes::Route;

#[derive(Debug, Clone)]
pub struct EvaluationsPage {
    filter: TextInput,
}

impl Default for EvaluationsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationsPage {
    pub fn new() -> Self {
        Self {
            filter: TextInput::new().with_placeholder("press / to filter"),
        }
    }

    pub fn filter(&self) -> &str {
        self.filter.value()
    }

    pub fn is_editing(&self) -> bool {
        self.filter.is_focused()
    }

    pub fn focus_filter(&mut self) {
        self.filter.set_focused(true);
    }

    /// Rows whose name or agent contains the filter text.
    pub fn visible(&self) -> Vec<&'static SampleEvaluation> {
        let needle = self.filter.value().trim().to_lowercase();
        SAMPLE_EVALUATIONS
            .iter()
            .filter(|e| {
                needle.is_empty()
                    || e.name.to_lowercase().contains(&needle)
                    || e.agent.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Keys reach the page only while the filter has focus. Enter or Esc
    /// hands focus back; Esc also clears the filter.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        if !self.filter.is_focused() {
            return false;
        }
        if let Event::Key(key) = event
            && key.is_activation()
        {
            match key.code {
                KeyCode::Escape => {
                    self.filter.clear();
                    self.filter.set_focused(false);
                    return true;
                }
                KeyCode::Enter => {
                    self.filter.set_focused(false);
                    return true;
                }
                _ => {}
            }
        }
        self.filter.handle_event(event)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let body = page_frame(
            frame,
            area,
            Route::Evaluations.title(),
            Route::Evaluations.description(),
        );
        let (filter_row, rest) = body.split_top(2);
        if let Some(row) = filter_row.row(0) {
            let x = frame.print(row.x, row.y, "Filter: ", theme::MUTED, row.right());
            let input = Rect::new(x, row.y, row.right().saturating_sub(x), 1);
            self.filter.render(input, frame);
        }

        let rows = self.visible();
        if rows.is_empty() {
            frame.print_in(rest, "No evaluations match the filter.", theme::MUTED);
            return;
        }
        if let Some(header) = rest.row(0) {
            frame.print_in(
                header,
                &format!("{:<28}{:<18}{:>7}  {}", "NAME", "AGENT", "SCORE", "STATUS"),
                theme::MUTED,
            );
        }
        for (i, eval) in rows.iter().enumerate() {
            let Some(row) = rest.row(i as u16 + 1) else { break };
            let status_style = match eval.status {
                "passing" => theme::SUCCESS,
                "failing" => theme::ERROR,
                _ => theme::BASE,
            };
            let x = frame.print(
                row.x,
                row.y,
                &format!("{:<28}{:<18}{:>7.2}  ", eval.name, eval.agent, eval.score),
                theme::BASE,
                row.right(),
            );
            frame.print(x, row.y, eval.status, status_style, row.right());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::event::KeyEvent;

    fn type_text(page: &mut EvaluationsPage, text: &str) {
        for c in text.chars() {
            page.handle_event(&Event::Key(KeyEvent::char(c)));
        }
    }

    #[test]
    fn keys_ignored_until_focused() {
        let mut page = EvaluationsPage::new();
        assert!(!page.handle_event(&Event::Key(KeyEvent::char('r'))));
        assert_eq!(page.filter(), "");
    }

    #[test]
    fn filter_narrows_rows() {
        let mut page = EvaluationsPage::new();
        page.focus_filter();
        type_text(&mut page, "SQL");
        let names: Vec<&str> = page.visible().iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["SQL Planner Safety"]);
    }

    #[test]
    fn escape_clears_and_blurs() {
        let mut page = EvaluationsPage::new();
        page.focus_filter();
        type_text(&mut page, "zzz");
        assert!(page.visible().is_empty());
        page.handle_event(&Event::Key(KeyEvent::new(KeyCode::Escape)));
        assert!(!page.is_editing());
        assert_eq!(page.visible().len(), SAMPLE_EVALUATIONS.len());
    }

    #[test]
    fn renders_table() {
        let page = EvaluationsPage::new();
        let mut frame = Frame::new(90, 14);
        let area = frame.area();
        page.render(&mut frame, area);
        assert!(frame.buffer.contains_text("RAG Pipeline Alpha"));
        assert!(frame.buffer.contains_text("press / to filter"));
    }
}
