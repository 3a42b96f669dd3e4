#![forbid(unsafe_code)]

//! Sign-in form.

use evalboard_client::Credentials;
use evalboard_core::event::{Event, KeyCode};
use evalboard_core::geometry::{Rect, Sides, Size};
use evalboard_runtime::render::Frame;
use evalboard_widgets::{TextInput, Widget, theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Email,
    Password,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    email: TextInput,
    password: TextInput,
    focus: Field,
    error: Option<String>,
    submitting: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            email: TextInput::new()
                .with_placeholder("you@company.com")
                .with_focused(true),
            password: TextInput::new().with_mask('•'),
            focus: Field::Email,
            error: None,
            submitting: false,
        }
    }

    pub fn email(&self) -> &str {
        self.email.value()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Both fields always own the keyboard.
    pub fn is_editing(&self) -> bool {
        true
    }

    fn set_focus(&mut self, focus: Field) {
        self.focus = focus;
        self.email.set_focused(focus == Field::Email);
        self.password.set_focused(focus == Field::Password);
    }

    /// Tab/Up/Down switch fields; Enter on the email moves on, Enter on the
    /// password submits. Returns credentials when a submit is valid.
    pub fn handle_event(&mut self, event: &Event) -> Option<Credentials> {
        if self.submitting {
            return None;
        }
        if let Event::Key(key) = event
            && key.is_activation()
        {
            match key.code {
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                    let next = match self.focus {
                        Field::Email => Field::Password,
                        Field::Password => Field::Email,
                    };
                    self.set_focus(next);
                    return None;
                }
                KeyCode::Enter if self.focus == Field::Email => {
                    self.set_focus(Field::Password);
                    return None;
                }
                KeyCode::Enter => return self.submit(),
                _ => {}
            }
        }
        let changed = match self.focus {
            Field::Email => self.email.handle_event(event),
            Field::Password => self.password.handle_event(event),
        };
        if changed {
            self.error = None;
        }
        None
    }

    fn submit(&mut self) -> Option<Credentials> {
        if self.email.is_empty() || self.password.value().is_empty() {
            self.error = Some("Enter your email and password.".into());
            return None;
        }
        self.error = None;
        self.submitting = true;
        Some(Credentials {
            email: self.email.value().trim().to_string(),
            password: self.password.value().to_string(),
        })
    }

    /// Show a message without touching the fields.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// A failed attempt keeps the email and clears the password.
    pub fn failed(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.error = Some(message.into());
        self.password.clear();
        self.set_focus(Field::Password);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let modal = area.centered(Size::new(area.width.saturating_sub(4).min(50), 11));
        frame.draw_box(modal, theme::FOCUS_BORDER, Some("Sign in to evalboard"));
        let inner = modal.inner(Sides::new(1, 2, 1, 2));

        let rows = [
            ("Email", &self.email, Field::Email),
            ("Password", &self.password, Field::Password),
        ];
        for (i, (label, input, field)) in rows.into_iter().enumerate() {
            let Some(row) = inner.row(i as u16 * 2) else { break };
            let label_style = if self.focus == field {
                theme::ACCENT
            } else {
                theme::MUTED
            };
            let x = frame.print(row.x, row.y, &format!("{label:<10}"), label_style, row.right());
            input.render(Rect::new(x, row.y, row.right().saturating_sub(x), 1), frame);
        }

        if let Some(row) = inner.row(5) {
            if let Some(error) = &self.error {
                frame.print_in(row, error, theme::ERROR);
            } else if self.submitting {
                frame.print_in(row, "Signing in…", theme::MUTED);
            }
        }
        if let Some(row) = inner.row(7) {
            frame.print_in(row, "Tab switch field · Enter sign in · Ctrl+C quit", theme::MUTED);
        }
    }
}
