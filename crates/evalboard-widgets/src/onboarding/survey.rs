#![forbid(unsafe_code)]

//! Two-screen welcome survey: role, then experience level.
//!
//! The survey only collects answers. Persisting them, and deciding whether
//! the tour follows, is up to the owner once [`SurveyEvent::Completed`]
//! arrives.

use evalboard_core::event::{Event, KeyCode};
use evalboard_core::geometry::{Rect, Sides, Size};
use evalboard_core::profile::{Complexity, ExperienceLevel, ProfilePatch, Role, derive_complexity};
use evalboard_runtime::render::Frame;
use tracing::debug;

use crate::{Widget, render_choices, render_hints, theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyStep {
    RoleSelect,
    ExperienceSelect,
}

/// The answers, with the complexity tier already derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveyResult {
    pub role: Role,
    pub level: ExperienceLevel,
    pub complexity: Complexity,
}

impl SurveyResult {
    pub fn new(role: Role, level: ExperienceLevel) -> Self {
        Self {
            role,
            level,
            complexity: derive_complexity(role, level),
        }
    }

    /// The single profile update written on completion.
    pub fn to_patch(&self) -> ProfilePatch {
        ProfilePatch {
            role: Some(self.role),
            complexity: Some(self.complexity),
            ..ProfilePatch::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyEvent {
    Advanced,
    Back,
    Completed(SurveyResult),
}

#[derive(Debug, Clone)]
pub struct WelcomeSurvey {
    step: SurveyStep,
    role_cursor: usize,
    level_cursor: usize,
    role: Option<Role>,
}

impl Default for WelcomeSurvey {
    fn default() -> Self {
        Self::new()
    }
}

impl WelcomeSurvey {
    pub fn new() -> Self {
        Self {
            step: SurveyStep::RoleSelect,
            role_cursor: 0,
            level_cursor: 0,
            role: None,
        }
    }

    pub fn step(&self) -> SurveyStep {
        self.step
    }

    pub fn selected_role(&self) -> Option<Role> {
        self.role
    }

    fn option_count(&self) -> usize {
        match self.step {
            SurveyStep::RoleSelect => Role::ALL.len(),
            SurveyStep::ExperienceSelect => ExperienceLevel::ALL.len(),
        }
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self.step {
            SurveyStep::RoleSelect => &mut self.role_cursor,
            SurveyStep::ExperienceSelect => &mut self.level_cursor,
        }
    }

    /// Arrows or `j`/`k` move, Enter or a digit picks, Esc/Backspace goes back.
    pub fn handle_event(&mut self, event: &Event) -> Option<SurveyEvent> {
        let Event::Key(key) = event else { return None };
        if !key.is_activation() || key.ctrl() || key.alt() {
            return None;
        }
        let count = self.option_count();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                let cursor = self.cursor_mut();
                *cursor = (*cursor + count - 1) % count;
                None
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                let cursor = self.cursor_mut();
                *cursor = (*cursor + 1) % count;
                None
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as usize) - ('1' as usize);
                if index >= count {
                    return None;
                }
                *self.cursor_mut() = index;
                self.choose()
            }
            KeyCode::Enter => self.choose(),
            KeyCode::Escape | KeyCode::Backspace | KeyCode::Left
                if self.step == SurveyStep::ExperienceSelect =>
            {
                self.step = SurveyStep::RoleSelect;
                Some(SurveyEvent::Back)
            }
            _ => None,
        }
    }

    fn choose(&mut self) -> Option<SurveyEvent> {
        match self.step {
            SurveyStep::RoleSelect => {
                let role = Role::ALL[self.role_cursor];
                self.role = Some(role);
                self.step = SurveyStep::ExperienceSelect;
                debug!(target: "evalboard.onboarding", %role, "role selected");
                Some(SurveyEvent::Advanced)
            }
            SurveyStep::ExperienceSelect => {
                let role = self.role?;
                let level = ExperienceLevel::ALL[self.level_cursor];
                let result = SurveyResult::new(role, level);
                debug!(
                    target: "evalboard.onboarding",
                    %role,
                    level = level.label(),
                    complexity = result.complexity.label(),
                    "survey completed"
                );
                Some(SurveyEvent::Completed(result))
            }
        }
    }
}

impl Widget for WelcomeSurvey {
    fn render(&self, area: Rect, frame: &mut Frame) {
        let modal = area.centered(Size::new(area.width.saturating_sub(4).min(60), 14));
        frame.fill(modal, theme::BASE);
        frame.draw_box(modal, theme::FOCUS_BORDER, Some("Welcome to evalboard"));
        let inner = modal.inner(Sides::new(1, 2, 1, 2));
        let (heading, rest) = inner.split_top(2);
        let (body, hints) = rest.split_bottom(1);

        let (step_no, question) = match self.step {
            SurveyStep::RoleSelect => (1, "What best describes your role?"),
            SurveyStep::ExperienceSelect => (2, "How familiar are you with agent evaluation?"),
        };
        let x = frame.print_in(heading, &format!("Step {step_no} of 2  "), theme::MUTED);
        frame.print(x, heading.y, question, theme::ACCENT, heading.right());

        match self.step {
            SurveyStep::RoleSelect => {
                let options: Vec<String> = Role::ALL
                    .iter()
                    .map(|r| format!("{:<11}{}", r.label(), r.blurb()))
                    .collect();
                render_choices(frame, body, &options, self.role_cursor);
                render_hints(frame, hints, &[("↑↓", "choose"), ("Enter", "continue")]);
            }
            SurveyStep::ExperienceSelect => {
                let options: Vec<&str> = ExperienceLevel::ALL.iter().map(|l| l.label()).collect();
                render_choices(frame, body, &options, self.level_cursor);
                render_hints(
                    frame,
                    hints,
                    &[("↑↓", "choose"), ("Enter", "finish"), ("Esc", "back")],
                );
            }
        }
    }
}
