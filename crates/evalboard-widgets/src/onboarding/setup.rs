#![forbid(unsafe_code)]

//! First-run product setup.
//!
//! `Welcome → ApiKey → LiveCapture → FirstDashboard → AdapterReview →
//! Activated → MetricPacks → done`
//!
//! Each step kind carries its own state in [`SetupStage`], so an API-key
//! input only exists while on the API-key step and a capture counter only
//! while capturing. Answers that outlive a step go into [`SetupData`].
//! Validation failures set an inline message and leave step and data alone.

use evalboard_core::event::{Event, KeyCode};
use evalboard_core::geometry::{Rect, Sides, Size};
use evalboard_runtime::render::{Frame, wrap_text};
use tracing::{debug, info};

use super::live_capture::{ADAPTER_VERIFY_CAP, LiveCapture, SETUP_CAPTURE_CAP};
use crate::text_input::TextInput;
use crate::{Widget, render_hints, theme};

/// Required prefix of evalboard API keys.
pub const API_KEY_PREFIX: &str = "eb_";

/// Metric packs offered on the last step, as `(id, description)`.
pub const METRIC_PACKS: &[(&str, &str)] = &[
    ("accuracy", "Exact match, F1 and judge-graded correctness"),
    ("latency", "Time to first token and end-to-end duration"),
    ("cost", "Token usage and spend per run"),
    ("safety", "Toxicity, PII leakage and jailbreak resistance"),
    ("rag-quality", "Faithfulness, context recall and citation accuracy"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStep {
    Welcome,
    ApiKey,
    LiveCapture,
    FirstDashboard,
    AdapterReview,
    Activated,
    MetricPacks,
}

impl SetupStep {
    pub const ALL: [SetupStep; 7] = [
        SetupStep::Welcome,
        SetupStep::ApiKey,
        SetupStep::LiveCapture,
        SetupStep::FirstDashboard,
        SetupStep::AdapterReview,
        SetupStep::Activated,
        SetupStep::MetricPacks,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<SetupStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn prev(self) -> Option<SetupStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub const fn title(self) -> &'static str {
        match self {
            SetupStep::Welcome => "Welcome",
            SetupStep::ApiKey => "Connect your API key",
            SetupStep::LiveCapture => "Capture live traces",
            SetupStep::FirstDashboard => "Your first dashboard",
            SetupStep::AdapterReview => "Verify the adapter",
            SetupStep::Activated => "Agent activated",
            SetupStep::MetricPacks => "Choose metric packs",
        }
    }
}

/// Answers gathered across steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupData {
    pub api_key: Option<String>,
    pub traces_collected: u32,
    pub selected_packs: Vec<String>,
}

/// The current step with its step-local state.
#[derive(Debug, Clone)]
pub enum SetupStage {
    Welcome,
    ApiKey {
        input: TextInput,
    },
    LiveCapture {
        capture: LiveCapture,
    },
    FirstDashboard,
    AdapterReview {
        capture: LiveCapture,
    },
    Activated,
    MetricPacks {
        cursor: usize,
        selected: Vec<bool>,
    },
}

impl SetupStage {
    pub fn step(&self) -> SetupStep {
        match self {
            SetupStage::Welcome => SetupStep::Welcome,
            SetupStage::ApiKey { .. } => SetupStep::ApiKey,
            SetupStage::LiveCapture { .. } => SetupStep::LiveCapture,
            SetupStage::FirstDashboard => SetupStep::FirstDashboard,
            SetupStage::AdapterReview { .. } => SetupStep::AdapterReview,
            SetupStage::Activated => SetupStep::Activated,
            SetupStage::MetricPacks { .. } => SetupStep::MetricPacks,
        }
    }

    /// Fresh state for `step`, seeded from answers already given.
    fn enter(step: SetupStep, data: &SetupData) -> Self {
        match step {
            SetupStep::Welcome => SetupStage::Welcome,
            SetupStep::ApiKey => {
                let mut input = TextInput::new()
                    .with_placeholder("eb_…")
                    .with_mask('•')
                    .with_focused(true);
                if let Some(key) = &data.api_key {
                    input.set_value(key.as_str());
                }
                SetupStage::ApiKey { input }
            }
            SetupStep::LiveCapture => SetupStage::LiveCapture {
                capture: LiveCapture::resumed(SETUP_CAPTURE_CAP, data.traces_collected),
            },
            SetupStep::FirstDashboard => SetupStage::FirstDashboard,
            SetupStep::AdapterReview => SetupStage::AdapterReview {
                capture: LiveCapture::new(ADAPTER_VERIFY_CAP),
            },
            SetupStep::Activated => SetupStage::Activated,
            SetupStep::MetricPacks => {
                let selected = METRIC_PACKS
                    .iter()
                    .map(|(id, _)| data.selected_packs.iter().any(|p| p == id))
                    .collect();
                SetupStage::MetricPacks {
                    cursor: 0,
                    selected,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupEvent {
    StepChanged { from: SetupStep, to: SetupStep },
    Completed(SetupData),
}

#[derive(Debug, Clone)]
pub struct SetupWizard {
    stage: SetupStage,
    data: SetupData,
    error: Option<String>,
    completed: bool,
}

impl Default for SetupWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupWizard {
    pub fn new() -> Self {
        Self {
            stage: SetupStage::Welcome,
            data: SetupData::default(),
            error: None,
            completed: false,
        }
    }

    pub fn step(&self) -> SetupStep {
        self.stage.step()
    }

    pub fn stage(&self) -> &SetupStage {
        &self.stage
    }

    pub fn data(&self) -> &SetupData {
        &self.data
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// A text input has the keyboard.
    pub fn is_editing(&self) -> bool {
        matches!(self.stage, SetupStage::ApiKey { .. })
    }

    /// A capture counter is running and wants interval ticks.
    pub fn wants_ticks(&self) -> bool {
        match &self.stage {
            SetupStage::LiveCapture { capture } | SetupStage::AdapterReview { capture } => {
                capture.is_running()
            }
            _ => false,
        }
    }

    /// Count one simulated arrival. Returns `true` if anything changed.
    pub fn tick(&mut self) -> bool {
        match &mut self.stage {
            SetupStage::LiveCapture { capture } => {
                let changed = capture.tick();
                self.data.traces_collected = capture.collected();
                changed
            }
            SetupStage::AdapterReview { capture } => capture.tick(),
            _ => false,
        }
    }

    /// Whether the continue action is currently enabled.
    pub fn can_continue(&self) -> bool {
        match &self.stage {
            SetupStage::LiveCapture { capture } | SetupStage::AdapterReview { capture } => {
                capture.can_continue()
            }
            _ => !self.completed,
        }
    }

    pub fn handle_event(&mut self, event: &Event) -> Option<SetupEvent> {
        if self.completed {
            return None;
        }
        if let Event::Key(key) = event {
            if !key.is_activation() {
                return None;
            }
            match key.code {
                KeyCode::Enter => return self.advance(),
                KeyCode::Escape => return self.back(),
                _ => {}
            }
        }

        match &mut self.stage {
            SetupStage::ApiKey { input } => {
                if input.handle_event(event) {
                    self.error = None;
                }
            }
            SetupStage::MetricPacks { cursor, selected } => {
                let Event::Key(key) = event else { return None };
                match key.code {
                    KeyCode::Up | KeyCode::Char('k') => {
                        *cursor = (*cursor + selected.len() - 1) % selected.len();
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        *cursor = (*cursor + 1) % selected.len();
                    }
                    KeyCode::Char(' ') | KeyCode::Char('x') => {
                        selected[*cursor] = !selected[*cursor];
                        self.error = None;
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        None
    }

    /// Validate the current step and move forward.
    pub fn advance(&mut self) -> Option<SetupEvent> {
        if self.completed {
            return None;
        }
        match &self.stage {
            SetupStage::ApiKey { input } => {
                let key = input.value().trim();
                if key.is_empty() {
                    return self.reject("Enter your API key to continue.");
                }
                if !key.starts_with(API_KEY_PREFIX) {
                    return self.reject("API keys start with \"eb_\". Copy the key from Settings → API keys.");
                }
                self.data.api_key = Some(key.to_string());
            }
            SetupStage::LiveCapture { capture } => {
                if !capture.can_continue() {
                    return None;
                }
                self.data.traces_collected = capture.collected();
            }
            SetupStage::AdapterReview { capture } => {
                if !capture.can_continue() {
                    return None;
                }
            }
            SetupStage::MetricPacks { selected, .. } => {
                let packs: Vec<String> = METRIC_PACKS
                    .iter()
                    .zip(selected)
                    .filter(|(_, on)| **on)
                    .map(|((id, _), _)| (*id).to_string())
                    .collect();
                if packs.is_empty() {
                    return self.reject("Select at least one metric pack.");
                }
                self.data.selected_packs = packs;
                self.completed = true;
                self.error = None;
                info!(
                    target: "evalboard.onboarding",
                    traces = self.data.traces_collected,
                    packs = self.data.selected_packs.len(),
                    "setup completed"
                );
                return Some(SetupEvent::Completed(self.data.clone()));
            }
            SetupStage::Welcome | SetupStage::FirstDashboard | SetupStage::Activated => {}
        }
        let from = self.step();
        let to = from.next()?;
        Some(self.go_to(from, to))
    }

    /// Return to the previous step. No-op on the first.
    pub fn back(&mut self) -> Option<SetupEvent> {
        if self.completed {
            return None;
        }
        let from = self.step();
        let to = from.prev()?;
        Some(self.go_to(from, to))
    }

    fn go_to(&mut self, from: SetupStep, to: SetupStep) -> SetupEvent {
        self.stage = SetupStage::enter(to, &self.data);
        self.error = None;
        debug!(target: "evalboard.onboarding", from = ?from, to = ?to, "setup step");
        SetupEvent::StepChanged { from, to }
    }

    fn reject(&mut self, message: &str) -> Option<SetupEvent> {
        debug!(target: "evalboard.onboarding", step = ?self.step(), reason = message, "validation failed");
        self.error = Some(message.to_string());
        None
    }
}

impl Widget for SetupWizard {
    fn render(&self, area: Rect, frame: &mut Frame) {
        let modal = area.centered(Size::new(
            area.width.saturating_sub(4).min(72),
            area.height.saturating_sub(2).min(18),
        ));
        frame.fill(modal, theme::BASE);
        frame.draw_box(modal, theme::FOCUS_BORDER, Some("Set up evalboard"));

        let inner = modal.inner(Sides::new(1, 2, 1, 2));
        let (header, rest) = inner.split_top(2);
        let (body, footer) = rest.split_bottom(2);
        let step = self.step();
        let x = frame.print_in(
            header,
            &format!("Step {} of {}  ", step.index() + 1, SetupStep::ALL.len()),
            theme::MUTED,
        );
        frame.print(x, header.y, step.title(), theme::ACCENT, header.right());

        let paragraph = |frame: &mut Frame, area: Rect, text: &str| -> u16 {
            let lines = wrap_text(text, usize::from(area.width));
            for (i, line) in lines.iter().enumerate() {
                if let Some(row) = area.row(i as u16) {
                    frame.print_in(row, line, theme::BASE);
                }
            }
            lines.len() as u16 + 1
        };

        match &self.stage {
            SetupStage::Welcome => {
                paragraph(
                    frame,
                    body,
                    "evalboard scores your AI agents against real traffic. This setup connects \
                     your first agent and picks the metrics you care about. It takes about two minutes.",
                );
            }
            SetupStage::ApiKey { input } => {
                let used = paragraph(
                    frame,
                    body,
                    "Paste the API key your SDK will use to send traces.",
                );
                if let Some(row) = body.row(used) {
                    let x = frame.print_in(row, "API key: ", theme::MUTED);
                    let field = Rect::new(x, row.y, row.right().saturating_sub(x), 1);
                    input.render(field, frame);
                }
            }
            SetupStage::LiveCapture { capture } => {
                let used = paragraph(
                    frame,
                    body,
                    "Run your agent once with the SDK installed. Traces appear here as they arrive.",
                );
                if let Some(row) = body.row(used) {
                    capture.render(row, frame, "traces captured");
                }
            }
            SetupStage::FirstDashboard => {
                let used = paragraph(
                    frame,
                    body,
                    "Your first dashboard is ready. These numbers come from the traces you just sent.",
                );
                let stats = [
                    format!("Traces        {}", self.data.traces_collected),
                    "Success rate  100%".to_string(),
                    "p50 latency   1.2s".to_string(),
                ];
                for (i, line) in stats.iter().enumerate() {
                    if let Some(row) = body.row(used + i as u16) {
                        frame.print_in(row, line, theme::BASE);
                    }
                }
            }
            SetupStage::AdapterReview { capture } => {
                let used = paragraph(
                    frame,
                    body,
                    "Checking that the adapter maps inputs, outputs and tool calls correctly.",
                );
                if let Some(row) = body.row(used) {
                    capture.render(row, frame, "checks passed");
                }
            }
            SetupStage::Activated => {
                paragraph(
                    frame,
                    body,
                    "✓ Your agent is live. New runs will be evaluated automatically.",
                );
            }
            SetupStage::MetricPacks { cursor, selected } => {
                for (i, ((id, description), on)) in METRIC_PACKS.iter().zip(selected).enumerate() {
                    let Some(row) = body.row(i as u16) else { break };
                    let mark = if *on { "[x] " } else { "[ ] " };
                    let style = if i == *cursor {
                        theme::SELECTED
                    } else {
                        theme::BASE
                    };
                    let x = frame.print_in(row, mark, style);
                    let x = frame.print(x, row.y, &format!("{id:<13}"), style.bold(), row.right());
                    frame.print(x, row.y, description, theme::MUTED, row.right());
                }
            }
        }

        let (error_row, hints_row) = footer.split_top(1);
        if let Some(error) = &self.error {
            frame.print_in(error_row, error, theme::ERROR);
        }
        let continue_label = if step == SetupStep::MetricPacks {
            "finish"
        } else {
            "continue"
        };
        let mut hints: Vec<(&str, &str)> = Vec::new();
        if step == SetupStep::MetricPacks {
            hints.push(("Space", "toggle"));
        }
        if self.can_continue() {
            hints.push(("Enter", continue_label));
        } else {
            hints.push(("…", "waiting"));
        }
        if step.prev().is_some() {
            hints.push(("Esc", "back"));
        }
        render_hints(frame, hints_row, &hints);
    }
}
