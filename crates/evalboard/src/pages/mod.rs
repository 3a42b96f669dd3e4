#![forbid(unsafe_code)]

//! Page bodies drawn inside the chrome.
//!
//! Only the evaluations list and the login form hold state. The catalog
//! pages render static sample data.

pub mod dashboard;
pub mod evaluations;
pub mod login;
pub mod settings;

use evalboard_core::geometry::{Rect, Sides};
use evalboard_runtime::render::Frame;
use evalboard_widgets::theme;

use crate::routes::Route;

/// A row of sample data for the evaluations list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleEvaluation {
    pub slug: &'static str,
    pub name: &'static str,
    pub agent: &'static str,
    pub score: f32,
    pub status: &'static str,
}

pub const SAMPLE_EVALUATIONS: &[SampleEvaluation] = &[
    SampleEvaluation {
        slug: "rag-pipeline-alpha",
        name: "RAG Pipeline Alpha",
        agent: "retrieval-agent",
        score: 0.87,
        status: "passing",
    },
    SampleEvaluation {
        slug: "support-bot-regression",
        name: "Support Bot Regression",
        agent: "support-bot",
        score: 0.72,
        status: "degraded",
    },
    SampleEvaluation {
        slug: "code-agent-nightly",
        name: "Code Agent Nightly",
        agent: "code-agent",
        score: 0.91,
        status: "passing",
    },
    SampleEvaluation {
        slug: "sql-planner-safety",
        name: "SQL Planner Safety",
        agent: "sql-planner",
        score: 0.64,
        status: "failing",
    },
];

/// Title line plus a bordered body; returns the body.
pub(crate) fn page_frame(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) -> Rect {
    let inner = area.inner(Sides::new(1, 2, 0, 2));
    let (heading, body) = inner.split_top(3);
    if let Some(row) = heading.row(0) {
        frame.print_in(row, title, theme::ACCENT);
    }
    if let Some(row) = heading.row(1) {
        frame.print_in(row, subtitle, theme::MUTED);
    }
    body
}

/// Static catalog pages: datasets, runs, agents, metrics.
pub fn render_catalog(route: Route, frame: &mut Frame, area: Rect) {
    let body = page_frame(frame, area, route.title(), route.description());
    let rows: &[(&str, &str)] = match route {
        Route::Datasets => &[
            ("customer-support-v3", "1,204 cases"),
            ("rag-golden-answers", "312 cases"),
            ("sql-injection-probes", "88 cases"),
        ],
        Route::Runs => &[
            ("run-4821", "RAG Pipeline Alpha · 2m ago"),
            ("run-4820", "Code Agent Nightly · 1h ago"),
            ("run-4819", "Support Bot Regression · 3h ago"),
        ],
        Route::Agents => &[
            ("retrieval-agent", "langchain adapter"),
            ("support-bot", "openai adapter"),
            ("code-agent", "custom adapter"),
        ],
        Route::Metrics => &[
            ("accuracy", "exact match, F1"),
            ("latency", "p50 / p95 response time"),
            ("cost", "tokens and spend per run"),
            ("safety", "refusals, jailbreak probes"),
        ],
        _ => &[],
    };
    if rows.is_empty() {
        frame.print_in(body, "Nothing here yet.", theme::MUTED);
        return;
    }
    for (i, (name, detail)) in rows.iter().enumerate() {
        let Some(row) = body.row(i as u16) else { break };
        let x = frame.print(row.x, row.y, &format!("{name:<24}"), theme::BASE, row.right());
        frame.print(x, row.y, detail, theme::MUTED, row.right());
    }
}
