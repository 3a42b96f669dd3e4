#![forbid(unsafe_code)]

//! Landing page. How much it shows depends on the profile's complexity tier.

use evalboard_core::geometry::Rect;
use evalboard_core::profile::{Complexity, UserProfile};
use evalboard_runtime::render::Frame;
use evalboard_widgets::theme;

use super::{SAMPLE_EVALUATIONS, page_frame};

pub fn render(profile: &UserProfile, greeting: &str, frame: &mut Frame, area: Rect) {
    let subtitle = match profile.complexity {
        Complexity::Simple => "A quick look at how your agents are doing.",
        Complexity::Balanced => "Recent evaluations and their scores.",
        Complexity::Advanced => "Scores, regressions and run health across every suite.",
    };
    let body = page_frame(frame, area, greeting, subtitle);

    let passing = SAMPLE_EVALUATIONS
        .iter()
        .filter(|e| e.status == "passing")
        .count();
    let mean = SAMPLE_EVALUATIONS.iter().map(|e| e.score).sum::<f32>()
        / SAMPLE_EVALUATIONS.len().max(1) as f32;

    let mut lines = vec![format!(
        "{passing} of {} evaluations passing",
        SAMPLE_EVALUATIONS.len()
    )];
    if profile.complexity != Complexity::Simple {
        lines.push(format!("Mean score {mean:.2}"));
    }
    if profile.complexity == Complexity::Advanced {
        for eval in SAMPLE_EVALUATIONS.iter().filter(|e| e.status != "passing") {
            lines.push(format!("  {} · {} ({:.2})", eval.name, eval.status, eval.score));
        }
    }
    if profile.show_gamification {
        lines.push(String::new());
        lines.push("Streak: 3 days of green runs".into());
    }

    for (i, line) in lines.iter().enumerate() {
        let Some(row) = body.row(i as u16) else { break };
        frame.print_in(row, line, theme::BASE);
    }
}
