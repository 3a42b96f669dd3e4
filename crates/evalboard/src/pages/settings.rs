#![forbid(unsafe_code)]

//! View of the stored profile and signed-in user. The page's own shortcuts
//! (sign out, onboarding tips) live in the app's Settings scope.

use evalboard_client::User;
use evalboard_core::geometry::Rect;
use evalboard_core::profile::{FontSize, Theme, UserProfile};
use evalboard_runtime::render::Frame;
use evalboard_widgets::theme;

use super::page_frame;
use crate::routes::Route;

pub fn render(profile: &UserProfile, user: Option<&User>, frame: &mut Frame, area: Rect) {
    let body = page_frame(frame, area, Route::Settings.title(), Route::Settings.description());

    let theme_label = match profile.preferences.theme {
        Theme::Dark => "dark",
        Theme::Light => "light",
        Theme::System => "system",
    };
    let font_label = match profile.preferences.font_size {
        FontSize::Small => "small",
        FontSize::Medium => "medium",
        FontSize::Large => "large",
    };
    let yes_no = |b: bool| if b { "on" } else { "off" };

    let rows = [
        ("Signed in as", user.map_or_else(|| "-".to_string(), |u| u.display_name().to_string())),
        ("Role", profile.role.label().to_string()),
        ("Experience mode", profile.complexity.label().to_string()),
        ("Onboarding tips", yes_no(profile.show_onboarding).to_string()),
        ("Achievements", yes_no(profile.show_gamification).to_string()),
        ("Theme", theme_label.to_string()),
        ("Reduced motion", yes_no(profile.preferences.reduced_motion).to_string()),
        ("Font size", font_label.to_string()),
    ];
    for (i, (label, value)) in rows.iter().enumerate() {
        let Some(row) = body.row(i as u16) else { break };
        let x = frame.print(row.x, row.y, &format!("{label:<18}"), theme::MUTED, row.right());
        frame.print(x, row.y, value, theme::BASE, row.right());
    }
}
