#![forbid(unsafe_code)]

//! Entries offered by the command palette.

use evalboard_widgets::{PaletteCategory, PaletteItem};

use crate::pages::SAMPLE_EVALUATIONS;
use crate::routes::Route;

/// Most recently visited routes kept for the palette.
pub const RECENT_LIMIT: usize = 5;

/// Pages, then recent routes (most recent first), then sample evaluations
/// and actions.
pub fn build(history: &[Route]) -> Vec<PaletteItem> {
    let mut items: Vec<PaletteItem> = Route::NAV
        .iter()
        .map(|route| {
            PaletteItem::page(
                format!("page:{}", route.path()),
                route.title(),
                route.description(),
                route.path(),
            )
        })
        .collect();

    items.extend(history.iter().rev().take(RECENT_LIMIT).map(|route| {
        PaletteItem::new(
            format!("recent:{}", route.path()),
            route.title(),
            format!("Visited recently · {}", route.path()),
            PaletteCategory::Recent,
            route.path(),
        )
    }));

    items.extend(SAMPLE_EVALUATIONS.iter().map(|eval| {
        PaletteItem::new(
            format!("evaluation:{}", eval.slug),
            eval.name,
            format!("Evaluation · {}", eval.agent),
            PaletteCategory::Recent,
            Route::Evaluations.path(),
        )
    }));

    items.push(PaletteItem::new(
        "action:setup",
        "Connect an agent",
        Route::SetupWizard.description(),
        PaletteCategory::Action,
        Route::SetupWizard.path(),
    ));
    items.push(PaletteItem::new(
        "action:tenants",
        "Manage organizations",
        Route::TenantWizard.description(),
        PaletteCategory::Action,
        Route::TenantWizard.path(),
    ));
    items
}

/// Push `route` onto `history`, keeping it unique and bounded.
pub fn remember(history: &mut Vec<Route>, route: Route) {
    if route.is_bare() {
        return;
    }
    history.retain(|r| *r != route);
    history.push(route);
    if history.len() > RECENT_LIMIT {
        let excess = history.len() - RECENT_LIMIT;
        history.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_widgets::command_palette::filter_items;

    fn titles(items: &[PaletteItem], indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| items[i].title.clone()).collect()
    }

    #[test]
    fn empty_query_lists_pages_only() {
        let items = build(&[Route::Runs]);
        let shown = filter_items(&items, "");
        assert!(shown.iter().all(|&i| items[i].category == PaletteCategory::Page));
        assert_eq!(shown.len(), Route::NAV.len());
    }

    #[test]
    fn query_matches_across_categories() {
        let items = build(&[]);
        let shown = titles(&items, &filter_items(&items, "rag"));
        assert!(shown.contains(&"RAG Pipeline Alpha".to_string()));
        assert!(!shown.contains(&"Settings".to_string()));
    }

    #[test]
    fn recent_entries_newest_first() {
        let items = build(&[Route::Runs, Route::Metrics]);
        let recent: Vec<&str> = items
            .iter()
            .filter(|i| i.id.starts_with("recent:"))
            .map(|i| i.path.as_str())
            .collect();
        assert_eq!(recent, vec!["/metrics", "/runs"]);
    }

    #[test]
    fn remember_dedups_and_bounds() {
        let mut history = Vec::new();
        for route in [Route::Runs, Route::Agents, Route::Runs, Route::Login] {
            remember(&mut history, route);
        }
        assert_eq!(history, vec![Route::Agents, Route::Runs]);
        for route in Route::NAV {
            remember(&mut history, route);
        }
        assert_eq!(history.len(), RECENT_LIMIT);
        assert_eq!(history.last(), Some(&Route::Settings));
    }
}
