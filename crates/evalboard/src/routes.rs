#![forbid(unsafe_code)]

//! Console routes and their paths.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    #[default]
    Dashboard,
    Evaluations,
    Datasets,
    Runs,
    Agents,
    Metrics,
    Settings,
    Login,
    SetupWizard,
    TenantWizard,
}

impl Route {
    /// Every route, sidebar entries first.
    pub const ALL: [Route; 10] = [
        Route::Dashboard,
        Route::Evaluations,
        Route::Datasets,
        Route::Runs,
        Route::Agents,
        Route::Metrics,
        Route::Settings,
        Route::Login,
        Route::SetupWizard,
        Route::TenantWizard,
    ];

    /// Routes shown in the sidebar, in order.
    pub const NAV: [Route; 7] = [
        Route::Dashboard,
        Route::Evaluations,
        Route::Datasets,
        Route::Runs,
        Route::Agents,
        Route::Metrics,
        Route::Settings,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Evaluations => "/evaluations",
            Route::Datasets => "/datasets",
            Route::Runs => "/runs",
            Route::Agents => "/agents",
            Route::Metrics => "/metrics",
            Route::Settings => "/settings",
            Route::Login => "/login",
            Route::SetupWizard => "/onboarding/setup",
            Route::TenantWizard => "/onboarding/tenants",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Evaluations => "Evaluations",
            Route::Datasets => "Datasets",
            Route::Runs => "Runs",
            Route::Agents => "Agents",
            Route::Metrics => "Metrics",
            Route::Settings => "Settings",
            Route::Login => "Sign in",
            Route::SetupWizard => "Product setup",
            Route::TenantWizard => "Organization setup",
        }
    }

    /// One-line summary used by the palette.
    pub const fn description(self) -> &'static str {
        match self {
            Route::Dashboard => "Overview of recent evaluation activity",
            Route::Evaluations => "Evaluation suites and their latest scores",
            Route::Datasets => "Test cases and golden answers",
            Route::Runs => "Individual evaluation runs and traces",
            Route::Agents => "Registered agents and adapters",
            Route::Metrics => "Metric packs and custom scorers",
            Route::Settings => "Profile, preferences and API keys",
            Route::Login => "Sign in to your account",
            Route::SetupWizard => "Connect your first agent",
            Route::TenantWizard => "Create a tenant and a workspace",
        }
    }

    /// Exact path match; a trailing slash is tolerated.
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = match path.trim() {
            "/" => "/",
            other => other.trim_end_matches('/'),
        };
        Route::ALL.into_iter().find(|route| route.path() == trimmed)
    }

    /// Signed-out users can only see the login page.
    pub const fn requires_auth(self) -> bool {
        !matches!(self, Route::Login)
    }

    /// Full-screen routes without the sidebar and header.
    pub const fn is_bare(self) -> bool {
        matches!(self, Route::Login | Route::SetupWizard | Route::TenantWizard)
    }

    /// Anchor id of the sidebar entry.
    pub fn nav_anchor(self) -> String {
        format!("nav:{}", self.path())
    }

    /// Index in [`Route::NAV`].
    pub fn nav_index(self) -> Option<usize> {
        Route::NAV.iter().position(|r| *r == self)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
