#![forbid(unsafe_code)]

//! Console model.
//!
//! [`AppModel`] owns the shared dispatch registry, the persisted profile and
//! session, every overlay, and the state of the current page. Keys go to the
//! registry first; if nothing is bound, the topmost overlay or the page gets
//! them.
//!
//! Ctrl+C is registered once, at construction. The layout scope follows on
//! sign-in, before any page mounts, so page scopes can add shortcuts but
//! never shadow the global ones.

use std::sync::Arc;

use evalboard_client::{ApiResult, ConsoleApi, Session, User};
use evalboard_core::event::{Event, KeyCode, KeyEvent};
use evalboard_core::geometry::Rect;
use evalboard_core::profile::{ProfilePatch, UserProfile};
use evalboard_runtime::{
    Cmd, CompletionFlag, DispatchContext, Every, Frame, KeyBinding, KeyValueStore, Model,
    ProfileStore, ScopeGuard, SharedRegistry, Subscription,
};
use evalboard_widgets::onboarding::{
    CAPTURE_INTERVAL, RequestToken, SetupEvent, SetupStep, SetupWizard, SurveyEvent,
    TenantRequest, TenantRequestKind, TenantResponse, TenantWizard,
    TenantWizardEvent, WelcomeSurvey,
};
use evalboard_widgets::{
    CommandPalette, HelpOverlay, PaletteAction, ProductTour, TourEvent, Widget,
};
use tracing::{debug, info, warn};

use crate::chrome;
use crate::pages::evaluations::EvaluationsPage;
use crate::pages::login::LoginForm;
use crate::pages::{dashboard, render_catalog, settings};
use crate::palette_items;
use crate::routes::Route;
use crate::session::SessionStore;

/// Viewport assumed until the first resize arrives.
const DEFAULT_VIEWPORT: (u16, u16) = (80, 24);

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum AppMsg {
    /// Terminal input for the focused overlay or page.
    Event(Event),
    /// Terminal resized.
    Resize { width: u16, height: u16 },
    /// Go to a route.
    Navigate(Route),
    /// Open the command palette.
    OpenPalette,
    /// Show the keyboard shortcut list.
    ShowHelp,
    /// Re-read stored state and reset the current page.
    Reload,
    /// Give the evaluations filter the keyboard.
    FocusFilter,
    /// Sign out at the user's request.
    Logout,
    /// Flip `show_onboarding` in the stored profile.
    ToggleOnboardingTips,
    /// Quit the console.
    Quit,
    /// One simulated trace arrival for the setup wizard.
    CaptureTick,
    LoginFinished(ApiResult<Session>),
    ProfileFetched(ApiResult<User>),
    LoggedOut(ApiResult<()>),
    TenantResponse(RequestToken, TenantResponse),
}

impl From<Event> for AppMsg {
    fn from(event: Event) -> Self {
        match event {
            Event::Resize { width, height } => Self::Resize { width, height },
            other => Self::Event(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

pub struct AppModel {
    api: Arc<dyn ConsoleApi>,
    profiles: ProfileStore,
    sessions: SessionStore,
    registry: SharedRegistry<AppMsg>,
    _app_scope: ScopeGuard<AppMsg>,
    layout_scope: Option<ScopeGuard<AppMsg>>,
    page_scope: Option<ScopeGuard<AppMsg>>,

    route: Route,
    history: Vec<Route>,
    profile: UserProfile,
    user: Option<User>,

    palette: CommandPalette,
    help: Option<HelpOverlay>,
    survey: Option<WelcomeSurvey>,
    tour: Option<ProductTour>,

    login: LoginForm,
    evaluations: EvaluationsPage,
    setup: Option<SetupWizard>,
    tenants: Option<TenantWizard>,

    sidebar_scroll: usize,
    viewport: (u16, u16),
    flash: Option<String>,
}

impl AppModel {
    /// Nothing is mounted until [`Model::init`].
    pub fn new(api: Arc<dyn ConsoleApi>, store: Arc<KeyValueStore>) -> Self {
        let profiles = ProfileStore::new(Arc::clone(&store));
        let profile = profiles.load_or_default();
        let registry = SharedRegistry::new();
        let app_scope = registry.scope(
            "App",
            vec![
                KeyBinding::char('c', "Quit", || AppMsg::Quit)
                    .ctrl(true)
                    .allow_in_input(),
            ],
        );
        Self {
            api,
            profiles,
            sessions: SessionStore::new(store),
            registry,
            _app_scope: app_scope,
            layout_scope: None,
            page_scope: None,
            route: Route::Login,
            history: Vec::new(),
            profile,
            user: None,
            palette: CommandPalette::default(),
            help: None,
            survey: None,
            tour: None,
            login: LoginForm::new(),
            evaluations: EvaluationsPage::new(),
            setup: None,
            tenants: None,
            sidebar_scroll: 0,
            viewport: DEFAULT_VIEWPORT,
            flash: None,
        }
    }

    // --- Accessors ---

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn registry(&self) -> &SharedRegistry<AppMsg> {
        &self.registry
    }

    pub fn palette(&self) -> &CommandPalette {
        &self.palette
    }

    pub fn help(&self) -> Option<&HelpOverlay> {
        self.help.as_ref()
    }

    pub fn survey(&self) -> Option<&WelcomeSurvey> {
        self.survey.as_ref()
    }

    pub fn tour(&self) -> Option<&ProductTour> {
        self.tour.as_ref()
    }

    pub fn login(&self) -> &LoginForm {
        &self.login
    }

    pub fn evaluations(&self) -> &EvaluationsPage {
        &self.evaluations
    }

    pub fn setup(&self) -> Option<&SetupWizard> {
        self.setup.as_ref()
    }

    pub fn tenant_wizard(&self) -> Option<&TenantWizard> {
        self.tenants.as_ref()
    }

    pub fn history(&self) -> &[Route] {
        &self.history
    }

    pub fn sidebar_scroll(&self) -> usize {
        self.sidebar_scroll
    }

    pub fn flash(&self) -> Option<&str> {
        self.flash.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    // --- Keyboard ---

    /// Whether something other than the registry owns plain keys right now.
    ///
    /// Overlays and full-screen flows capture the keyboard the same way a
    /// focused text field does; only `allow_in_input` bindings get through.
    pub fn keyboard_captured(&self) -> bool {
        self.palette.is_editing()
            || self.help.is_some()
            || self.survey.is_some()
            || self.tour.is_some()
            || self.route.is_bare()
            || (self.route == Route::Evaluations && self.evaluations.is_editing())
    }

    fn dispatch_context(&self) -> DispatchContext {
        if self.keyboard_captured() {
            DispatchContext::EDITING
        } else {
            DispatchContext::IDLE
        }
    }

    fn layout_bindings() -> Vec<KeyBinding<AppMsg>> {
        vec![
            KeyBinding::char('k', "Open command palette", || AppMsg::OpenPalette),
            KeyBinding::char('n', "Go to evaluations", || {
                AppMsg::Navigate(Route::Evaluations)
            }),
            KeyBinding::char('r', "Reload page", || AppMsg::Reload),
            KeyBinding::char('?', "Keyboard shortcuts", || AppMsg::ShowHelp).shift(true),
            KeyBinding::char('q', "Quit", || AppMsg::Quit),
        ]
    }

    fn page_bindings(route: Route) -> Option<(&'static str, Vec<KeyBinding<AppMsg>>)> {
        match route {
            Route::Evaluations => Some((
                "Evaluations",
                vec![
                    KeyBinding::char('/', "Filter evaluations", || AppMsg::FocusFilter),
                    KeyBinding::char('k', "Search evaluations", || AppMsg::FocusFilter),
                ],
            )),
            Route::Settings => Some((
                "Settings",
                vec![
                    KeyBinding::char('l', "Sign out", || AppMsg::Logout),
                    KeyBinding::char('t', "Toggle onboarding tips", || {
                        AppMsg::ToggleOnboardingTips
                    }),
                ],
            )),
            _ => None,
        }
    }

    /// Register the layout scope if it is not already live.
    fn mount_layout(&mut self) {
        if self.layout_scope.is_none() {
            self.layout_scope = Some(self.registry.scope("Global", Self::layout_bindings()));
            debug!(target: "evalboard.app", "layout shortcuts mounted");
        }
    }

    fn unmount_layout(&mut self) {
        self.page_scope = None;
        if self.layout_scope.take().is_some() {
            debug!(target: "evalboard.app", "layout shortcuts unmounted");
        }
    }

    // --- Routing ---

    fn navigate(&mut self, target: Route) -> Cmd<AppMsg> {
        let route = if target.requires_auth() && self.user.is_none() {
            Route::Login
        } else if target == Route::Login && self.user.is_some() {
            Route::Dashboard
        } else {
            target
        };
        let from = self.route;
        info!(target: "evalboard.app", from = %from, to = %route, "navigate");

        // Unmount the old page.
        self.page_scope = None;
        if from == Route::SetupWizard && route != Route::SetupWizard {
            self.setup = None;
        }
        if from == Route::TenantWizard && route != Route::TenantWizard {
            self.tenants = None;
        }
        if from != route {
            self.flash = None;
        }
        self.route = route;
        palette_items::remember(&mut self.history, route);

        // Mount the new one. Layout first so it wins every conflict.
        if route == Route::Login {
            self.unmount_layout();
            self.login = LoginForm::new();
            return Cmd::none();
        }
        self.mount_layout();
        if let Some((name, bindings)) = Self::page_bindings(route) {
            self.page_scope = Some(self.registry.scope(name, bindings));
        }
        if let Some(index) = route.nav_index() {
            self.sidebar_scroll =
                chrome::scroll_to_reveal(self.sidebar_scroll, index, self.sidebar_capacity());
        }

        match route {
            Route::Evaluations if from != route => {
                self.evaluations = EvaluationsPage::new();
                Cmd::none()
            }
            Route::SetupWizard if self.setup.is_none() => {
                self.setup = Some(SetupWizard::new());
                Cmd::none()
            }
            Route::TenantWizard if self.tenants.is_none() => {
                let mut wizard = if self.profiles.is_completed(CompletionFlag::TenantOnboarding) {
                    TenantWizard::resume()
                } else {
                    TenantWizard::new()
                };
                let request = wizard.start();
                self.tenants = Some(wizard);
                self.run_tenant_request(request)
            }
            _ => Cmd::none(),
        }
    }

    fn navigate_path(&mut self, path: &str) -> Cmd<AppMsg> {
        match Route::from_path(path) {
            Some(route) => self.navigate(route),
            None => {
                warn!(target: "evalboard.app", path, "no route for path");
                self.flash = Some(format!("No page at {path}"));
                Cmd::none()
            }
        }
    }

    fn sidebar_capacity(&self) -> usize {
        let (width, height) = self.viewport;
        chrome::sidebar_capacity(chrome::layout(Rect::from_size(width, height)).sidebar.height)
    }

    // --- Onboarding ---

    fn maybe_show_survey(&mut self) {
        if self.profiles.is_completed(CompletionFlag::Onboarding) {
            return;
        }
        info!(target: "evalboard.onboarding", "showing welcome survey");
        self.survey = Some(WelcomeSurvey::new());
    }

    fn maybe_start_tour(&mut self) {
        if !self.profile.show_onboarding || self.profiles.is_completed(CompletionFlag::Tour) {
            return;
        }
        let mut tour = ProductTour::default();
        let started = tour.start();
        self.tour = Some(tour);
        if let Some(event) = started {
            self.on_tour_event(event);
        } else {
            self.reveal_tour_target();
        }
    }

    fn on_survey_event(&mut self, event: SurveyEvent) -> Cmd<AppMsg> {
        let SurveyEvent::Completed(result) = event else {
            return Cmd::none();
        };
        self.survey = None;
        match self.profiles.complete_onboarding(&result.to_patch()) {
            Some(profile) => {
                self.profile = profile;
                let cmd = if self.route.is_bare() {
                    self.navigate(Route::Dashboard)
                } else {
                    Cmd::none()
                };
                self.maybe_start_tour();
                cmd
            }
            None => Cmd::none(),
        }
    }

    fn on_tour_event(&mut self, event: TourEvent) {
        match event {
            TourEvent::StepChanged { from, to, target } => {
                debug!(target: "evalboard.tour", from, to, anchor = target, "step");
                self.reveal_tour_target();
            }
            TourEvent::Completed => {
                self.profiles.mark_completed(CompletionFlag::Tour);
                self.tour = None;
            }
        }
    }

    /// Scroll the sidebar so the current tour target is on screen.
    fn reveal_tour_target(&mut self) {
        let Some(step) = self.tour.as_ref().and_then(ProductTour::current_step) else {
            return;
        };
        let index = step
            .target
            .strip_prefix("nav:")
            .and_then(Route::from_path)
            .and_then(Route::nav_index);
        if let Some(index) = index {
            self.sidebar_scroll =
                chrome::scroll_to_reveal(self.sidebar_scroll, index, self.sidebar_capacity());
        }
    }

    fn on_setup_event(&mut self, event: SetupEvent) -> Cmd<AppMsg> {
        match event {
            SetupEvent::StepChanged { from, to } => {
                debug!(target: "evalboard.onboarding", from = from.title(), to = to.title(), "setup step");
                Cmd::none()
            }
            SetupEvent::Completed(data) => {
                if let Some(profile) = self.profiles.complete_onboarding(&ProfilePatch::default()) {
                    self.profile = profile;
                }
                self.survey = None;
                info!(
                    target: "evalboard.onboarding",
                    traces = data.traces_collected,
                    packs = data.selected_packs.len(),
                    "setup completed"
                );
                let cmd = self.navigate(Route::Dashboard);
                self.flash = Some(format!(
                    "Agent connected · {} traces · {}",
                    data.traces_collected,
                    data.selected_packs.join(", ")
                ));
                cmd
            }
        }
    }

    fn on_tenant_event(&mut self, event: TenantWizardEvent) -> Cmd<AppMsg> {
        match event {
            TenantWizardEvent::Request(request) => self.run_tenant_request(request),
            TenantWizardEvent::StepChanged { from, to } => {
                debug!(target: "evalboard.onboarding", from = from.title(), to = to.title(), "tenant step");
                Cmd::none()
            }
            TenantWizardEvent::Completed { tenant, workspace } => {
                self.profiles.mark_completed(CompletionFlag::TenantOnboarding);
                info!(
                    target: "evalboard.onboarding",
                    tenant = %tenant.slug,
                    workspace = %workspace.slug,
                    "tenant onboarding completed"
                );
                let cmd = self.navigate(Route::Dashboard);
                self.flash = Some(format!("Workspace {} ready in {}", workspace.name, tenant.name));
                cmd
            }
            TenantWizardEvent::Unauthorized => self.force_logout(),
        }
    }

    fn run_tenant_request(&self, request: TenantRequest) -> Cmd<AppMsg> {
        let api = Arc::clone(&self.api);
        let TenantRequest { token, kind } = request;
        Cmd::task(kind.name(), move || {
            let response = match kind {
                TenantRequestKind::ListTenants => TenantResponse::Listed(api.list_tenants()),
                TenantRequestKind::CreateTenant(tenant) => {
                    TenantResponse::TenantCreated(api.create_tenant(&tenant))
                }
                TenantRequestKind::DeleteTenant { id } => {
                    let result = api.delete_tenant(&id);
                    TenantResponse::TenantDeleted { id, result }
                }
                TenantRequestKind::CreateWorkspace(workspace) => {
                    TenantResponse::WorkspaceCreated(api.create_workspace(&workspace))
                }
            };
            AppMsg::TenantResponse(token, response)
        })
    }

    // --- Auth ---

    fn sign_in(&mut self, session: Session) -> Cmd<AppMsg> {
        info!(target: "evalboard.session", user = %session.user.email, "signed in");
        self.api.set_token(Some(session.token.clone()));
        self.sessions.save(&session);
        self.user = Some(session.user);
        let cmd = self.navigate(Route::Dashboard);
        self.maybe_show_survey();
        cmd
    }

    /// Drop the session after the server rejected it.
    fn force_logout(&mut self) -> Cmd<AppMsg> {
        warn!(target: "evalboard.session", "session rejected, signing out");
        let cmd = self.sign_out();
        self.login.show_error("Your session expired. Please sign in again.");
        cmd
    }

    fn sign_out(&mut self) -> Cmd<AppMsg> {
        self.sessions.clear();
        self.api.set_token(None);
        self.user = None;
        self.palette.close();
        self.help = None;
        self.survey = None;
        self.tour = None;
        self.navigate(Route::Login)
    }

    fn fetch_profile(&self) -> Cmd<AppMsg> {
        let api = Arc::clone(&self.api);
        Cmd::task("profile.fetch", move || AppMsg::ProfileFetched(api.fetch_profile()))
    }

    // --- Input routing ---

    fn handle_event(&mut self, event: Event) -> Cmd<AppMsg> {
        if let Event::Key(key) = &event
            && let Some(msg) = self.registry.dispatch(key, self.dispatch_context())
        {
            return self.update(msg);
        }

        if let Some(survey) = self.survey.as_mut() {
            return match survey.handle_event(&event) {
                Some(outcome) => self.on_survey_event(outcome),
                None => Cmd::none(),
            };
        }
        if let Some(tour) = self.tour.as_mut() {
            if let Some(outcome) = tour.handle_event(&event) {
                self.on_tour_event(outcome);
            }
            return Cmd::none();
        }
        if let Some(help) = &self.help {
            if help.handle_event(&event) {
                self.help = None;
            }
            return Cmd::none();
        }
        if self.palette.is_open() {
            return match self.palette.handle_event(&event) {
                Some(PaletteAction::Navigate(path)) => self.navigate_path(&path),
                Some(PaletteAction::Dismiss) | None => Cmd::none(),
            };
        }
        self.handle_page_event(&event)
    }

    fn handle_page_event(&mut self, event: &Event) -> Cmd<AppMsg> {
        let escape = matches!(event, Event::Key(key) if is_escape(key));
        match self.route {
            Route::Login => match self.login.handle_event(event) {
                Some(credentials) => {
                    let api = Arc::clone(&self.api);
                    Cmd::task("auth.login", move || AppMsg::LoginFinished(api.login(&credentials)))
                }
                None => Cmd::none(),
            },
            Route::Evaluations => {
                self.evaluations.handle_event(event);
                Cmd::none()
            }
            Route::SetupWizard => {
                let Some(wizard) = self.setup.as_mut() else {
                    return Cmd::none();
                };
                let at_start = wizard.step() == SetupStep::Welcome;
                match wizard.handle_event(event) {
                    Some(outcome) => self.on_setup_event(outcome),
                    None if escape && at_start => self.navigate(Route::Dashboard),
                    None => Cmd::none(),
                }
            }
            Route::TenantWizard => {
                let Some(wizard) = self.tenants.as_mut() else {
                    return Cmd::none();
                };
                let at_start = wizard.at_entry();
                match wizard.handle_event(event) {
                    Some(outcome) => self.on_tenant_event(outcome),
                    None if escape && at_start => self.navigate(Route::Dashboard),
                    None => Cmd::none(),
                }
            }
            _ => Cmd::none(),
        }
    }
}

fn is_escape(key: &KeyEvent) -> bool {
    key.is_activation() && key.code == KeyCode::Escape
}

impl Model for AppModel {
    type Message = AppMsg;

    fn init(&mut self) -> Cmd<AppMsg> {
        match self.sessions.restore() {
            Some(session) => {
                self.api.set_token(Some(session.token.clone()));
                self.user = Some(session.user);
                let nav = self.navigate(Route::Dashboard);
                self.maybe_show_survey();
                Cmd::batch(vec![nav, self.fetch_profile()])
            }
            None => self.navigate(Route::Login),
        }
    }

    fn update(&mut self, msg: AppMsg) -> Cmd<AppMsg> {
        match msg {
            AppMsg::Event(event) => self.handle_event(event),
            AppMsg::Resize { width, height } => {
                self.viewport = (width, height);
                self.reveal_tour_target();
                Cmd::none()
            }
            AppMsg::Navigate(route) => self.navigate(route),
            AppMsg::OpenPalette => {
                self.palette.set_items(palette_items::build(&self.history));
                self.palette.open();
                Cmd::none()
            }
            AppMsg::ShowHelp => {
                self.help = Some(HelpOverlay::new(self.registry.entries()));
                Cmd::none()
            }
            AppMsg::Reload => {
                self.profile = self.profiles.load_or_default();
                self.evaluations = EvaluationsPage::new();
                self.flash = Some("Reloaded".into());
                info!(target: "evalboard.app", route = %self.route, "reload");
                if self.user.is_some() {
                    self.fetch_profile()
                } else {
                    Cmd::none()
                }
            }
            AppMsg::FocusFilter => {
                if self.route == Route::Evaluations {
                    self.evaluations.focus_filter();
                }
                Cmd::none()
            }
            AppMsg::Logout => {
                let api = Arc::clone(&self.api);
                Cmd::task("auth.logout", move || AppMsg::LoggedOut(api.logout()))
            }
            AppMsg::ToggleOnboardingTips => {
                let patch = ProfilePatch {
                    show_onboarding: Some(!self.profile.show_onboarding),
                    ..ProfilePatch::default()
                };
                self.profile = self.profiles.update(&patch);
                let state = if self.profile.show_onboarding { "on" } else { "off" };
                self.flash = Some(format!("Onboarding tips {state}"));
                Cmd::none()
            }
            AppMsg::Quit => {
                info!(target: "evalboard.app", "quit requested");
                Cmd::quit()
            }
            AppMsg::CaptureTick => {
                if let Some(wizard) = self.setup.as_mut() {
                    wizard.tick();
                }
                Cmd::none()
            }
            AppMsg::LoginFinished(Ok(session)) => self.sign_in(session),
            AppMsg::LoginFinished(Err(err)) => {
                warn!(target: "evalboard.session", error = %err, "sign-in failed");
                self.login.failed(err.user_message());
                Cmd::none()
            }
            AppMsg::ProfileFetched(Ok(user)) => {
                if self.user.is_some() {
                    self.sessions.update_user(&user);
                    self.user = Some(user);
                }
                Cmd::none()
            }
            AppMsg::ProfileFetched(Err(err)) if err.is_unauthorized() => self.force_logout(),
            AppMsg::ProfileFetched(Err(err)) => {
                warn!(target: "evalboard.session", error = %err, "profile refresh failed");
                self.flash = Some(format!("Could not refresh profile: {}", err.user_message()));
                Cmd::none()
            }
            AppMsg::LoggedOut(result) => {
                if let Err(err) = result {
                    warn!(target: "evalboard.session", error = %err, "logout call failed, clearing local session anyway");
                }
                info!(target: "evalboard.session", "signed out");
                self.sign_out()
            }
            AppMsg::TenantResponse(token, response) => {
                let outcome = self
                    .tenants
                    .as_mut()
                    .and_then(|wizard| wizard.handle_response(token, response));
                match outcome {
                    Some(event) => self.on_tenant_event(event),
                    None => Cmd::none(),
                }
            }
        }
    }

    fn view(&self, frame: &mut Frame) {
        let area = frame.area();
        if area.is_empty() {
            return;
        }

        if self.route.is_bare() {
            match self.route {
                Route::Login => self.login.render(frame, area),
                Route::SetupWizard => {
                    if let Some(wizard) = &self.setup {
                        wizard.render(area, frame);
                    }
                }
                Route::TenantWizard => {
                    if let Some(wizard) = &self.tenants {
                        wizard.render(area, frame);
                    }
                }
                _ => {}
            }
        } else {
            let parts = chrome::layout(area);
            chrome::render_header(frame, parts.header, self.route, self.user.as_ref());
            chrome::render_sidebar(frame, parts.sidebar, self.route, self.sidebar_scroll);
            match self.route {
                Route::Dashboard => {
                    let greeting = match &self.user {
                        Some(user) => format!("Welcome back, {}", user.display_name()),
                        None => "Welcome".to_string(),
                    };
                    dashboard::render(&self.profile, &greeting, frame, parts.content);
                }
                Route::Evaluations => self.evaluations.render(frame, parts.content),
                Route::Settings => {
                    settings::render(&self.profile, self.user.as_ref(), frame, parts.content);
                }
                other => render_catalog(other, frame, parts.content),
            }
            chrome::render_status_bar(frame, parts.status, self.flash.as_deref());
        }

        if let Some(help) = &self.help {
            help.render(area, frame);
        }
        if self.palette.is_open() {
            self.palette.render(area, frame);
        }
        if let Some(survey) = &self.survey {
            survey.render(area, frame);
        }
        // Last: the spotlight needs every anchor drawn above.
        if let Some(tour) = &self.tour {
            tour.render(area, frame);
        }
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<AppMsg>>> {
        let ticking = self.route == Route::SetupWizard
            && self.setup.as_ref().is_some_and(SetupWizard::wants_ticks);
        if ticking {
            vec![Box::new(Every::new(CAPTURE_INTERVAL, || AppMsg::CaptureTick))]
        } else {
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_client::{
        ApiError, Credentials, NewTenant, NewWorkspace, Tenant, Workspace, WorkspaceUpdate,
    };
    use evalboard_core::event::Modifiers;
    use evalboard_runtime::keys;

    struct NoApi;

    impl ConsoleApi for NoApi {
        fn login(&self, _: &Credentials) -> ApiResult<Session> {
            Err(ApiError::Transport("offline".into()))
        }
        fn logout(&self) -> ApiResult<()> {
            Ok(())
        }
        fn fetch_profile(&self) -> ApiResult<User> {
            Err(ApiError::Transport("offline".into()))
        }
        fn list_tenants(&self) -> ApiResult<Vec<Tenant>> {
            Ok(vec![])
        }
        fn create_tenant(&self, _: &NewTenant) -> ApiResult<Tenant> {
            Err(ApiError::Transport("offline".into()))
        }
        fn delete_tenant(&self, _: &str) -> ApiResult<()> {
            Ok(())
        }
        fn create_workspace(&self, _: &NewWorkspace) -> ApiResult<Workspace> {
            Err(ApiError::Transport("offline".into()))
        }
        fn update_workspace(&self, _: &str, _: &WorkspaceUpdate) -> ApiResult<Workspace> {
            Err(ApiError::Transport("offline".into()))
        }
        fn delete_workspace(&self, _: &str) -> ApiResult<()> {
            Ok(())
        }
        fn set_token(&self, _: Option<String>) {}
    }

    fn signed_in_store() -> Arc<KeyValueStore> {
        let store = KeyValueStore::in_memory().shared();
        store.set(keys::AUTH_TOKEN, "opaque");
        store.set(keys::AUTH_USER, r#"{"id":"u1","email":"ada@example.com"}"#);
        store.set(keys::ONBOARDING_COMPLETED, "true");
        store.set(keys::TOUR_COMPLETED, "true");
        store
    }

    fn key(c: char) -> AppMsg {
        AppMsg::Event(Event::Key(KeyEvent::char(c)))
    }

    #[test]
    fn resize_maps_to_its_own_message() {
        let msg = AppMsg::from(Event::Resize { width: 10, height: 4 });
        assert!(matches!(msg, AppMsg::Resize { width: 10, height: 4 }));
    }

    #[test]
    fn boot_without_session_shows_login() {
        let mut app = AppModel::new(Arc::new(NoApi), KeyValueStore::in_memory().shared());
        let _ = app.init();
        assert_eq!(app.route(), Route::Login);
        // Only the always-on Ctrl+C scope.
        assert_eq!(app.registry().scope_count(), 1);
    }

    #[test]
    fn restored_session_mounts_layout() {
        let mut app = AppModel::new(Arc::new(NoApi), signed_in_store());
        let _ = app.init();
        assert_eq!(app.route(), Route::Dashboard);
        assert_eq!(app.registry().scope_count(), 2);
        assert!(app.survey().is_none());
    }

    #[test]
    fn quit_key_quits() {
        let mut app = AppModel::new(Arc::new(NoApi), signed_in_store());
        let _ = app.init();
        assert!(matches!(app.update(key('q')), Cmd::Quit));
    }

    #[test]
    fn ctrl_c_quits_from_login_form() {
        let mut app = AppModel::new(Arc::new(NoApi), KeyValueStore::in_memory().shared());
        let _ = app.init();
        let ctrl_c = Event::Key(KeyEvent::char('c').with_modifiers(Modifiers::CTRL));
        assert!(matches!(app.update(AppMsg::Event(ctrl_c)), Cmd::Quit));
        assert!(!matches!(app.update(key('q')), Cmd::Quit));
    }

    #[test]
    fn help_lists_page_scope_while_mounted() {
        let mut app = AppModel::new(Arc::new(NoApi), signed_in_store());
        let _ = app.init();
        let _ = app.update(AppMsg::Navigate(Route::Evaluations));
        let _ = app.update(AppMsg::ShowHelp);
        let help = app.help().expect("help open");
        let shadowed: Vec<(&str, &str)> = help.shadowed().collect();
        assert_eq!(shadowed, vec![("Evaluations", "k")]);

        let _ = app.update(AppMsg::Event(Event::Key(KeyEvent::new(KeyCode::Escape))));
        let _ = app.update(AppMsg::Navigate(Route::Runs));
        assert_eq!(app.registry().scope_count(), 2);
    }

    #[test]
    fn tour_target_scrolls_sidebar() {
        let mut app = AppModel::new(Arc::new(NoApi), signed_in_store());
        let _ = app.init();
        // A short terminal leaves room for three nav rows.
        let _ = app.update(AppMsg::Resize { width: 100, height: 7 });
        app.tour = Some(ProductTour::default());
        if let Some(tour) = app.tour.as_mut() {
            tour.start();
            tour.next();
            tour.next();
            tour.next();
        }
        app.reveal_tour_target();
        // Step 4 targets /metrics, NAV index 5.
        assert_eq!(app.sidebar_scroll(), 3);
    }
}
