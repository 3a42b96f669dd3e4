#![forbid(unsafe_code)]

//! Tenant and workspace onboarding.
//!
//! `CreateTenant → ManageTenants → CreateWorkspace`
//!
//! A first run starts at `CreateTenant`. Once tenant onboarding has been
//! completed the wizard is opened with [`TenantWizard::resume`] instead,
//! which starts at the tenant list and treats it as the entry step.
//!
//! The wizard never talks to the network itself. Submitting produces a
//! [`TenantRequest`] stamped with a fresh [`RequestToken`]; the owner runs it
//! and feeds the outcome back through [`TenantWizard::handle_response`].
//! Only the response carrying the token currently in flight is applied, so a
//! late answer to an abandoned request cannot overwrite newer state.
//!
//! Failures keep every field as typed and stay on the same step. The one
//! exception is [`ApiError::Unauthorized`], which is handed back up as
//! [`TenantWizardEvent::Unauthorized`].

use evalboard_client::{ApiError, ApiResult, NewTenant, NewWorkspace, Tenant, Workspace};
use evalboard_core::event::{Event, KeyCode};
use evalboard_core::geometry::{Rect, Sides, Size};
use evalboard_runtime::render::Frame;
use tracing::{debug, info, warn};

use crate::slug::SlugField;
use crate::text_input::TextInput;
use crate::{Widget, render_hints, theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TenantStep {
    CreateTenant,
    ManageTenants,
    CreateWorkspace,
}

impl TenantStep {
    pub const ALL: [TenantStep; 3] = [
        TenantStep::CreateTenant,
        TenantStep::ManageTenants,
        TenantStep::CreateWorkspace,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            TenantStep::CreateTenant => "Create tenant",
            TenantStep::ManageTenants => "Review tenants",
            TenantStep::CreateWorkspace => "Create workspace",
        }
    }
}

/// Identifies one submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantRequestKind {
    ListTenants,
    CreateTenant(NewTenant),
    DeleteTenant { id: String },
    CreateWorkspace(NewWorkspace),
}

impl TenantRequestKind {
    pub const fn name(&self) -> &'static str {
        match self {
            TenantRequestKind::ListTenants => "tenants.list",
            TenantRequestKind::CreateTenant(_) => "tenants.create",
            TenantRequestKind::DeleteTenant { .. } => "tenants.delete",
            TenantRequestKind::CreateWorkspace(_) => "workspaces.create",
        }
    }
}

/// A call the owner should make on the wizard's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRequest {
    pub token: RequestToken,
    pub kind: TenantRequestKind,
}

/// Outcome of a [`TenantRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantResponse {
    Listed(ApiResult<Vec<Tenant>>),
    TenantCreated(ApiResult<Tenant>),
    TenantDeleted { id: String, result: ApiResult<()> },
    WorkspaceCreated(ApiResult<Workspace>),
}

impl TenantResponse {
    fn error(&self) -> Option<&ApiError> {
        match self {
            TenantResponse::Listed(r) => r.as_ref().err(),
            TenantResponse::TenantCreated(r) => r.as_ref().err(),
            TenantResponse::TenantDeleted { result, .. } => result.as_ref().err(),
            TenantResponse::WorkspaceCreated(r) => r.as_ref().err(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantWizardEvent {
    Request(TenantRequest),
    StepChanged { from: TenantStep, to: TenantStep },
    Completed { tenant: Tenant, workspace: Workspace },
    /// A call came back 401.
    Unauthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Slug,
    Description,
}

#[derive(Debug, Clone)]
pub struct TenantWizard {
    step: TenantStep,
    entry: TenantStep,
    focus: Field,

    tenant_name: TextInput,
    tenant_slug: SlugField,
    tenants: Vec<Tenant>,
    selected: usize,

    workspace_name: TextInput,
    workspace_slug: SlugField,
    workspace_description: TextInput,

    error: Option<String>,
    in_flight: Option<RequestToken>,
    next_token: u64,
    completed: bool,
}

impl Default for TenantWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl TenantWizard {
    pub fn new() -> Self {
        let mut wizard = Self {
            step: TenantStep::CreateTenant,
            entry: TenantStep::CreateTenant,
            focus: Field::Name,
            tenant_name: TextInput::new().with_placeholder("Acme Corp"),
            tenant_slug: SlugField::new(),
            tenants: Vec::new(),
            selected: 0,
            workspace_name: TextInput::new().with_placeholder("Production"),
            workspace_slug: SlugField::new(),
            workspace_description: TextInput::new().with_placeholder("optional"),
            error: None,
            in_flight: None,
            next_token: 0,
            completed: false,
        };
        wizard.sync_focus();
        wizard
    }

    /// Reopen for a user who already finished tenant onboarding.
    pub fn resume() -> Self {
        let mut wizard = Self::new();
        wizard.step = TenantStep::ManageTenants;
        wizard.entry = TenantStep::ManageTenants;
        wizard.sync_focus();
        wizard
    }

    /// Request the existing tenant list. Call once when the wizard mounts.
    pub fn start(&mut self) -> TenantRequest {
        self.issue(TenantRequestKind::ListTenants)
    }

    // --- Accessors ---

    pub fn step(&self) -> TenantStep {
        self.step
    }

    pub fn tenants(&self) -> &[Tenant] {
        &self.tenants
    }

    pub fn selected_tenant(&self) -> Option<&Tenant> {
        self.tenants.get(self.selected)
    }

    pub fn tenant_name(&self) -> &str {
        self.tenant_name.value()
    }

    pub fn tenant_slug(&self) -> &str {
        self.tenant_slug.value()
    }

    pub fn workspace_name(&self) -> &str {
        self.workspace_name.value()
    }

    pub fn workspace_slug(&self) -> &str {
        self.workspace_slug.value()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// On the step the wizard opened at, with nothing in flight. Going back
    /// from here leaves the wizard.
    pub fn at_entry(&self) -> bool {
        self.step == self.entry && self.in_flight.is_none()
    }

    /// Form steps own the keyboard.
    pub fn is_editing(&self) -> bool {
        matches!(
            self.step,
            TenantStep::CreateTenant | TenantStep::CreateWorkspace
        )
    }

    /// Whether the current step's continue action is enabled.
    pub fn can_continue(&self) -> bool {
        if self.in_flight.is_some() || self.completed {
            return false;
        }
        match self.step {
            TenantStep::CreateTenant => {
                !self.tenant_name.is_empty() && !self.tenant_slug.value().is_empty()
            }
            TenantStep::ManageTenants => self.selected_tenant().is_some(),
            TenantStep::CreateWorkspace => {
                self.selected_tenant().is_some()
                    && !self.workspace_name.is_empty()
                    && !self.workspace_slug.value().is_empty()
            }
        }
    }

    // --- Input ---

    pub fn handle_event(&mut self, event: &Event) -> Option<TenantWizardEvent> {
        if self.completed {
            return None;
        }
        if let Event::Key(key) = event {
            if !key.is_activation() {
                return None;
            }
            match key.code {
                KeyCode::Enter => return self.submit(),
                KeyCode::Escape => return self.back(),
                KeyCode::Tab if self.is_editing() => {
                    self.cycle_focus(true);
                    return None;
                }
                KeyCode::BackTab if self.is_editing() => {
                    self.cycle_focus(false);
                    return None;
                }
                _ => {}
            }
            if self.step == TenantStep::ManageTenants {
                return self.handle_list_key(key.code);
            }
        }
        self.edit_field(event);
        None
    }

    fn handle_list_key(&mut self, code: KeyCode) -> Option<TenantWizardEvent> {
        let len = self.tenants.len();
        match code {
            KeyCode::Up | KeyCode::Char('k') if len > 0 => {
                self.selected = (self.selected + len - 1) % len;
                None
            }
            KeyCode::Down | KeyCode::Char('j') if len > 0 => {
                self.selected = (self.selected + 1) % len;
                None
            }
            KeyCode::Char('a') => Some(self.go_to(TenantStep::CreateTenant)),
            KeyCode::Char('d') | KeyCode::Delete => {
                if self.in_flight.is_some() {
                    return None;
                }
                let id = self.selected_tenant()?.id.clone();
                Some(TenantWizardEvent::Request(
                    self.issue(TenantRequestKind::DeleteTenant { id }),
                ))
            }
            _ => None,
        }
    }

    fn edit_field(&mut self, event: &Event) {
        let changed = match (self.step, self.focus) {
            (TenantStep::CreateTenant, Field::Name) => {
                let changed = self.tenant_name.handle_event(event);
                if changed {
                    self.tenant_slug.name_changed(self.tenant_name.value());
                }
                changed
            }
            (TenantStep::CreateTenant, _) => self.tenant_slug.handle_event(event),
            (TenantStep::CreateWorkspace, Field::Name) => {
                let changed = self.workspace_name.handle_event(event);
                if changed {
                    self.workspace_slug.name_changed(self.workspace_name.value());
                }
                changed
            }
            (TenantStep::CreateWorkspace, Field::Slug) => self.workspace_slug.handle_event(event),
            (TenantStep::CreateWorkspace, Field::Description) => {
                self.workspace_description.handle_event(event)
            }
            (TenantStep::ManageTenants, _) => false,
        };
        if changed {
            self.error = None;
        }
    }

    fn fields(&self) -> &'static [Field] {
        match self.step {
            TenantStep::CreateTenant => &[Field::Name, Field::Slug],
            TenantStep::CreateWorkspace => &[Field::Name, Field::Slug, Field::Description],
            TenantStep::ManageTenants => &[],
        }
    }

    fn cycle_focus(&mut self, forward: bool) {
        let fields = self.fields();
        if fields.is_empty() {
            return;
        }
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (pos + 1) % fields.len()
        } else {
            (pos + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
        self.sync_focus();
    }

    fn sync_focus(&mut self) {
        let on = |step: TenantStep, field: Field| self.step == step && self.focus == field;
        let tenant_name = on(TenantStep::CreateTenant, Field::Name);
        let tenant_slug = on(TenantStep::CreateTenant, Field::Slug);
        let ws_name = on(TenantStep::CreateWorkspace, Field::Name);
        let ws_slug = on(TenantStep::CreateWorkspace, Field::Slug);
        let ws_desc = on(TenantStep::CreateWorkspace, Field::Description);
        self.tenant_name.set_focused(tenant_name);
        self.tenant_slug.set_focused(tenant_slug);
        self.workspace_name.set_focused(ws_name);
        self.workspace_slug.set_focused(ws_slug);
        self.workspace_description.set_focused(ws_desc);
    }

    // --- Transitions ---

    /// Continue from the current step.
    pub fn submit(&mut self) -> Option<TenantWizardEvent> {
        if self.completed || self.in_flight.is_some() {
            return None;
        }
        match self.step {
            TenantStep::CreateTenant => {
                if !self.can_continue() {
                    return self.reject("Enter a tenant name and slug.");
                }
                let tenant = NewTenant {
                    name: self.tenant_name.value().trim().to_string(),
                    slug: self.tenant_slug.value().to_string(),
                };
                Some(TenantWizardEvent::Request(
                    self.issue(TenantRequestKind::CreateTenant(tenant)),
                ))
            }
            TenantStep::ManageTenants => {
                if self.selected_tenant().is_none() {
                    return self.reject("Create or select a tenant first.");
                }
                Some(self.go_to(TenantStep::CreateWorkspace))
            }
            TenantStep::CreateWorkspace => {
                if !self.can_continue() {
                    return self.reject("Enter a workspace name and slug.");
                }
                let tenant_id = self.selected_tenant()?.id.clone();
                let description = self.workspace_description.value().trim();
                let workspace = NewWorkspace {
                    tenant_id,
                    name: self.workspace_name.value().trim().to_string(),
                    slug: self.workspace_slug.value().to_string(),
                    description: (!description.is_empty()).then(|| description.to_string()),
                };
                Some(TenantWizardEvent::Request(
                    self.issue(TenantRequestKind::CreateWorkspace(workspace)),
                ))
            }
        }
    }

    /// Step back. From the first step this only works once tenants exist.
    pub fn back(&mut self) -> Option<TenantWizardEvent> {
        if self.completed {
            return None;
        }
        match self.step {
            TenantStep::CreateTenant if !self.tenants.is_empty() => {
                Some(self.go_to(TenantStep::ManageTenants))
            }
            TenantStep::CreateTenant => None,
            TenantStep::ManageTenants if self.entry == TenantStep::ManageTenants => None,
            TenantStep::ManageTenants => Some(self.go_to(TenantStep::CreateTenant)),
            TenantStep::CreateWorkspace => Some(self.go_to(TenantStep::ManageTenants)),
        }
    }

    /// Apply the outcome of a request. Responses for any token other than
    /// the one in flight are dropped.
    pub fn handle_response(
        &mut self,
        token: RequestToken,
        response: TenantResponse,
    ) -> Option<TenantWizardEvent> {
        if self.in_flight != Some(token) {
            debug!(target: "evalboard.onboarding", ?token, "stale response ignored");
            return None;
        }
        self.in_flight = None;

        if let Some(error) = response.error() {
            if error.is_unauthorized() {
                warn!(target: "evalboard.onboarding", "session rejected during tenant setup");
                return Some(TenantWizardEvent::Unauthorized);
            }
            warn!(target: "evalboard.onboarding", %error, "tenant request failed");
            self.error = Some(error.user_message());
            return None;
        }

        match response {
            TenantResponse::Listed(Ok(tenants)) => {
                let known = tenants.len();
                for tenant in tenants {
                    if !self.tenants.iter().any(|t| t.id == tenant.id) {
                        self.tenants.push(tenant);
                    }
                }
                debug!(target: "evalboard.onboarding", known, "tenants loaded");
                None
            }
            TenantResponse::TenantCreated(Ok(tenant)) => {
                info!(target: "evalboard.onboarding", slug = %tenant.slug, "tenant created");
                self.tenants.push(tenant);
                self.selected = self.tenants.len() - 1;
                self.tenant_name.clear();
                self.tenant_slug.reset();
                Some(self.go_to(TenantStep::ManageTenants))
            }
            TenantResponse::TenantDeleted { id, result: Ok(()) } => {
                info!(target: "evalboard.onboarding", %id, "tenant deleted");
                self.tenants.retain(|t| t.id != id);
                self.selected = self.selected.min(self.tenants.len().saturating_sub(1));
                None
            }
            TenantResponse::WorkspaceCreated(Ok(workspace)) => {
                let tenant = self
                    .tenants
                    .iter()
                    .find(|t| t.id == workspace.tenant_id)
                    .or_else(|| self.selected_tenant())
                    .cloned()?;
                info!(
                    target: "evalboard.onboarding",
                    tenant = %tenant.slug,
                    workspace = %workspace.slug,
                    "tenant onboarding completed"
                );
                self.completed = true;
                Some(TenantWizardEvent::Completed { tenant, workspace })
            }
            // Errors were handled above.
            _ => None,
        }
    }

    fn issue(&mut self, kind: TenantRequestKind) -> TenantRequest {
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.in_flight = Some(token);
        self.error = None;
        debug!(target: "evalboard.onboarding", ?token, request = kind.name(), "request issued");
        TenantRequest { token, kind }
    }

    fn go_to(&mut self, to: TenantStep) -> TenantWizardEvent {
        let from = self.step;
        self.step = to;
        self.focus = Field::Name;
        self.error = None;
        self.sync_focus();
        TenantWizardEvent::StepChanged { from, to }
    }

    fn reject(&mut self, message: &str) -> Option<TenantWizardEvent> {
        self.error = Some(message.to_string());
        None
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_field(
    frame: &mut Frame,
    area: Rect,
    row: u16,
    label: &str,
    input: &TextInput,
    focused: bool,
) {
    let Some(line) = area.row(row) else { return };
    let label_style = if focused {
        theme::ACCENT
    } else {
        theme::MUTED
    };
    frame.print(line.x, line.y, label, label_style, line.right());
    let x = line.x + 14;
    let field = Rect::new(x, line.y, line.right().saturating_sub(x), 1);
    input.render(field, frame);
    if focused {
        frame.restyle(field, theme::FOCUS_BORDER.underline());
    }
}

impl Widget for TenantWizard {
    fn render(&self, area: Rect, frame: &mut Frame) {
        let modal = area.centered(Size::new(
            area.width.saturating_sub(4).min(72),
            area.height.saturating_sub(2).min(18),
        ));
        frame.fill(modal, theme::BASE);
        frame.draw_box(modal, theme::FOCUS_BORDER, Some("Set up your organization"));

        let inner = modal.inner(Sides::new(1, 2, 1, 2));
        let (header, rest) = inner.split_top(2);
        let (body, footer) = rest.split_bottom(2);

        let mut x = header.x;
        for (i, step) in TenantStep::ALL.iter().enumerate() {
            if i > 0 {
                x = frame.print(x, header.y, "  ›  ", theme::MUTED, header.right());
            }
            let style = if *step == self.step {
                theme::ACCENT
            } else {
                theme::MUTED
            };
            x = frame.print(x, header.y, &format!("{} {}", i + 1, step.title()), style, header.right());
        }

        match self.step {
            TenantStep::CreateTenant => {
                render_field(frame, body, 0, "Tenant name", &self.tenant_name, self.focus == Field::Name);
                render_field(frame, body, 2, "Slug", self.tenant_slug.input(), self.focus == Field::Slug);
            }
            TenantStep::ManageTenants => {
                if self.tenants.is_empty() {
                    frame.print_in(body, "No tenants yet. Press a to add one.", theme::MUTED);
                }
                for (i, tenant) in self.tenants.iter().enumerate() {
                    let Some(row) = body.row(i as u16) else { break };
                    let style = if i == self.selected {
                        theme::SELECTED
                    } else {
                        theme::BASE
                    };
                    frame.fill(row, style);
                    let x = frame.print_in(row, &tenant.name, style.bold());
                    frame.print(x + 2, row.y, &tenant.slug, style.patch(theme::MUTED), row.right());
                }
            }
            TenantStep::CreateWorkspace => {
                if let Some(tenant) = self.selected_tenant()
                    && let Some(row) = body.row(0)
                {
                    let x = frame.print_in(row, "Tenant        ", theme::MUTED);
                    frame.print(x, row.y, &tenant.name, theme::BASE.bold(), row.right());
                }
                render_field(frame, body, 2, "Workspace", &self.workspace_name, self.focus == Field::Name);
                render_field(frame, body, 4, "Slug", self.workspace_slug.input(), self.focus == Field::Slug);
                render_field(
                    frame,
                    body,
                    6,
                    "Description",
                    &self.workspace_description,
                    self.focus == Field::Description,
                );
            }
        }

        let (status_row, hints_row) = footer.split_top(1);
        if let Some(error) = &self.error {
            frame.print_in(status_row, error, theme::ERROR);
        } else if self.in_flight.is_some() {
            frame.print_in(status_row, "Saving…", theme::MUTED);
        }

        let enter = if self.can_continue() {
            ("Enter", "continue")
        } else {
            ("Enter", "(disabled)")
        };
        let hints: Vec<(&str, &str)> = match self.step {
            TenantStep::CreateTenant if self.tenants.is_empty() => vec![("Tab", "next field"), enter],
            TenantStep::CreateTenant => vec![("Tab", "next field"), enter, ("Esc", "tenant list")],
            TenantStep::ManageTenants => vec![("↑↓", "select"), ("a", "add"), ("d", "delete"), enter],
            TenantStep::CreateWorkspace => vec![("Tab", "next field"), enter, ("Esc", "back")],
        };
        render_hints(frame, hints_row, &hints);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::event::KeyEvent;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    fn type_str(wizard: &mut TenantWizard, text: &str) {
        for c in text.chars() {
            wizard.handle_event(&Event::Key(KeyEvent::char(c)));
        }
    }

    fn tenant(id: &str, name: &str, slug: &str) -> Tenant {
        Tenant {
            id: id.into(),
            name: name.into(),
            slug: slug.into(),
            created_at: None,
        }
    }

    fn request(event: Option<TenantWizardEvent>) -> TenantRequest {
        match event {
            Some(TenantWizardEvent::Request(request)) => request,
            other => panic!("expected request, got {other:?}"),
        }
    }

    fn with_tenant() -> TenantWizard {
        let mut wizard = TenantWizard::new();
        type_str(&mut wizard, "Acme Corp");
        let req = request(wizard.handle_event(&key(KeyCode::Enter)));
        wizard.handle_response(
            req.token,
            TenantResponse::TenantCreated(Ok(tenant("t1", "Acme Corp", "acme-corp"))),
        );
        wizard
    }

    #[test]
    fn slug_follows_name() {
        let mut wizard = TenantWizard::new();
        type_str(&mut wizard, "Acme Corp");
        assert_eq!(wizard.tenant_slug(), "acme-corp");
    }

    #[test]
    fn manual_slug_edit_stops_derivation() {
        let mut wizard = TenantWizard::new();
        type_str(&mut wizard, "Acme");
        wizard.handle_event(&key(KeyCode::Tab));
        type_str(&mut wizard, "-inc");
        assert_eq!(wizard.tenant_slug(), "acme-inc");
        wizard.handle_event(&key(KeyCode::BackTab));
        type_str(&mut wizard, " Corp");
        assert_eq!(wizard.tenant_name(), "Acme Corp");
        assert_eq!(wizard.tenant_slug(), "acme-inc");
    }

    #[test]
    fn resumed_wizard_opens_at_tenant_list() {
        let mut wizard = TenantWizard::resume();
        assert_eq!(wizard.step(), TenantStep::ManageTenants);
        assert!(wizard.at_entry());
        assert!(!wizard.is_editing());

        let list = wizard.start();
        assert!(!wizard.at_entry());
        wizard.handle_response(
            list.token,
            TenantResponse::Listed(Ok(vec![tenant("t0", "Existing", "existing")])),
        );
        assert!(wizard.at_entry());
        assert_eq!(wizard.selected_tenant().map(|t| t.id.as_str()), Some("t0"));

        // Escape from the entry step is left to the owner.
        assert_eq!(wizard.handle_event(&key(KeyCode::Escape)), None);
        assert_eq!(wizard.step(), TenantStep::ManageTenants);

        // Adding a tenant and backing out returns to the list.
        wizard.handle_event(&key(KeyCode::Char('a')));
        assert_eq!(wizard.step(), TenantStep::CreateTenant);
        wizard.handle_event(&key(KeyCode::Escape));
        assert_eq!(wizard.step(), TenantStep::ManageTenants);
    }

    #[test]
    fn empty_form_is_rejected_without_request() {
        let mut wizard = TenantWizard::new();
        assert!(!wizard.can_continue());
        assert_eq!(wizard.handle_event(&key(KeyCode::Enter)), None);
        assert!(wizard.error().is_some());
        assert!(!wizard.is_submitting());
    }

    #[test]
    fn create_tenant_issues_request_and_blocks_resubmit() {
        let mut wizard = TenantWizard::new();
        type_str(&mut wizard, "Acme Corp");
        let req = request(wizard.handle_event(&key(KeyCode::Enter)));
        assert_eq!(
            req.kind,
            TenantRequestKind::CreateTenant(NewTenant {
                name: "Acme Corp".into(),
                slug: "acme-corp".into()
            })
        );
        assert!(wizard.is_submitting());
        assert!(!wizard.can_continue());
        assert_eq!(wizard.handle_event(&key(KeyCode::Enter)), None);
    }

    #[test]
    fn created_tenant_advances_and_is_selected() {
        let wizard = with_tenant();
        assert_eq!(wizard.step(), TenantStep::ManageTenants);
        assert_eq!(wizard.selected_tenant().map(|t| t.id.as_str()), Some("t1"));
        assert_eq!(wizard.tenant_name(), "");
        assert!(!wizard.is_editing());
    }

    #[test]
    fn network_error_keeps_form_and_step() {
        let mut wizard = TenantWizard::new();
        type_str(&mut wizard, "Acme Corp");
        let req = request(wizard.handle_event(&key(KeyCode::Enter)));
        let event = wizard.handle_response(
            req.token,
            TenantResponse::TenantCreated(Err(ApiError::Api {
                status: 409,
                message: "Slug already in use".into(),
            })),
        );
        assert_eq!(event, None);
        assert_eq!(wizard.error(), Some("Slug already in use"));
        assert_eq!(wizard.step(), TenantStep::CreateTenant);
        assert_eq!(wizard.tenant_name(), "Acme Corp");
        assert_eq!(wizard.tenant_slug(), "acme-corp");
        assert!(wizard.can_continue());
    }

    #[test]
    fn unauthorized_is_escalated() {
        let mut wizard = TenantWizard::new();
        type_str(&mut wizard, "Acme");
        let req = request(wizard.handle_event(&key(KeyCode::Enter)));
        assert_eq!(
            wizard.handle_response(req.token, TenantResponse::TenantCreated(Err(ApiError::Unauthorized))),
            Some(TenantWizardEvent::Unauthorized)
        );
    }

    #[test]
    fn stale_response_is_ignored() {
        let mut wizard = TenantWizard::new();
        let list = wizard.start();
        type_str(&mut wizard, "Acme");
        // Submitting is blocked while the list request is pending.
        assert_eq!(wizard.handle_event(&key(KeyCode::Enter)), None);
        wizard.handle_response(list.token, TenantResponse::Listed(Ok(vec![])));

        let create = request(wizard.handle_event(&key(KeyCode::Enter)));
        assert_ne!(create.token, list.token);
        assert_eq!(
            wizard.handle_response(
                list.token,
                TenantResponse::Listed(Ok(vec![tenant("old", "Old", "old")]))
            ),
            None
        );
        assert!(wizard.tenants().is_empty());
        assert!(wizard.is_submitting());
    }

    #[test]
    fn listed_tenants_allow_skipping_to_review() {
        let mut wizard = TenantWizard::new();
        let list = wizard.start();
        wizard.handle_response(
            list.token,
            TenantResponse::Listed(Ok(vec![tenant("t0", "Existing", "existing")])),
        );
        assert_eq!(
            wizard.handle_event(&key(KeyCode::Escape)),
            Some(TenantWizardEvent::StepChanged {
                from: TenantStep::CreateTenant,
                to: TenantStep::ManageTenants
            })
        );
        assert!(wizard.can_continue());
    }

    #[test]
    fn delete_is_reflected_immediately_on_success() {
        let mut wizard = with_tenant();
        let req = request(wizard.handle_event(&Event::Key(KeyEvent::char('d'))));
        assert_eq!(req.kind, TenantRequestKind::DeleteTenant { id: "t1".into() });
        wizard.handle_response(
            req.token,
            TenantResponse::TenantDeleted {
                id: "t1".into(),
                result: Ok(()),
            },
        );
        assert!(wizard.tenants().is_empty());
        assert!(!wizard.can_continue());
        assert_eq!(wizard.handle_event(&key(KeyCode::Enter)), None);
        assert!(wizard.error().is_some());
    }

    #[test]
    fn full_flow_completes_with_workspace() {
        let mut wizard = with_tenant();
        assert_eq!(
            wizard.handle_event(&key(KeyCode::Enter)),
            Some(TenantWizardEvent::StepChanged {
                from: TenantStep::ManageTenants,
                to: TenantStep::CreateWorkspace
            })
        );
        assert!(!wizard.can_continue());
        type_str(&mut wizard, "Prod Agents");
        assert_eq!(wizard.workspace_slug(), "prod-agents");
        let req = request(wizard.handle_event(&key(KeyCode::Enter)));
        let TenantRequestKind::CreateWorkspace(new) = &req.kind else {
            panic!("expected workspace request");
        };
        assert_eq!(new.tenant_id, "t1");
        assert_eq!(new.description, None);

        let workspace = Workspace {
            id: "w1".into(),
            tenant_id: "t1".into(),
            name: "Prod Agents".into(),
            slug: "prod-agents".into(),
            description: None,
        };
        let event = wizard.handle_response(req.token, TenantResponse::WorkspaceCreated(Ok(workspace.clone())));
        assert_eq!(
            event,
            Some(TenantWizardEvent::Completed {
                tenant: tenant("t1", "Acme Corp", "acme-corp"),
                workspace
            })
        );
        assert!(wizard.is_completed());
        assert_eq!(wizard.handle_event(&key(KeyCode::Enter)), None);
    }

    #[test]
    fn renders_error_inline() {
        let mut wizard = TenantWizard::new();
        wizard.handle_event(&key(KeyCode::Enter));
        let mut frame = Frame::new(90, 24);
        wizard.render(frame.area(), &mut frame);
        assert!(frame.buffer.contains_text("Enter a tenant name and slug."));
        assert!(frame.buffer.contains_text("1 Create tenant"));
    }
}
