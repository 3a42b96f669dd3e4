#![forbid(unsafe_code)]

//! Blocking HTTP client for the console backend.
//!
//! Calls are made from background tasks spawned by the program loop, never
//! from `update`, so a blocking client keeps the call sites simple.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Credentials, NewTenant, NewWorkspace, Session, Tenant, User, Workspace, WorkspaceUpdate,
};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Operations the console needs from the backend.
///
/// The app holds this as `Arc<dyn ConsoleApi>` so tests can swap in a fake.
pub trait ConsoleApi: Send + Sync {
    fn login(&self, credentials: &Credentials) -> ApiResult<Session>;
    fn logout(&self) -> ApiResult<()>;
    fn fetch_profile(&self) -> ApiResult<User>;

    fn list_tenants(&self) -> ApiResult<Vec<Tenant>>;
    fn create_tenant(&self, tenant: &NewTenant) -> ApiResult<Tenant>;
    fn delete_tenant(&self, id: &str) -> ApiResult<()>;

    fn create_workspace(&self, workspace: &NewWorkspace) -> ApiResult<Workspace>;
    fn update_workspace(&self, id: &str, update: &WorkspaceUpdate) -> ApiResult<Workspace>;
    fn delete_workspace(&self, id: &str) -> ApiResult<()>;

    /// Replace (or clear) the bearer token used for subsequent calls.
    fn set_token(&self, token: Option<String>);
}

/// [`ConsoleApi`] over `reqwest`.
#[derive(Debug)]
pub struct HttpClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpClient {
    /// Build a client for `base_url` (trailing slashes are ignored).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("evalboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self
            .token
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .as_deref()
        {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, method: &'static str, path: &str, request: RequestBuilder) -> ApiResult<Response> {
        let response = self.authorized(request).send().map_err(|e| {
            tracing::warn!(target: "evalboard.client", method, path, error = %e, "request failed");
            ApiError::from(e)
        })?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(target: "evalboard.client", method, path, status = status.as_u16(), "ok");
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let error = ApiError::from_response(status.as_u16(), &body);
        tracing::warn!(
            target: "evalboard.client",
            method,
            path,
            status = status.as_u16(),
            error = %error,
            "backend rejected request"
        );
        Err(error)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        decode(self.send("GET", path, self.http.get(self.url(path)))?)
    }

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        decode(self.send("POST", path, self.http.post(self.url(path)).json(body))?)
    }

    fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        decode(self.send("PATCH", path, self.http.patch(self.url(path)).json(body))?)
    }

    fn delete(&self, path: &str) -> ApiResult<()> {
        self.send("DELETE", path, self.http.delete(self.url(path)))
            .map(drop)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let bytes = response
        .bytes()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

impl ConsoleApi for HttpClient {
    fn login(&self, credentials: &Credentials) -> ApiResult<Session> {
        let session: Session = self.post("/auth/login", credentials)?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    fn logout(&self) -> ApiResult<()> {
        let result = self
            .send("POST", "/auth/logout", self.http.post(self.url("/auth/logout")))
            .map(drop);
        self.set_token(None);
        result
    }

    fn fetch_profile(&self) -> ApiResult<User> {
        self.get("/auth/me")
    }

    fn list_tenants(&self) -> ApiResult<Vec<Tenant>> {
        self.get("/tenants")
    }

    fn create_tenant(&self, tenant: &NewTenant) -> ApiResult<Tenant> {
        self.post("/tenants", tenant)
    }

    fn delete_tenant(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/tenants/{id}"))
    }

    fn create_workspace(&self, workspace: &NewWorkspace) -> ApiResult<Workspace> {
        self.post(&format!("/tenants/{}/workspaces", workspace.tenant_id), workspace)
    }

    fn update_workspace(&self, id: &str, update: &WorkspaceUpdate) -> ApiResult<Workspace> {
        self.patch(&format!("/workspaces/{id}"), update)
    }

    fn delete_workspace(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/workspaces/{id}"))
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|p| p.into_inner()) = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = HttpClient::new("http://localhost:8080/api/", DEFAULT_TIMEOUT).expect("client");
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/tenants"), "http://localhost:8080/api/tenants");
    }

    #[test]
    fn token_can_be_set_and_cleared() {
        let client = HttpClient::new("http://localhost", DEFAULT_TIMEOUT).expect("client");
        assert!(!client.has_token());
        client.set_token(Some("abc".into()));
        assert!(client.has_token());
        client.set_token(None);
        assert!(!client.has_token());
    }
}
