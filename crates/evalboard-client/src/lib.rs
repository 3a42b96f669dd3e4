#![forbid(unsafe_code)]

//! Client for the evalboard REST backend: auth, tenants and workspaces.

pub mod client;
pub mod error;
pub mod models;
pub mod token;

pub use client::{ConsoleApi, DEFAULT_TIMEOUT, HttpClient};
pub use error::{ApiError, ApiResult};
pub use models::{
    Credentials, NewTenant, NewWorkspace, Session, Tenant, User, Workspace, WorkspaceUpdate,
};
