#![forbid(unsafe_code)]

//! evalboard: a terminal console for AI agent evaluations.
//!
//! The binary wires these modules together; the library form exists so the
//! model can be driven headlessly from tests.

pub mod app;
pub mod chrome;
pub mod cli;
pub mod error;
pub mod logging;
pub mod pages;
pub mod palette_items;
pub mod routes;
pub mod session;

pub use app::{AppModel, AppMsg};
pub use error::{AppError, AppResult};
pub use routes::Route;
