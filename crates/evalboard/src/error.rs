#![forbid(unsafe_code)]

//! Startup errors. Once the program loop runs, failures are shown inline
//! instead of aborting.

use evalboard_client::ApiError;
use evalboard_runtime::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("API client error: {0}")]
    Client(#[from] ApiError),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

pub type AppResult<T> = Result<T, AppError>;
