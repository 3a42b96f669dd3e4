#![forbid(unsafe_code)]

use serde::Deserialize;

/// Failure of a backend call.
///
/// `Unauthorized` is the one variant callers escalate (log out, go to the
/// login screen); everything else is shown inline where the call was made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("your session has expired, please sign in again")]
    Unauthorized,
    /// Non-2xx answer. `message` is the server's own text when it sent one.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("could not reach the server: {0}")]
    Transport(String),
    #[error("unexpected response from the server: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    /// Build an error from a non-success status and its body.
    ///
    /// A JSON `message` field is surfaced verbatim; `error` is accepted as a
    /// fallback; anything else gets a generic line naming the status.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        if status == 401 {
            return ApiError::Unauthorized;
        }
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("request failed with status {status}"));
        ApiError::Api { status, message }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Text for an inline error line.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else if error.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            ApiError::Unauthorized
        } else {
            ApiError::Transport(error.to_string())
        }
    }
}
