use thiserror::Error;

use crate::application::error::ApplicationError;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream rejected the request: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UpstreamError> for ApplicationError {
    fn from(error: UpstreamError) -> Self {
        match error {
            UpstreamError::Rejected(msg) | UpstreamError::NetworkError(msg) => {
                ApplicationError::ActionFailed(msg)
            }
            UpstreamError::InternalError(msg) => ApplicationError::InternalError(msg),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            UpstreamError::NetworkError("Request timeout".to_string())
        } else if error.is_connect() {
            UpstreamError::NetworkError(format!("Connection failed: {}", error))
        } else if let Some(status) = error.status() {
            UpstreamError::Rejected(format!("Upstream returned {}", status))
        } else {
            UpstreamError::InternalError(error.to_string())
        }
    }
}
