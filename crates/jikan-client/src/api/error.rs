use reqwest::StatusCode;
use thiserror::Error;

/// Errors from the Jikan API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any request was sent
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("request failed with status {0}")]
    Http(StatusCode),

    #[error("anime not found")]
    NotFound,

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}
