//! Error taxonomy for remote calls.
//!
//! Every endpoint fails the same way: a non-success status or transport
//! error becomes an [`ApiError`] surfaced inline at the call site. There is
//! no endpoint-specific recovery logic anywhere in the crate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The entity does not exist (HTTP 404). Rendered as "not found" copy,
    /// not as a generic failure.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success HTTP status.
    #[error("request failed with HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection, timeout, or decode failure before a usable response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}
