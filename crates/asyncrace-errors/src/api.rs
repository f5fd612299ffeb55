//! Transport-level errors for the REST backend.
//!
//! Every client in `asyncrace-api` maps its failures onto this enum. A 404 is
//! kept as its own variant because several call sites treat it as a normal
//! outcome (first win, cascade delete of a car that never won).

use thiserror::Error;

/// Errors returned by the garage and winners REST clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    #[error("backend returned {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request URL, for log context.
        url: String,
    },

    /// The resource does not exist (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// Request URL.
        url: String,
    },

    /// The request never completed (connection refused, DNS, timeout, ...).
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// Request URL.
        url: String,
        /// Stringified transport error.
        reason: String,
    },

    /// The response body did not match the documented shape.
    #[error("malformed response from {url}: {reason}")]
    Decode {
        /// Request URL.
        url: String,
        /// Stringified decode error.
        reason: String,
    },

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// True when the error is a plain 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Create a status error.
    pub fn status(status: u16, url: impl Into<String>) -> Self {
        let url = url.into();
        if status == 404 {
            ApiError::NotFound { url }
        } else {
            ApiError::Status { status, url }
        }
    }

    /// Create a transport error.
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        ApiError::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a decode error.
    pub fn decode(url: impl Into<String>, reason: impl ToString) -> Self {
        ApiError::Decode {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
