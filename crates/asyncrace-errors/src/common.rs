//! Top-level error type and severity classification.

use core::fmt;

use crate::{ApiError, EngineError, LedgerError, SessionError, ValidationError};

/// Top-level error type wrapping every Async Race sub-error.
#[derive(Debug, thiserror::Error)]
pub enum AsyncRaceError {
    /// Backend transport errors.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Engine control errors.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Winner ledger errors.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Session transition guard violations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Local validation rejections.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl AsyncRaceError {
    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Ledger failures never block the announced race outcome.
            AsyncRaceError::Ledger(_) => ErrorSeverity::Warning,
            // Guard violations and validation are user-correctable.
            AsyncRaceError::Session(_) | AsyncRaceError::Validation(_) => ErrorSeverity::Warning,
            AsyncRaceError::Api(_) | AsyncRaceError::Engine(_) => ErrorSeverity::Error,
            AsyncRaceError::Config(_) | AsyncRaceError::Other(_) => ErrorSeverity::Error,
        }
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        AsyncRaceError::Config(msg.into())
    }

    /// Create a generic error with a message.
    pub fn other(msg: impl Into<String>) -> Self {
        AsyncRaceError::Other(msg.into())
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational; expected in normal operation.
    Info,
    /// Degraded but the session continues (ledger failures, guard rejections).
    Warning,
    /// The operation failed.
    Error,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}
