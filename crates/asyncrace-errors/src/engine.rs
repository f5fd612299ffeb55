//! Engine control errors.
//!
//! These cover the transport side of the start/stop/drive contract. A drive
//! breakdown (the backend's documented 500) is *not* represented here; it is
//! a domain outcome the coordinator records, not an error to propagate.

use std::time::Duration;

use thiserror::Error;

/// Errors from the engine control endpoints.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The start call failed; the vehicle is withdrawn from this race.
    /// No retry is attempted.
    #[error("engine unavailable for vehicle {id}{}", status_suffix(.status))]
    Unavailable {
        /// Vehicle id.
        id: u64,
        /// HTTP status, when the backend answered at all.
        status: Option<u16>,
    },

    /// A stop or drive call failed in transport (distinct from a breakdown,
    /// which is the documented 500 on drive).
    #[error("engine call for vehicle {id} failed: {reason}")]
    Transport {
        /// Vehicle id.
        id: u64,
        /// Stringified transport error.
        reason: String,
    },

    /// The call did not resolve within the configured ceiling; treated as a
    /// vehicle failure so the race always terminates.
    #[error("engine call for vehicle {id} exceeded {ceiling:?}")]
    Timeout {
        /// Vehicle id.
        id: u64,
        /// The ceiling that elapsed.
        ceiling: Duration,
    },

    /// The response body did not match the documented shape.
    #[error("malformed engine response for vehicle {id}: {reason}")]
    MalformedResponse {
        /// Vehicle id.
        id: u64,
        /// Stringified decode error.
        reason: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

impl EngineError {
    /// Create an unavailable error from an HTTP status.
    pub fn unavailable(id: u64, status: Option<u16>) -> Self {
        EngineError::Unavailable { id, status }
    }

    /// Create a transport error.
    pub fn transport(id: u64, reason: impl ToString) -> Self {
        EngineError::Transport {
            id,
            reason: reason.to_string(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(id: u64, ceiling: Duration) -> Self {
        EngineError::Timeout { id, ceiling }
    }
}
