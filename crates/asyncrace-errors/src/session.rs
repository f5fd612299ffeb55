//! Race-session transition guard errors.

use thiserror::Error;

/// Violations of the session state machine's transition guards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A race or single-car run is already in flight; at most one session
    /// may be active at a time.
    #[error("a race is already in progress")]
    AlreadyRacing,

    /// A full race was requested with no vehicles on the page.
    #[error("cannot start a race with an empty grid")]
    EmptyGrid,

    /// The vehicle set is locked while a race is running; CRUD operations
    /// are rejected until the session returns to idle.
    #[error("vehicles cannot be modified while a race is running")]
    GarageLocked,
}
