//! Winner ledger errors.
//!
//! Ledger failures are always non-fatal to a race: the winner announcement
//! proceeds whether or not the record landed. Callers log these at warning
//! level and move on.

use thiserror::Error;

use crate::ApiError;

/// Errors from the winner-table read-modify-write cycle.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Reading the existing record failed with something other than 404
    /// (404 is the expected first-win path, not an error).
    #[error("failed to read winner record {id}: {source}")]
    Read {
        /// Vehicle id.
        id: u64,
        /// Underlying transport error.
        #[source]
        source: ApiError,
    },

    /// Creating or updating the record failed.
    #[error("failed to write winner record {id}: {source}")]
    Write {
        /// Vehicle id.
        id: u64,
        /// Underlying transport error.
        #[source]
        source: ApiError,
    },

    /// Deleting the record failed with something other than 404.
    #[error("failed to delete winner record {id}: {source}")]
    Delete {
        /// Vehicle id.
        id: u64,
        /// Underlying transport error.
        #[source]
        source: ApiError,
    },
}
