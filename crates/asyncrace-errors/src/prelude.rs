//! Convenience re-exports for error handling.
//!
//! ```
//! use asyncrace_errors::prelude::*;
//! ```

pub use crate::api::ApiError;
pub use crate::common::{AsyncRaceError, ErrorSeverity};
pub use crate::engine::EngineError;
pub use crate::ledger::LedgerError;
pub use crate::session::SessionError;
pub use crate::validation::{MAX_NAME_LEN, ValidationError};
pub use crate::Result;
