//! Centralized error types for the Async Race core.
//!
//! This crate provides a unified error handling system for the whole
//! workspace, keeping the taxonomy of spec'd failure modes in one place:
//!
//! - [`api`]: transport and status errors from the REST backend
//! - [`engine`]: engine start/stop/drive failures (transport only; a drive
//!   breakdown is an expected domain outcome, not an error)
//! - [`ledger`]: winner-table read/write failures (always non-fatal to a race)
//! - [`session`]: race-session transition guard violations
//! - [`validation`]: local input validation, rejected before any network call
//!
//! # Example
//!
//! ```
//! use asyncrace_errors::prelude::*;
//!
//! fn check_name(name: &str) -> Result<()> {
//!     if name.trim().is_empty() {
//!         return Err(ValidationError::EmptyName.into());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod api;
pub mod common;
pub mod engine;
pub mod ledger;
pub mod prelude;
pub mod session;
pub mod validation;

pub use api::ApiError;
pub use common::{AsyncRaceError, ErrorSeverity};
pub use engine::EngineError;
pub use ledger::LedgerError;
pub use session::SessionError;
pub use validation::{MAX_NAME_LEN, ValidationError};

/// A specialized `Result` type for Async Race operations.
pub type Result<T> = std::result::Result<T, AsyncRaceError>;
