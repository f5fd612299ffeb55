//! Shared test utilities for Async Race.
//!
//! The backend's randomized velocities and ~10% drive-failure rate make it
//! useless as a test dependency, so tests inject:
//!
//! - [`ScriptedEngine`] - an [`asyncrace_api::EngineControl`] with scripted
//!   velocity/outcome sequences and call recording
//! - [`MemoryWinnerStore`] - an in-memory [`asyncrace_api::WinnerStore`]
//! - [`fixtures`] - vehicle and grid builders

pub mod fixtures;
pub mod mock;
pub mod prelude;

pub use fixtures::{grid, vehicle};
pub use mock::{DriveScript, EngineCall, EngineScript, MemoryWinnerStore, ScriptedEngine, StartScript};
