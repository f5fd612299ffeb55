//! Convenience re-exports for tests.
//!
//! ```rust,ignore
//! use asyncrace_test_helpers::prelude::*;
//! ```

pub use crate::fixtures::{grid, vehicle};
pub use crate::mock::{
    DriveScript, EngineCall, EngineScript, MemoryWinnerStore, ScriptedEngine, StartScript,
};
