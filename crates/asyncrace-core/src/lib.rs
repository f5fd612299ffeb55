//! Race orchestration core for Async Race.
//!
//! This crate owns everything between "the user pressed Race" and "a winner
//! record landed in the backend":
//!
//! - [`coordinator`] - drives every vehicle through the
//!   start → animate → drive pipeline as independent tasks, reconciles their
//!   completion into one outcome, and exposes a command interface
//!   (`cancel`, `stop_vehicle`, `reset_positions`) decoupled from rendering
//! - [`session`] - the race-session state machine gating which controls are
//!   enabled; consumers subscribe to snapshots, they never mutate
//! - [`ledger`] - winner-table read-modify-write, always non-fatal to a race
//! - [`registry`] - the cached garage page with CRUD, winner cascade on
//!   delete, and fleet generation
//! - [`timeline`] - the numeric animation contract (travel, duration,
//!   position) a renderer consumes
//! - [`events`] - the broadcast stream a renderer subscribes to
//!
//! # Concurrency model
//!
//! Per-vehicle work items are independently scheduled tokio tasks; steps are
//! strictly ordered within one vehicle and unordered across vehicles - the
//! backend's randomized velocity and ~10% breakdown rate are the race
//! mechanic. Per-vehicle failures are captured as data
//! (`elapsed_ms = f64::INFINITY`), never propagated as task errors, so the
//! aggregation always completes. A race-scoped cancellation channel turns
//! every pending call and wait into a no-op when the session is reset.

pub mod config;
pub mod coordinator;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod session;
pub mod timeline;

pub use config::RaceConfig;
pub use coordinator::{
    LaneResult, NO_FINISHER_BANNER, RaceCoordinator, RaceHandle, RaceMode, RaceOutcome,
    select_winner,
};
pub use events::{EventBus, RaceEvent};
pub use ledger::WinnerLedger;
pub use registry::{FleetReport, VehicleRegistry};
pub use session::{RaceSession, SessionMode, SessionSnapshot};
pub use timeline::PositionBoard;
