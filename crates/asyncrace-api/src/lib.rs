//! REST clients for the Async Race mock backend.
//!
//! The backend exposes three resource families, each wrapped by one client:
//!
//! - [`GarageClient`] - vehicle CRUD with pagination (`/garage`)
//! - [`HttpEngineClient`] - engine start/stop/drive simulation (`/engine`)
//! - [`HttpWinnersClient`] - the winners table (`/winners`)
//!
//! The engine and winners clients sit behind the [`EngineControl`] and
//! [`WinnerStore`] traits so the race coordinator can be driven by scripted
//! fakes in tests; the backend's randomized velocities and ~10% drive
//! breakdown rate are useless as a test dependency.
//!
//! All clients are cheap to clone and hold no mutable state; every call is a
//! single request/response exchange.

pub mod config;
pub mod engine;
pub mod garage;
pub mod types;
pub mod winners;

pub use config::ApiConfig;
pub use engine::{EngineControl, HttpEngineClient};
pub use garage::GarageClient;
pub use types::{
    DriveOutcome, EngineStart, NewVehicle, Page, SortKey, SortOrder, Vehicle, VehicleId,
    VehicleUpdate, Winner, WinnerUpdate, WinnersQuery, validate_color, validate_name,
};
pub use winners::{HttpWinnersClient, WinnerStore};
