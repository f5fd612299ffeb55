//! Mock implementations of the engine and winner-store seams.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use asyncrace_api::{
    DriveOutcome, EngineControl, EngineStart, VehicleId, Winner, WinnerStore, WinnerUpdate,
};
use asyncrace_errors::{ApiError, EngineError};
use parking_lot::Mutex;

/// Scripted behavior for one vehicle's start call.
#[derive(Debug, Clone, Copy)]
pub enum StartScript {
    /// Start succeeds with these physics parameters.
    Go {
        /// Velocity in px/s.
        velocity: f64,
        /// Distance in px.
        distance: f64,
    },
    /// Start fails; the vehicle is withdrawn.
    Unavailable,
    /// The call never resolves; exercises the call ceiling.
    Hang,
}

/// Scripted behavior for one vehicle's drive call.
#[derive(Debug, Clone, Copy)]
pub enum DriveScript {
    /// The vehicle finishes its run.
    Complete,
    /// The documented mid-race breakdown.
    Breakdown,
    /// A transport failure distinct from a breakdown.
    Transport,
    /// The call never resolves; exercises the call ceiling.
    Hang,
}

/// Scripted start + drive behavior for one vehicle.
#[derive(Debug, Clone, Copy)]
pub struct EngineScript {
    /// Start behavior.
    pub start: StartScript,
    /// Drive behavior.
    pub drive: DriveScript,
}

impl Default for EngineScript {
    fn default() -> Self {
        Self {
            start: StartScript::Go {
                velocity: 100.0,
                distance: 600.0,
            },
            drive: DriveScript::Complete,
        }
    }
}

impl EngineScript {
    /// A successful run with the given physics.
    pub fn go(velocity: f64, distance: f64) -> Self {
        Self {
            start: StartScript::Go { velocity, distance },
            ..Self::default()
        }
    }

    /// Set the drive behavior.
    pub fn with_drive(mut self, drive: DriveScript) -> Self {
        self.drive = drive;
        self
    }
}

/// One recorded engine call, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    /// `start(id)` was called.
    Start(VehicleId),
    /// `stop(id)` was called.
    Stop(VehicleId),
    /// `drive(id)` was called.
    Drive(VehicleId),
}

/// [`EngineControl`] with scripted outcomes and call recording.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    scripts: Mutex<BTreeMap<VehicleId, EngineScript>>,
    calls: Mutex<Vec<EngineCall>>,
}

impl ScriptedEngine {
    /// Create an engine where every vehicle uses the default script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a vehicle's behavior.
    pub fn script(&self, id: VehicleId, script: EngineScript) {
        self.scripts.lock().insert(id, script);
    }

    /// Every call recorded so far, in arrival order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// How many times `stop` was called for a vehicle.
    pub fn stops_for(&self, id: VehicleId) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, EngineCall::Stop(called) if *called == id))
            .count()
    }

    fn script_for(&self, id: VehicleId) -> EngineScript {
        self.scripts.lock().get(&id).copied().unwrap_or_default()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl EngineControl for ScriptedEngine {
    async fn start(&self, id: VehicleId) -> Result<EngineStart, EngineError> {
        self.record(EngineCall::Start(id));
        match self.script_for(id).start {
            StartScript::Go { velocity, distance } => Ok(EngineStart {
                velocity,
                distance,
                id: Some(id),
            }),
            StartScript::Unavailable => Err(EngineError::unavailable(id.0, Some(500))),
            StartScript::Hang => std::future::pending().await,
        }
    }

    async fn stop(&self, id: VehicleId) -> Result<(), EngineError> {
        self.record(EngineCall::Stop(id));
        Ok(())
    }

    async fn drive(&self, id: VehicleId) -> Result<DriveOutcome, EngineError> {
        self.record(EngineCall::Drive(id));
        match self.script_for(id).drive {
            DriveScript::Complete => Ok(DriveOutcome::Completed),
            DriveScript::Breakdown => Ok(DriveOutcome::Breakdown),
            DriveScript::Transport => {
                Err(EngineError::transport(id.0, "scripted transport failure"))
            }
            DriveScript::Hang => std::future::pending().await,
        }
    }
}

/// In-memory [`WinnerStore`].
#[derive(Debug, Default)]
pub struct MemoryWinnerStore {
    records: Mutex<BTreeMap<VehicleId, Winner>>,
    fail_writes: AtomicBool,
}

impl MemoryWinnerStore {
    /// All records, ordered by vehicle id.
    pub fn records(&self) -> Vec<Winner> {
        self.records.lock().values().copied().collect()
    }

    /// Make every write fail with a 500 until switched back.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self, url: &str) -> Result<(), ApiError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ApiError::status(500, url));
        }
        Ok(())
    }
}

#[async_trait]
impl WinnerStore for MemoryWinnerStore {
    async fn get(&self, id: VehicleId) -> Result<Option<Winner>, ApiError> {
        Ok(self.records.lock().get(&id).copied())
    }

    async fn create(&self, winner: &Winner) -> Result<Winner, ApiError> {
        self.check_writable("memory:///winners")?;
        self.records.lock().insert(winner.id, *winner);
        Ok(*winner)
    }

    async fn update(&self, id: VehicleId, update: &WinnerUpdate) -> Result<Winner, ApiError> {
        self.check_writable("memory:///winners")?;
        let mut records = self.records.lock();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| ApiError::status(404, format!("memory:///winners/{id}")))?;
        record.wins = update.wins;
        record.time = update.time;
        Ok(*record)
    }

    async fn delete(&self, id: VehicleId) -> Result<(), ApiError> {
        self.records
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::status(404, format!("memory:///winners/{id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_breakdown_is_returned() -> Result<(), EngineError> {
        let engine = ScriptedEngine::new();
        engine.script(
            VehicleId(1),
            EngineScript::go(120.0, 600.0).with_drive(DriveScript::Breakdown),
        );

        let start = engine.start(VehicleId(1)).await?;
        assert!((start.velocity - 120.0).abs() < 1e-9);
        assert_eq!(engine.drive(VehicleId(1)).await?, DriveOutcome::Breakdown);
        assert_eq!(
            engine.calls(),
            vec![EngineCall::Start(VehicleId(1)), EngineCall::Drive(VehicleId(1))]
        );
        Ok(())
    }

    #[tokio::test]
    async fn unscripted_vehicles_use_the_default() -> Result<(), EngineError> {
        let engine = ScriptedEngine::new();
        let start = engine.start(VehicleId(9)).await?;
        assert!((start.distance - 600.0).abs() < 1e-9);
        assert_eq!(engine.drive(VehicleId(9)).await?, DriveOutcome::Completed);
        Ok(())
    }
}
