//! Race coordinator: start → animate → drive, concurrently per vehicle.
//!
//! Each vehicle runs as an independently spawned task; the failure of one
//! never aborts another. Every failure mode - start refusal, breakdown,
//! transport error, timeout, user stop, cancellation - is captured as
//! `elapsed_ms = f64::INFINITY` so the aggregation always completes and a
//! winner can be selected by plain minimum.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use asyncrace_api::{DriveOutcome, EngineControl, Vehicle, VehicleId};
use asyncrace_errors::AsyncRaceError;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until, timeout};
use tracing::{debug, error, info, warn};

use crate::config::RaceConfig;
use crate::events::{EventBus, RaceEvent};
use crate::ledger::WinnerLedger;
use crate::session::RaceSession;
use crate::timeline::PositionBoard;

/// Banner shown when every lane failed.
pub const NO_FINISHER_BANNER: &str = "No car finished the race";

/// Which protocol variant a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceMode {
    /// Race the whole grid; the winner gets a banner and a ledger record.
    FullGrid,
    /// Run one car. Completion returns the session to idle; whether the run
    /// counts as a recorded win is a [`RaceConfig`] policy.
    SingleCar,
}

/// Per-vehicle race outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneResult {
    /// Vehicle id.
    pub id: VehicleId,
    /// Elapsed time in milliseconds; `f64::INFINITY` for any failure.
    pub elapsed_ms: f64,
}

impl LaneResult {
    fn finished(id: VehicleId, elapsed_ms: f64) -> Self {
        Self { id, elapsed_ms }
    }

    fn failed(id: VehicleId) -> Self {
        Self {
            id,
            elapsed_ms: f64::INFINITY,
        }
    }

    /// True when the vehicle completed its run.
    pub fn is_finished(&self) -> bool {
        self.elapsed_ms.is_finite()
    }
}

/// Aggregated result of a race.
#[derive(Debug, Clone)]
pub struct RaceOutcome {
    /// Session generation of this run.
    pub generation: u64,
    /// Per-vehicle results, in grid order.
    pub results: Vec<LaneResult>,
    /// The winning lane, when any lane finished.
    pub winner: Option<LaneResult>,
    /// The user-facing result line; `None` for single-car and cancelled
    /// runs.
    pub banner: Option<String>,
    /// Whether the run was cancelled before completion.
    pub cancelled: bool,
}

/// Select the winner: minimum elapsed time, ties broken to the earliest
/// vehicle in grid order. `None` when no lane finished.
pub fn select_winner(results: &[LaneResult]) -> Option<LaneResult> {
    let mut best: Option<LaneResult> = None;
    for result in results {
        if !result.is_finished() {
            continue;
        }
        match best {
            Some(current) if result.elapsed_ms >= current.elapsed_ms => {}
            _ => best = Some(*result),
        }
    }
    best
}

fn winner_banner(winner: &LaneResult) -> String {
    format!(
        "Car #{} wins in {:.2} s",
        winner.id,
        winner.elapsed_ms / 1000.0
    )
}

/// Orchestrates races against an [`EngineControl`] implementation.
pub struct RaceCoordinator {
    engine: Arc<dyn EngineControl>,
    ledger: WinnerLedger,
    session: RaceSession,
    events: EventBus,
    config: RaceConfig,
}

impl RaceCoordinator {
    /// Create a coordinator. The engine client is injected so tests can
    /// script velocities and breakdowns.
    pub fn new(
        engine: Arc<dyn EngineControl>,
        ledger: WinnerLedger,
        session: RaceSession,
        config: RaceConfig,
    ) -> Self {
        Self {
            engine,
            ledger,
            session,
            events: EventBus::default(),
            config,
        }
    }

    /// The session this coordinator transitions.
    pub fn session(&self) -> &RaceSession {
        &self.session
    }

    /// Subscribe to race events.
    pub fn subscribe(&self) -> broadcast::Receiver<RaceEvent> {
        self.events.subscribe()
    }

    /// Start a race over `vehicles` and return its command handle.
    ///
    /// The handle resolves exactly once through [`RaceHandle::wait`], even if
    /// every start and drive call fails; unresolved backend calls are bounded
    /// by the configured call ceiling.
    ///
    /// # Errors
    ///
    /// Fails when the session guard rejects the transition (already racing,
    /// empty grid).
    pub fn run(&self, vehicles: &[Vehicle], mode: RaceMode) -> Result<RaceHandle, AsyncRaceError> {
        let mut ids: Vec<VehicleId> = vehicles.iter().map(|v| v.id).collect();
        let generation = match mode {
            RaceMode::FullGrid => self.session.begin_race(&ids)?,
            RaceMode::SingleCar => {
                // A single-car run races exactly one vehicle.
                let first = ids
                    .first()
                    .copied()
                    .ok_or(asyncrace_errors::SessionError::EmptyGrid)?;
                ids = vec![first];
                self.session.begin_single(first)?
            }
        };
        info!(generation, vehicles = ids.len(), ?mode, "race started");

        let (cancel_tx, _) = broadcast::channel(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let lanes = PositionBoard::default();
        let stopped: Arc<RwLock<BTreeSet<VehicleId>>> = Arc::default();

        self.events.publish(RaceEvent::RaceStarted {
            generation,
            vehicles: ids.clone(),
        });

        let mut tasks: Vec<JoinHandle<LaneResult>> = Vec::with_capacity(ids.len());
        for id in &ids {
            let lane = LaneContext {
                id: *id,
                generation,
                engine: Arc::clone(&self.engine),
                session: self.session.clone(),
                events: self.events.clone(),
                lanes: lanes.clone(),
                stopped: Arc::clone(&stopped),
                config: self.config.clone(),
            };
            tasks.push(tokio::spawn(run_lane(lane, cancel_tx.subscribe())));
        }

        let aggregate = AggregateContext {
            generation,
            mode,
            ids: ids.clone(),
            session: self.session.clone(),
            ledger: self.ledger.clone(),
            events: self.events.clone(),
            cancelled: Arc::clone(&cancelled),
            record_single_car_wins: self.config.record_single_car_wins,
        };
        let outcome = tokio::spawn(aggregate_race(aggregate, tasks));

        Ok(RaceHandle {
            generation,
            ids,
            cancel_tx,
            cancelled,
            lanes,
            stopped,
            events: self.events.clone(),
            session: self.session.clone(),
            engine: Arc::clone(&self.engine),
            outcome: Some(outcome),
        })
    }
}

impl std::fmt::Debug for RaceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaceCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Command interface for a running race, decoupled from rendering.
pub struct RaceHandle {
    generation: u64,
    ids: Vec<VehicleId>,
    cancel_tx: broadcast::Sender<()>,
    cancelled: Arc<AtomicBool>,
    lanes: PositionBoard,
    stopped: Arc<RwLock<BTreeSet<VehicleId>>>,
    events: EventBus,
    session: RaceSession,
    engine: Arc<dyn EngineControl>,
    outcome: Option<JoinHandle<RaceOutcome>>,
}

impl RaceHandle {
    /// Session generation of this run.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Subscribe to race events.
    pub fn events(&self) -> broadcast::Receiver<RaceEvent> {
        self.events.subscribe()
    }

    /// Numeric lane snapshot in px, for a renderer poll.
    pub fn positions(&self) -> std::collections::BTreeMap<VehicleId, f64> {
        self.lanes.positions()
    }

    /// Cancel the race and reset the session.
    ///
    /// Pending calls and animation waits become no-ops; every lane except
    /// those held by an explicit user stop is rewound; engine stops go out
    /// fire-and-forget so teardown stays responsive, with failures logged.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(generation = self.generation, "race cancelled");
        let _ = self.cancel_tx.send(());
        self.session.reset();
        self.lanes.reset_except_held();
        self.events.publish(RaceEvent::PositionsReset);

        let held = self.stopped.read().clone();
        for id in self.ids.iter().copied().filter(|id| !held.contains(id)) {
            let engine = Arc::clone(&self.engine);
            tokio::spawn(async move {
                if let Err(e) = engine.stop(id).await {
                    warn!(vehicle = %id, error = %e, "engine stop during teardown failed");
                }
            });
        }
    }

    /// User stop: hold the lane at its current position (kept through
    /// cleanup), exclude the vehicle from winner consideration, and stop its
    /// engine best-effort.
    pub fn stop_vehicle(&self, id: VehicleId) {
        self.stopped.write().insert(id);
        let position_px = self.lanes.pause(id, true).unwrap_or(0.0);
        self.events
            .publish(RaceEvent::VehicleStopped { id, position_px });

        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            if let Err(e) = engine.stop(id).await {
                warn!(vehicle = %id, error = %e, "engine stop failed");
            }
        });
    }

    /// Rewind every lane to the start line.
    pub fn reset_positions(&self) {
        self.lanes.reset();
        self.events.publish(RaceEvent::PositionsReset);
    }

    /// Await the aggregated outcome. Resolves exactly once; later calls
    /// return `None`.
    pub async fn wait(&mut self) -> Option<RaceOutcome> {
        let task = self.outcome.take()?;
        match task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(error = %e, "race aggregation task failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for RaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaceHandle")
            .field("generation", &self.generation)
            .field("vehicles", &self.ids.len())
            .finish_non_exhaustive()
    }
}

struct LaneContext {
    id: VehicleId,
    generation: u64,
    engine: Arc<dyn EngineControl>,
    session: RaceSession,
    events: EventBus,
    lanes: PositionBoard,
    stopped: Arc<RwLock<BTreeSet<VehicleId>>>,
    config: RaceConfig,
}

impl LaneContext {
    fn user_stopped(&self) -> bool {
        self.stopped.read().contains(&self.id)
    }

    fn fail(&self, position_px: f64) -> LaneResult {
        self.session.mark_failed(self.generation, self.id);
        self.events.publish(RaceEvent::VehicleFailed {
            id: self.id,
            position_px,
        });
        LaneResult::failed(self.id)
    }
}

/// One vehicle's start → animate → drive pipeline. Steps are strictly
/// ordered within this task; nothing is ordered across vehicles.
async fn run_lane(ctx: LaneContext, mut cancel: broadcast::Receiver<()>) -> LaneResult {
    let id = ctx.id;
    let ceiling = ctx.config.call_ceiling();

    // Start. Failure withdraws the vehicle; nothing else happens for it.
    let started = tokio::select! {
        _ = cancel.recv() => return LaneResult::failed(id),
        result = timeout(ceiling, ctx.engine.start(id)) => result,
    };
    let start = match started {
        Ok(Ok(start)) => start,
        Ok(Err(e)) => {
            warn!(vehicle = %id, error = %e, "engine start failed");
            return ctx.fail(0.0);
        }
        Err(_) => {
            warn!(vehicle = %id, ?ceiling, "engine start timed out");
            return ctx.fail(0.0);
        }
    };

    // Animation parameters from the server-supplied physics.
    let velocity = ctx.config.effective_velocity(start.velocity);
    let travel_px = ctx.config.travel(start.distance);
    let duration = ctx.config.lane_duration(travel_px, velocity);
    let animation_started = Instant::now();
    ctx.lanes.begin(id, travel_px, duration);
    ctx.events.publish(RaceEvent::AnimationStarted {
        id,
        travel_px,
        duration,
    });
    debug!(vehicle = %id, velocity, travel_px, ?duration, "lane animating");

    // Drive, concurrent with the animation - not after it.
    let drive = tokio::select! {
        _ = cancel.recv() => return LaneResult::failed(id),
        result = timeout(ceiling, ctx.engine.drive(id)) => result,
    };
    let completed = match drive {
        Ok(Ok(DriveOutcome::Completed)) => true,
        Ok(Ok(DriveOutcome::Breakdown)) => {
            debug!(vehicle = %id, "engine broke down mid-race");
            false
        }
        Ok(Err(e)) => {
            // Transport failure: same race outcome as a breakdown, logged
            // distinctly.
            warn!(vehicle = %id, error = %e, "drive call failed in transport");
            false
        }
        Err(_) => {
            warn!(vehicle = %id, ?ceiling, "drive call timed out");
            false
        }
    };

    if ctx.user_stopped() {
        // The lane already holds its position; the vehicle is simply out of
        // winner consideration.
        return LaneResult::failed(id);
    }
    if !completed {
        let position_px = ctx.lanes.pause(id, false).unwrap_or(0.0);
        return ctx.fail(position_px);
    }

    // Let the visual motion complete before reporting the finish.
    let deadline = animation_started + duration;
    tokio::select! {
        _ = cancel.recv() => return LaneResult::failed(id),
        () = sleep_until(deadline) => {}
    }
    if ctx.user_stopped() {
        return LaneResult::failed(id);
    }

    ctx.lanes.finish(id);
    let elapsed_ms = duration.as_secs_f64() * 1000.0;
    ctx.events.publish(RaceEvent::VehicleFinished { id, elapsed_ms });
    LaneResult::finished(id, elapsed_ms)
}

struct AggregateContext {
    generation: u64,
    mode: RaceMode,
    ids: Vec<VehicleId>,
    session: RaceSession,
    ledger: WinnerLedger,
    events: EventBus,
    cancelled: Arc<AtomicBool>,
    record_single_car_wins: bool,
}

/// Collect every lane result in grid order, pick the winner, persist it, and
/// finish the session. Lane failures arrive as data; a panicked lane task is
/// logged and counted as that vehicle's failure.
async fn aggregate_race(ctx: AggregateContext, tasks: Vec<JoinHandle<LaneResult>>) -> RaceOutcome {
    let mut results = Vec::with_capacity(tasks.len());
    for (task, id) in tasks.into_iter().zip(ctx.ids.iter().copied()) {
        match task.await {
            Ok(result) => results.push(result),
            Err(e) => {
                error!(vehicle = %id, error = %e, "lane task failed");
                results.push(LaneResult::failed(id));
            }
        }
    }

    if ctx.cancelled.load(Ordering::SeqCst) {
        debug!(generation = ctx.generation, "cancelled race resolved");
        return RaceOutcome {
            generation: ctx.generation,
            results,
            winner: None,
            banner: None,
            cancelled: true,
        };
    }

    let winner = select_winner(&results);
    match ctx.mode {
        RaceMode::FullGrid => {
            if let Some(w) = &winner {
                // The banner is reported regardless of ledger success.
                if let Err(e) = ctx.ledger.upsert(w.id, w.elapsed_ms).await {
                    warn!(error = %e, "race winner was not persisted");
                }
            }
            let banner = winner
                .as_ref()
                .map(winner_banner)
                .unwrap_or_else(|| NO_FINISHER_BANNER.to_string());
            info!(generation = ctx.generation, banner = %banner, "race finished");
            ctx.session.finish(ctx.generation, Some(banner.clone()));
            ctx.events.publish(RaceEvent::RaceFinished {
                generation: ctx.generation,
                banner: banner.clone(),
            });
            RaceOutcome {
                generation: ctx.generation,
                results,
                winner,
                banner: Some(banner),
                cancelled: false,
            }
        }
        RaceMode::SingleCar => {
            if ctx.record_single_car_wins
                && let Some(w) = &winner
            {
                if let Err(e) = ctx.ledger.upsert(w.id, w.elapsed_ms).await {
                    warn!(error = %e, "single-car win was not persisted");
                }
            }
            ctx.session.finish(ctx.generation, None);
            RaceOutcome {
                generation: ctx.generation,
                results,
                winner,
                banner: None,
                cancelled: false,
            }
        }
    }
}
