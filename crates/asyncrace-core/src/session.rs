//! Race-session state machine.
//!
//! One `RaceSession` exists per garage view. It is the only shared mutable
//! state in the system besides the registry cache: the coordinator is the
//! sole writer of the failed set and the terminal banner, the UI layer is the
//! sole writer of start/reset triggers, and everyone else reads snapshots
//! through a watch subscription.
//!
//! Every begin and reset bumps a generation counter. Coordinator callbacks
//! carry the generation they were started under; a callback that lost a race
//! with `reset()` sees a stale generation and becomes a no-op, so no stale
//! completion can mutate session state.

use std::collections::BTreeSet;
use std::sync::Arc;

use asyncrace_api::VehicleId;
use asyncrace_errors::SessionError;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;

/// Which phase the garage view is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// No race running; all controls enabled.
    Idle,
    /// A full-grid race is in flight.
    FullRace,
    /// A single car is running.
    SingleCar,
    /// A full-grid race resolved; the banner is showing. Starting a new race
    /// is allowed and clears it.
    Finished,
}

impl SessionMode {
    /// True while any vehicle is running.
    pub fn is_racing(self) -> bool {
        matches!(self, SessionMode::FullRace | SessionMode::SingleCar)
    }
}

/// Immutable view of the session, published on every transition.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current phase.
    pub mode: SessionMode,
    /// Vehicles participating in the current run.
    pub active: BTreeSet<VehicleId>,
    /// Vehicles whose engines failed during the current run.
    pub failed: BTreeSet<VehicleId>,
    /// Terminal race-result message, when showing.
    pub banner: Option<String>,
    /// Monotonic run counter; bumped on every begin and reset.
    pub generation: u64,
}

impl SessionSnapshot {
    fn idle() -> Self {
        Self {
            mode: SessionMode::Idle,
            active: BTreeSet::new(),
            failed: BTreeSet::new(),
            banner: None,
            generation: 0,
        }
    }
}

struct SessionInner {
    state: RwLock<SessionSnapshot>,
    tx: watch::Sender<SessionSnapshot>,
}

/// Handle to the shared session state machine. Cheap to clone.
#[derive(Clone)]
pub struct RaceSession {
    inner: Arc<SessionInner>,
}

impl Default for RaceSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RaceSession {
    /// Create an idle session.
    pub fn new() -> Self {
        let snapshot = SessionSnapshot::idle();
        let (tx, _) = watch::channel(snapshot.clone());
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(snapshot),
                tx,
            }),
        }
    }

    /// Subscribe to session snapshots.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.tx.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.read().clone()
    }

    /// Current phase.
    pub fn mode(&self) -> SessionMode {
        self.inner.state.read().mode
    }

    /// Guard for garage mutations: rejected while any vehicle runs.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::GarageLocked`] during a race or single-car
    /// run.
    pub fn ensure_unlocked(&self) -> Result<(), SessionError> {
        if self.mode().is_racing() {
            return Err(SessionError::GarageLocked);
        }
        Ok(())
    }

    /// Transition into a full-grid race.
    ///
    /// # Errors
    ///
    /// Rejects an empty grid and a session that is already racing.
    pub fn begin_race(&self, vehicles: &[VehicleId]) -> Result<u64, SessionError> {
        if vehicles.is_empty() {
            return Err(SessionError::EmptyGrid);
        }
        self.begin(SessionMode::FullRace, vehicles)
    }

    /// Transition into a single-car run.
    ///
    /// # Errors
    ///
    /// Rejects a session that is already racing.
    pub fn begin_single(&self, id: VehicleId) -> Result<u64, SessionError> {
        self.begin(SessionMode::SingleCar, &[id])
    }

    fn begin(&self, mode: SessionMode, vehicles: &[VehicleId]) -> Result<u64, SessionError> {
        let generation = {
            let mut state = self.inner.state.write();
            if state.mode.is_racing() {
                return Err(SessionError::AlreadyRacing);
            }
            state.mode = mode;
            state.active = vehicles.iter().copied().collect();
            state.failed.clear();
            state.banner = None;
            state.generation += 1;
            state.generation
        };
        debug!(?mode, generation, "session transition");
        self.publish();
        Ok(generation)
    }

    /// Record an engine failure for the current run. Coordinator-only;
    /// a stale generation is ignored.
    pub fn mark_failed(&self, generation: u64, id: VehicleId) {
        {
            let mut state = self.inner.state.write();
            if state.generation != generation || !state.mode.is_racing() {
                return;
            }
            state.failed.insert(id);
        }
        self.publish();
    }

    /// Terminal transition driven by coordinator completion. A full race
    /// moves to `Finished` with its banner; a single-car run returns to
    /// `Idle`. A stale generation is ignored.
    pub fn finish(&self, generation: u64, banner: Option<String>) {
        {
            let mut state = self.inner.state.write();
            if state.generation != generation {
                debug!(generation, "discarding stale race completion");
                return;
            }
            match state.mode {
                SessionMode::FullRace => {
                    state.mode = SessionMode::Finished;
                    state.banner = banner;
                    state.active.clear();
                }
                SessionMode::SingleCar => {
                    state.mode = SessionMode::Idle;
                    state.active.clear();
                }
                SessionMode::Idle | SessionMode::Finished => return,
            }
        }
        self.publish();
    }

    /// Reset to idle: clears the active and failed sets and the banner, and
    /// bumps the generation so in-flight coordinator work cannot write back.
    /// Also forced by navigating away from the garage view.
    pub fn reset(&self) {
        {
            let mut state = self.inner.state.write();
            state.mode = SessionMode::Idle;
            state.active.clear();
            state.failed.clear();
            state.banner = None;
            state.generation += 1;
        }
        debug!("session reset");
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.inner.state.read().clone();
        let _ = self.inner.tx.send(snapshot);
    }
}

impl std::fmt::Debug for RaceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("RaceSession")
            .field("mode", &state.mode)
            .field("generation", &state.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<VehicleId> {
        raw.iter().copied().map(VehicleId).collect()
    }

    #[test]
    fn empty_grid_is_rejected() {
        let session = RaceSession::new();
        assert_eq!(session.begin_race(&[]), Err(SessionError::EmptyGrid));
        assert_eq!(session.mode(), SessionMode::Idle);
    }

    #[test]
    fn second_start_is_rejected_while_racing() {
        let session = RaceSession::new();
        let grid = ids(&[1, 2]);
        assert!(session.begin_race(&grid).is_ok());
        assert_eq!(session.begin_race(&grid), Err(SessionError::AlreadyRacing));
        assert_eq!(
            session.begin_single(VehicleId(1)),
            Err(SessionError::AlreadyRacing)
        );
    }

    #[test]
    fn finish_moves_full_race_to_finished_with_banner() {
        let session = RaceSession::new();
        let generation = session.begin_race(&ids(&[1])).unwrap_or_default();

        session.finish(generation, Some("Car #1 wins in 4.20 s".to_string()));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.mode, SessionMode::Finished);
        assert_eq!(snapshot.banner.as_deref(), Some("Car #1 wins in 4.20 s"));
        assert!(snapshot.active.is_empty());
    }

    #[test]
    fn finished_session_can_start_again_and_clears_banner() {
        let session = RaceSession::new();
        let generation = session.begin_race(&ids(&[1])).unwrap_or_default();
        session.finish(generation, Some("banner".to_string()));

        assert!(session.begin_race(&ids(&[1])).is_ok());
        assert_eq!(session.snapshot().banner, None);
    }

    #[test]
    fn stale_finish_after_reset_is_a_noop() {
        let session = RaceSession::new();
        let generation = session.begin_race(&ids(&[1, 2])).unwrap_or_default();

        session.reset();
        session.finish(generation, Some("too late".to_string()));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.mode, SessionMode::Idle);
        assert_eq!(snapshot.banner, None);
    }

    #[test]
    fn stale_mark_failed_is_a_noop() {
        let session = RaceSession::new();
        let generation = session.begin_race(&ids(&[1])).unwrap_or_default();
        session.reset();

        session.mark_failed(generation, VehicleId(1));
        assert!(session.snapshot().failed.is_empty());
    }

    #[test]
    fn single_car_completion_returns_to_idle_without_banner() {
        let session = RaceSession::new();
        let generation = session.begin_single(VehicleId(7)).unwrap_or_default();

        session.mark_failed(generation, VehicleId(7));
        assert_eq!(session.snapshot().failed.len(), 1);

        session.finish(generation, None);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.mode, SessionMode::Idle);
        assert_eq!(snapshot.banner, None);
    }

    #[test]
    fn garage_is_locked_while_racing() {
        let session = RaceSession::new();
        assert!(session.ensure_unlocked().is_ok());

        let generation = session.begin_single(VehicleId(3)).unwrap_or_default();
        assert_eq!(session.ensure_unlocked(), Err(SessionError::GarageLocked));

        session.finish(generation, None);
        assert!(session.ensure_unlocked().is_ok());
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let session = RaceSession::new();
        let mut rx = session.subscribe();

        let generation = session.begin_race(&ids(&[1])).unwrap_or_default();
        rx.changed().await.unwrap_or_default();
        assert_eq!(rx.borrow().mode, SessionMode::FullRace);

        session.finish(generation, Some("done".to_string()));
        rx.changed().await.unwrap_or_default();
        assert_eq!(rx.borrow().mode, SessionMode::Finished);
    }
}
