//! Lane timelines: the numeric position contract for a renderer.
//!
//! A lane is a time-based linear interpolation from 0 to its travel distance.
//! Positions are derived from the clock on demand rather than ticked, so a
//! renderer can poll at whatever rate it draws, and tests can use a paused
//! clock.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use asyncrace_api::VehicleId;
use parking_lot::RwLock;
use tokio::time::Instant;

/// One vehicle's animation timeline.
#[derive(Debug, Clone, Copy)]
struct Lane {
    travel_px: f64,
    duration: Duration,
    started_at: Instant,
    state: LaneState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LaneState {
    Running,
    /// Frozen mid-run. `held` lanes were stopped by the user and keep their
    /// position through cleanup; unheld pauses are breakdown freezes.
    Paused { at_px: f64, held: bool },
    Finished,
}

impl Lane {
    fn new(travel_px: f64, duration: Duration, started_at: Instant) -> Self {
        Self {
            travel_px,
            duration,
            started_at,
            state: LaneState::Running,
        }
    }

    fn position_at(&self, now: Instant) -> f64 {
        match self.state {
            LaneState::Paused { at_px, .. } => at_px,
            LaneState::Finished => self.travel_px,
            LaneState::Running => {
                let total = self.duration.as_secs_f64();
                if total <= f64::EPSILON {
                    return self.travel_px;
                }
                let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
                self.travel_px * (elapsed / total).clamp(0.0, 1.0)
            }
        }
    }

    fn pause(&mut self, now: Instant, held: bool) -> f64 {
        let at_px = self.position_at(now);
        // A held pause wins over a plain freeze, never the other way around.
        let held = held
            || matches!(
                self.state,
                LaneState::Paused { held: true, .. }
            );
        self.state = LaneState::Paused { at_px, held };
        at_px
    }

    fn is_held(&self) -> bool {
        matches!(self.state, LaneState::Paused { held: true, .. })
    }
}

/// Shared board of lane timelines for one race.
///
/// The coordinator writes; renderers read positions. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct PositionBoard {
    lanes: Arc<RwLock<BTreeMap<VehicleId, Lane>>>,
}

impl PositionBoard {
    /// Start a lane animating from 0 to `travel_px` over `duration`.
    pub fn begin(&self, id: VehicleId, travel_px: f64, duration: Duration) {
        let lane = Lane::new(travel_px, duration, Instant::now());
        self.lanes.write().insert(id, lane);
    }

    /// Freeze a lane at its current position. Returns the frozen position,
    /// or `None` when the lane never started animating.
    pub fn pause(&self, id: VehicleId, held: bool) -> Option<f64> {
        let now = Instant::now();
        self.lanes.write().get_mut(&id).map(|lane| lane.pause(now, held))
    }

    /// Mark a lane complete at its end position.
    pub fn finish(&self, id: VehicleId) {
        if let Some(lane) = self.lanes.write().get_mut(&id) {
            lane.state = LaneState::Finished;
        }
    }

    /// Current position of every known lane, in px.
    pub fn positions(&self) -> BTreeMap<VehicleId, f64> {
        let now = Instant::now();
        self.lanes
            .read()
            .iter()
            .map(|(id, lane)| (*id, lane.position_at(now)))
            .collect()
    }

    /// Rewind every lane to the start line.
    pub fn reset(&self) {
        self.lanes.write().clear();
    }

    /// Rewind every lane except those held by an explicit user stop.
    pub fn reset_except_held(&self) {
        self.lanes.write().retain(|_, lane| lane.is_held());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: VehicleId = VehicleId(1);

    #[test]
    fn running_lane_interpolates_linearly() {
        let start = Instant::now();
        let lane = Lane::new(600.0, Duration::from_secs(6), start);

        assert!((lane.position_at(start) - 0.0).abs() < 1e-9);
        let mid = lane.position_at(start + Duration::from_secs(3));
        assert!((mid - 300.0).abs() < 1e-9);
        // Past the end the lane clamps to its travel.
        let end = lane.position_at(start + Duration::from_secs(60));
        assert!((end - 600.0).abs() < 1e-9);
    }

    #[test]
    fn paused_lane_holds_its_position() {
        let start = Instant::now();
        let mut lane = Lane::new(600.0, Duration::from_secs(6), start);

        let frozen = lane.pause(start + Duration::from_secs(2), false);
        assert!((frozen - 200.0).abs() < 1e-9);
        let later = lane.position_at(start + Duration::from_secs(5));
        assert!((later - 200.0).abs() < 1e-9);
    }

    #[test]
    fn held_pause_survives_a_later_freeze() {
        let start = Instant::now();
        let mut lane = Lane::new(600.0, Duration::from_secs(6), start);

        lane.pause(start + Duration::from_secs(1), true);
        lane.pause(start + Duration::from_secs(2), false);
        assert!(lane.is_held());
    }

    #[test]
    fn reset_except_held_keeps_user_stopped_lanes() {
        let board = PositionBoard::default();
        board.begin(VehicleId(1), 600.0, Duration::from_secs(6));
        board.begin(VehicleId(2), 600.0, Duration::from_secs(6));

        board.pause(VehicleId(1), true);
        board.pause(VehicleId(2), false);
        board.reset_except_held();

        let positions = board.positions();
        assert!(positions.contains_key(&VehicleId(1)));
        assert!(!positions.contains_key(&VehicleId(2)));
    }

    #[test]
    fn finished_lane_reports_full_travel() {
        let board = PositionBoard::default();
        board.begin(ID, 480.0, Duration::from_secs(4));
        board.finish(ID);

        let positions = board.positions();
        let at = positions.get(&ID).copied().unwrap_or_default();
        assert!((at - 480.0).abs() < 1e-9);
    }

    #[test]
    fn pausing_an_unknown_lane_is_none() {
        let board = PositionBoard::default();
        assert!(board.pause(ID, true).is_none());
    }
}
