//! Race event stream.
//!
//! The renderer subscribes to these instead of being driven imperatively;
//! everything it needs to draw a lane is in `AnimationStarted` (where to go
//! and how long to take) plus the terminal per-vehicle events.

use std::time::Duration;

use asyncrace_api::VehicleId;
use tokio::sync::broadcast;

/// Events published over the lifetime of a race.
#[derive(Debug, Clone)]
pub enum RaceEvent {
    /// A race began for the listed vehicles.
    RaceStarted {
        /// Session generation of this run.
        generation: u64,
        /// Participating vehicles, in grid order.
        vehicles: Vec<VehicleId>,
    },
    /// A lane began moving: animate from 0 to `travel_px` over `duration`.
    AnimationStarted {
        /// Vehicle id.
        id: VehicleId,
        /// End position in px.
        travel_px: f64,
        /// Animation duration.
        duration: Duration,
    },
    /// The vehicle's engine failed (start failure, breakdown, transport
    /// failure, or timeout); its lane is frozen at `position_px`.
    VehicleFailed {
        /// Vehicle id.
        id: VehicleId,
        /// Frozen position in px.
        position_px: f64,
    },
    /// The user stopped the vehicle; its lane holds at `position_px` and is
    /// not rewound on cleanup.
    VehicleStopped {
        /// Vehicle id.
        id: VehicleId,
        /// Held position in px.
        position_px: f64,
    },
    /// The vehicle completed its run.
    VehicleFinished {
        /// Vehicle id.
        id: VehicleId,
        /// Elapsed time in milliseconds.
        elapsed_ms: f64,
    },
    /// All lanes were rewound to the start line.
    PositionsReset,
    /// The race resolved; `banner` is the user-facing result line.
    RaceFinished {
        /// Session generation of this run.
        generation: u64,
        /// Result message.
        banner: String,
    },
}

/// Broadcast bus for [`RaceEvent`]s.
///
/// Publishing without subscribers is a no-op; a slow subscriber that lags
/// behind the channel capacity misses events rather than blocking the race.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RaceEvent>,
}

impl EventBus {
    /// Create a bus with the given buffered capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to race events.
    pub fn subscribe(&self) -> broadcast::Receiver<RaceEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub(crate) fn publish(&self, event: RaceEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(RaceEvent::PositionsReset);

        let event = rx.recv().await;
        assert!(matches!(event, Ok(RaceEvent::PositionsReset)));
    }

    #[test]
    fn publishing_without_subscribers_is_a_noop() {
        let bus = EventBus::default();
        bus.publish(RaceEvent::PositionsReset);
    }
}
