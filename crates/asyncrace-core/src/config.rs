//! Race configuration loading and management.
//!
//! Everything here is presentation and policy tuning, not protocol: the
//! velocity floor and slowdown factor exist so short tracks stay watchable,
//! the call ceiling guarantees a race terminates against an unresponsive
//! backend, and `record_single_car_wins` resolves the single-car ledger
//! policy.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Race orchestration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Velocity floor in px/s; server velocities below this are clamped so
    /// durations never run away.
    pub min_velocity: f64,

    /// Environment-dependent slowdown divisor applied to server velocities
    /// for visibility. Values below 1.0 are treated as 1.0.
    pub slowdown: f64,

    /// Rendered track length in px.
    pub track_length: f64,

    /// Rendered vehicle width in px; subtracted from the track so a car
    /// stops at the flag, not past it.
    pub car_width: f64,

    /// Lane padding in px.
    pub lane_margin: f64,

    /// Minimum travel in px, so a lane always visibly moves.
    pub min_travel: f64,

    /// Upper bound in seconds on any single engine call; an unresolved call
    /// past this is treated as that vehicle's failure.
    pub call_ceiling_secs: u64,

    /// Whether a single-car run's completion is recorded in the winners
    /// table like a full-grid win.
    pub record_single_car_wins: bool,

    /// Garage page size.
    pub page_limit: u32,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            min_velocity: 80.0,
            slowdown: 1.0,
            track_length: 800.0,
            car_width: 40.0,
            lane_margin: 8.0,
            min_travel: 20.0,
            call_ceiling_secs: 30,
            record_single_car_wins: false,
            page_limit: 7,
        }
    }
}

impl RaceConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read race config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse race config from {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be serialized or written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write race config to {}", path.display()))?;
        Ok(())
    }

    /// The call-timeout ceiling as a [`Duration`].
    pub fn call_ceiling(&self) -> Duration {
        Duration::from_secs(self.call_ceiling_secs)
    }

    /// Apply the slowdown divisor and velocity floor to a server velocity.
    pub fn effective_velocity(&self, raw: f64) -> f64 {
        (raw / self.slowdown.max(1.0)).max(self.min_velocity)
    }

    /// Track length available to a lane after the car width and margin.
    pub fn free_track(&self) -> f64 {
        (self.track_length - self.car_width - self.lane_margin).max(0.0)
    }

    /// Clamp a server distance to the renderable travel.
    pub fn travel(&self, distance: f64) -> f64 {
        distance.min(self.free_track()).max(self.min_travel)
    }

    /// Animation duration for a travel at an effective velocity.
    pub fn lane_duration(&self, travel_px: f64, velocity: f64) -> Duration {
        Duration::from_secs_f64(travel_px / velocity.max(f64::EPSILON))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn velocity_is_floored_and_slowed() {
        let config = RaceConfig::default();
        assert!((config.effective_velocity(120.0) - 120.0).abs() < 1e-9);
        assert!((config.effective_velocity(12.0) - 80.0).abs() < 1e-9);

        let slowed = RaceConfig {
            slowdown: 4.0,
            ..RaceConfig::default()
        };
        assert!((slowed.effective_velocity(400.0) - 100.0).abs() < 1e-9);
        // The floor applies after the slowdown.
        assert!((slowed.effective_velocity(120.0) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn slowdown_below_one_never_speeds_up() {
        let config = RaceConfig {
            slowdown: 0.0,
            ..RaceConfig::default()
        };
        assert!((config.effective_velocity(100.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn travel_is_clamped_to_the_track() {
        let config = RaceConfig::default();
        // 800 - 40 - 8 px of free track
        assert!((config.free_track() - 752.0).abs() < 1e-9);
        assert!((config.travel(600.0) - 600.0).abs() < 1e-9);
        assert!((config.travel(10_000.0) - 752.0).abs() < 1e-9);
        assert!((config.travel(3.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn duration_follows_distance_over_velocity() {
        let config = RaceConfig::default();
        let duration = config.lane_duration(600.0, 120.0);
        assert_eq!(duration, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn config_round_trips_through_a_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("race.json");

        let config = RaceConfig {
            slowdown: 4.0,
            record_single_car_wins: true,
            ..RaceConfig::default()
        };
        config.save(&path).await?;

        let loaded = RaceConfig::load(&path).await?;
        assert!((loaded.slowdown - 4.0).abs() < 1e-9);
        assert!(loaded.record_single_car_wins);
        assert_eq!(loaded.page_limit, 7);
        Ok(())
    }

    #[test]
    fn missing_fields_take_defaults() -> Result<()> {
        let config: RaceConfig = serde_json::from_str(r#"{"slowdown": 2.0}"#)?;
        assert!((config.min_velocity - 80.0).abs() < 1e-9);
        assert!((config.slowdown - 2.0).abs() < 1e-9);
        Ok(())
    }
}
