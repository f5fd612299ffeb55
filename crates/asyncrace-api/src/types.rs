//! Wire types for the mock backend and local input validation.

use core::fmt;

use asyncrace_errors::{MAX_NAME_LEN, ValidationError};
use serde::{Deserialize, Serialize};

/// Backend-assigned vehicle identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VehicleId {
    fn from(id: u64) -> Self {
        VehicleId(id)
    }
}

/// A car in the garage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Backend-assigned id.
    pub id: VehicleId,
    /// Display name, 1..=20 characters.
    pub name: String,
    /// Hex RGB color, e.g. `#ff8800`.
    pub color: String,
}

/// Body for creating a vehicle; the backend assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVehicle {
    /// Display name.
    pub name: String,
    /// Hex RGB color.
    pub color: String,
}

/// Partial update for a vehicle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleUpdate {
    /// New name, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New color, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Result of a successful engine start: server-simulated physics parameters,
/// produced once per race start per vehicle and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineStart {
    /// Randomized velocity in px/s.
    pub velocity: f64,
    /// Track distance in px, fixed per backend configuration.
    pub distance: f64,
    /// Echoed vehicle id. Some backend builds omit it.
    #[serde(default)]
    pub id: Option<VehicleId>,
}

/// Domain outcome of a drive call.
///
/// A breakdown is the backend's documented 500, fired on roughly 10% of
/// calls. It is an expected race mechanic, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The vehicle will finish its run.
    Completed,
    /// The engine broke down mid-race.
    Breakdown,
}

/// Persisted winner record, 1:1 with a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    /// Vehicle id (primary key).
    pub id: VehicleId,
    /// Total wins, >= 1.
    pub wins: u32,
    /// Best (lowest) elapsed time ever recorded, in milliseconds.
    pub time: f64,
}

/// Body for updating a winner record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WinnerUpdate {
    /// New total wins.
    pub wins: u32,
    /// New best time in milliseconds.
    pub time: f64,
}

/// One page of a listed resource; `total` comes from the backend's
/// `X-Total-Count` header.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total item count across all pages.
    pub total: u64,
}

/// Winners table sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Sort by win count.
    Wins,
    /// Sort by best time.
    Time,
}

impl SortKey {
    /// Query-parameter value.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Wins => "wins",
            SortKey::Time => "time",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Query-parameter value.
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// The opposite direction; used when a sort column header is clicked
    /// twice.
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Winners listing parameters.
#[derive(Debug, Clone, Copy)]
pub struct WinnersQuery {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Sort column.
    pub sort: SortKey,
    /// Sort direction.
    pub order: SortOrder,
}

impl Default for WinnersQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort: SortKey::Wins,
            order: SortOrder::Desc,
        }
    }
}

/// Validate a vehicle name, returning the trimmed form.
///
/// # Errors
///
/// Rejects empty and over-long names before any network call.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let len = trimmed.chars().count();
    if len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong { len });
    }
    Ok(trimmed.to_string())
}

/// Validate a vehicle color as hex RGB.
///
/// # Errors
///
/// Rejects anything that is not a `#`-prefixed parseable color.
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidColor {
        value: color.to_string(),
    };
    if !color.starts_with('#') {
        return Err(invalid());
    }
    color
        .parse::<css_color_parser::Color>()
        .map(|_| ())
        .map_err(|_| invalid())
}

/// Extract the total item count from a list response.
pub(crate) fn total_count(headers: &reqwest::header::HeaderMap, fallback: u64) -> u64 {
    headers
        .get("x-total-count")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_bounded() -> Result<(), ValidationError> {
        assert_eq!(validate_name("  Tesla Model S  ")?, "Tesla Model S");
        assert_eq!(validate_name("   "), Err(ValidationError::EmptyName));
        assert_eq!(
            validate_name("a name far too long for the garage"),
            Err(ValidationError::NameTooLong { len: 34 })
        );
        Ok(())
    }

    #[test]
    fn twenty_characters_is_still_valid() -> Result<(), ValidationError> {
        let name = "x".repeat(20);
        assert_eq!(validate_name(&name)?, name);
        let name = "x".repeat(21);
        assert!(validate_name(&name).is_err());
        Ok(())
    }

    #[test]
    fn color_must_be_hex_rgb() {
        assert!(validate_color("#ff8800").is_ok());
        assert!(validate_color("#fff").is_ok());
        assert!(validate_color("red").is_err());
        assert!(validate_color("#gggggg").is_err());
        assert!(validate_color("").is_err());
    }

    #[test]
    fn engine_start_tolerates_missing_id() -> anyhow::Result<()> {
        // The documented response carries the id, but the stock mock server
        // answers with velocity and distance only.
        let start: EngineStart = serde_json::from_str(r#"{"velocity":112.5,"distance":600}"#)?;
        assert_eq!(start.id, None);
        assert!((start.velocity - 112.5).abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn sort_order_toggles() {
        assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.toggled().as_str(), "asc");
    }
}
