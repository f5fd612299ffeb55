//! Vehicle fixture builders.

use asyncrace_api::{Vehicle, VehicleId};

const PALETTE: [&str; 6] = [
    "#ff4444", "#44ff44", "#4444ff", "#ffaa00", "#aa00ff", "#00ffaa",
];

/// A vehicle with a deterministic name and color derived from its id.
pub fn vehicle(id: u64) -> Vehicle {
    let color = PALETTE[(id as usize) % PALETTE.len()];
    Vehicle {
        id: VehicleId(id),
        name: format!("Car {id}"),
        color: color.to_string(),
    }
}

/// A grid of `count` vehicles with ids `1..=count`.
pub fn grid(count: u64) -> Vec<Vehicle> {
    (1..=count).map(vehicle).collect()
}
