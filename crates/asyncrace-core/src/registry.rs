//! Vehicle registry: the cached garage page and its mutations.
//!
//! All writes go through the backend and then refresh the cache; nothing here
//! speculates about server state. Every mutation is rejected while a race is
//! running - vehicles are immutable once a race that references them is in
//! flight.

use asyncrace_api::{
    GarageClient, NewVehicle, Vehicle, VehicleId, VehicleUpdate, validate_color, validate_name,
};
use asyncrace_errors::Result;
use parking_lot::RwLock;
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

use crate::ledger::WinnerLedger;
use crate::session::RaceSession;

/// Name pools for fleet generation.
const BRANDS: [&str; 10] = [
    "Toyota", "Ford", "Honda", "Tesla", "BMW", "Audi", "Nissan", "Kia", "Hyundai", "Volvo",
];
const MODELS: [&str; 10] = [
    "Supra", "Mustang", "Civic", "Model S", "X5", "A4", "Leaf", "Sportage", "Ioniq", "XC90",
];

/// Pause between bulk requests so the mock backend is not hammered.
const GENERATE_THROTTLE: Duration = Duration::from_millis(100);
const DELETE_THROTTLE: Duration = Duration::from_millis(50);

/// Result of a bulk generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetReport {
    /// Vehicles created.
    pub created: u32,
    /// Creations that failed (logged individually).
    pub failed: u32,
}

#[derive(Debug, Default)]
struct RegistryState {
    page: u32,
    vehicles: Vec<Vehicle>,
    total: u64,
    selected: Option<VehicleId>,
}

/// The set of cars, one cached page at a time.
#[derive(Debug)]
pub struct VehicleRegistry {
    garage: GarageClient,
    ledger: WinnerLedger,
    session: RaceSession,
    page_limit: u32,
    state: RwLock<RegistryState>,
}

impl VehicleRegistry {
    /// Create a registry over the garage client.
    pub fn new(
        garage: GarageClient,
        ledger: WinnerLedger,
        session: RaceSession,
        page_limit: u32,
    ) -> Self {
        Self {
            garage,
            ledger,
            session,
            page_limit,
            state: RwLock::new(RegistryState {
                page: 1,
                ..RegistryState::default()
            }),
        }
    }

    /// Vehicles on the cached page, in backend order.
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.state.read().vehicles.clone()
    }

    /// Total vehicle count across all pages, from the last refresh.
    pub fn total(&self) -> u64 {
        self.state.read().total
    }

    /// Current 1-based page number.
    pub fn page(&self) -> u32 {
        self.state.read().page
    }

    /// Currently selected vehicle, if any.
    pub fn selected(&self) -> Option<Vehicle> {
        let state = self.state.read();
        let id = state.selected?;
        state.vehicles.iter().find(|v| v.id == id).cloned()
    }

    /// Select a vehicle for editing, or clear the selection.
    pub fn select(&self, id: Option<VehicleId>) {
        self.state.write().selected = id;
    }

    /// Re-fetch the current page from the backend.
    ///
    /// # Errors
    ///
    /// Propagates backend errors untouched; the cache keeps its previous
    /// contents on failure.
    pub async fn refresh(&self) -> Result<()> {
        let page = self.page();
        let fetched = self.garage.list(page, self.page_limit).await?;
        let mut state = self.state.write();
        state.vehicles = fetched.items;
        state.total = fetched.total;
        Ok(())
    }

    /// Switch to a page and fetch it.
    ///
    /// # Errors
    ///
    /// Propagates backend errors untouched.
    pub async fn set_page(&self, page: u32) -> Result<()> {
        self.state.write().page = page.max(1);
        self.refresh().await
    }

    /// Create a vehicle after validating its name and color locally.
    ///
    /// # Errors
    ///
    /// Rejects invalid input before any network call; rejects all mutations
    /// while a race is running.
    pub async fn create(&self, name: &str, color: &str) -> Result<Vehicle> {
        self.session.ensure_unlocked()?;
        let body = NewVehicle {
            name: validate_name(name)?,
            color: validated(color)?,
        };
        let created = self.garage.create(&body).await?;
        info!(vehicle = %created.id, name = %created.name, "created vehicle");
        self.refresh().await?;
        Ok(created)
    }

    /// Update a vehicle's name and/or color.
    ///
    /// # Errors
    ///
    /// Rejects invalid input before any network call; rejects all mutations
    /// while a race is running.
    pub async fn update(
        &self,
        id: VehicleId,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Vehicle> {
        self.session.ensure_unlocked()?;
        let body = VehicleUpdate {
            name: name.map(validate_name).transpose()?,
            color: color.map(validated).transpose()?,
        };
        let updated = self.garage.update(id, &body).await?;
        self.refresh().await?;
        Ok(updated)
    }

    /// Delete a vehicle, cascading to its winner record (tolerating one that
    /// never existed) and rewinding the page when the deletion empties the
    /// tail page.
    ///
    /// # Errors
    ///
    /// Rejects all mutations while a race is running; propagates the vehicle
    /// deletion error. A ledger cascade failure (other than not-found) is
    /// logged and does not fail the deletion.
    pub async fn delete(&self, id: VehicleId) -> Result<()> {
        self.session.ensure_unlocked()?;
        self.garage.delete(id).await?;
        if let Err(e) = self.ledger.remove(id).await {
            warn!(vehicle = %id, error = %e, "winner cascade delete failed");
        }
        {
            let mut state = self.state.write();
            if state.selected == Some(id) {
                state.selected = None;
            }
            let remaining = state.total.saturating_sub(1);
            if should_rewind_page(remaining, state.page, self.page_limit) {
                state.page -= 1;
            }
        }
        self.refresh().await
    }

    /// Bulk-create `count` random vehicles, throttled. Individual failures
    /// are counted and logged, not fatal.
    ///
    /// # Errors
    ///
    /// Rejects all mutations while a race is running; the final refresh may
    /// fail.
    pub async fn generate_fleet(&self, count: u32) -> Result<FleetReport> {
        self.session.ensure_unlocked()?;
        let mut report = FleetReport::default();
        for _ in 0..count {
            let body = random_vehicle();
            match self.garage.create(&body).await {
                Ok(_) => report.created += 1,
                Err(e) => {
                    warn!(name = %body.name, error = %e, "fleet generation create failed");
                    report.failed += 1;
                }
            }
            tokio::time::sleep(GENERATE_THROTTLE).await;
        }
        info!(created = report.created, failed = report.failed, "fleet generation finished");
        self.refresh().await?;
        Ok(report)
    }

    /// Bulk-delete up to `count` vehicles from the front of the garage,
    /// cascading winner records, throttled.
    ///
    /// # Errors
    ///
    /// Rejects all mutations while a race is running; stops at the first
    /// vehicle deletion failure.
    pub async fn delete_fleet(&self, count: u32) -> Result<u32> {
        self.session.ensure_unlocked()?;
        let window = self.garage.list(1, 1000).await?;
        let ids: Vec<VehicleId> = window
            .items
            .iter()
            .take(count as usize)
            .map(|v| v.id)
            .collect();

        let mut deleted = 0;
        for id in ids {
            self.garage.delete(id).await?;
            if let Err(e) = self.ledger.remove(id).await {
                warn!(vehicle = %id, error = %e, "winner cascade delete failed");
            }
            deleted += 1;
            tokio::time::sleep(DELETE_THROTTLE).await;
        }
        info!(deleted, "fleet deletion finished");
        self.refresh().await?;
        Ok(deleted)
    }
}

fn validated(color: &str) -> std::result::Result<String, asyncrace_errors::ValidationError> {
    validate_color(color)?;
    Ok(color.to_string())
}

/// A random brand/model pairing with a random hex color.
fn random_vehicle() -> NewVehicle {
    let mut rng = rand::thread_rng();
    let brand = BRANDS[rng.gen_range(0..BRANDS.len())];
    let model = MODELS[rng.gen_range(0..MODELS.len())];
    let color: u32 = rng.gen_range(0..=0xff_ff_ff);
    NewVehicle {
        name: format!("{brand} {model}"),
        color: format!("#{color:06x}"),
    }
}

/// Whether deleting a vehicle should move the view back one page: the tail
/// page just emptied when the remaining total fills whole pages exactly.
fn should_rewind_page(total: u64, page: u32, limit: u32) -> bool {
    limit > 0 && total > 0 && total % u64::from(limit) == 0 && page > 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewind_triggers_only_on_an_emptied_tail_page() {
        // 15 cars, limit 7, viewing page 3 with one car; deleting it leaves
        // 14 = two exact pages, so the view rewinds.
        assert!(should_rewind_page(14, 3, 7));
        // Mid-page deletions do not rewind.
        assert!(!should_rewind_page(13, 2, 7));
        // Page 1 never rewinds.
        assert!(!should_rewind_page(7, 1, 7));
        // An empty garage never rewinds.
        assert!(!should_rewind_page(0, 2, 7));
    }

    #[test]
    fn random_vehicles_are_valid_input() {
        for _ in 0..100 {
            let v = random_vehicle();
            assert!(validate_name(&v.name).is_ok(), "bad name: {}", v.name);
            assert!(validate_color(&v.color).is_ok(), "bad color: {}", v.color);
        }
    }
}
