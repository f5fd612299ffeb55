//! Winner ledger: read-modify-write against the winners table.
//!
//! The cycle is not atomic. Concurrent races are prevented structurally by
//! the one-race-at-a-time session guard, so no locking is needed; if the
//! table was mutated externally between read and write, last-write-wins is
//! acceptable.

use std::sync::Arc;

use asyncrace_api::{VehicleId, Winner, WinnerStore, WinnerUpdate};
use asyncrace_errors::LedgerError;
use tracing::{debug, info, warn};

/// Upserts winner records for race winners.
#[derive(Clone)]
pub struct WinnerLedger {
    store: Arc<dyn WinnerStore>,
}

impl WinnerLedger {
    /// Create a ledger over a winner store.
    pub fn new(store: Arc<dyn WinnerStore>) -> Self {
        Self { store }
    }

    /// Record a win: first win creates `{wins: 1, time}`, later wins bump
    /// the count and keep the best (lowest) time.
    ///
    /// # Errors
    ///
    /// Ledger failures are logged here and returned for surfacing, but they
    /// are never fatal to a race: callers report the announced winner
    /// regardless.
    pub async fn upsert(&self, id: VehicleId, elapsed_ms: f64) -> Result<Winner, LedgerError> {
        let existing = match self.store.get(id).await {
            Ok(existing) => existing,
            Err(source) => {
                warn!(vehicle = %id, error = %source, "winner record read failed");
                return Err(LedgerError::Read { id: id.0, source });
            }
        };

        match existing {
            Some(record) => {
                let update = WinnerUpdate {
                    wins: record.wins.saturating_add(1),
                    time: record.time.min(elapsed_ms),
                };
                match self.store.update(id, &update).await {
                    Ok(updated) => {
                        info!(vehicle = %id, wins = updated.wins, time_ms = updated.time, "winner record updated");
                        Ok(updated)
                    }
                    Err(source) => {
                        warn!(vehicle = %id, error = %source, "winner record update failed");
                        Err(LedgerError::Write { id: id.0, source })
                    }
                }
            }
            None => {
                // 404 on read is the expected first-win path.
                let record = Winner {
                    id,
                    wins: 1,
                    time: elapsed_ms,
                };
                match self.store.create(&record).await {
                    Ok(created) => {
                        info!(vehicle = %id, time_ms = created.time, "first win recorded");
                        Ok(created)
                    }
                    Err(source) => {
                        warn!(vehicle = %id, error = %source, "winner record create failed");
                        Err(LedgerError::Write { id: id.0, source })
                    }
                }
            }
        }
    }

    /// Remove the record for a vehicle, tolerating one that never existed.
    /// Used when a vehicle deletion cascades into the winners table.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Delete`] on anything other than not-found.
    pub async fn remove(&self, id: VehicleId) -> Result<(), LedgerError> {
        match self.store.delete(id).await {
            Ok(()) => Ok(()),
            Err(source) if source.is_not_found() => {
                debug!(vehicle = %id, "no winner record to cascade-delete");
                Ok(())
            }
            Err(source) => {
                warn!(vehicle = %id, error = %source, "winner record delete failed");
                Err(LedgerError::Delete { id: id.0, source })
            }
        }
    }
}

impl std::fmt::Debug for WinnerLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinnerLedger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asyncrace_test_helpers::MemoryWinnerStore;

    #[tokio::test]
    async fn first_win_creates_the_record() -> Result<(), LedgerError> {
        let store = Arc::new(MemoryWinnerStore::default());
        let ledger = WinnerLedger::new(store.clone());

        let record = ledger.upsert(VehicleId(2), 5000.0).await?;
        assert_eq!(record.wins, 1);
        assert!((record.time - 5000.0).abs() < 1e-9);
        assert_eq!(store.records().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn repeated_wins_accumulate_and_keep_the_best_time() -> Result<(), LedgerError> {
        let store = Arc::new(MemoryWinnerStore::default());
        let ledger = WinnerLedger::new(store);

        ledger.upsert(VehicleId(2), 5200.0).await?;
        let record = ledger.upsert(VehicleId(2), 4800.0).await?;
        assert_eq!(record.wins, 2);
        assert!((record.time - 4800.0).abs() < 1e-9);

        // A slower third win keeps the best time.
        let record = ledger.upsert(VehicleId(2), 9000.0).await?;
        assert_eq!(record.wins, 3);
        assert!((record.time - 4800.0).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn win_order_does_not_change_the_final_record() -> Result<(), LedgerError> {
        let fast_first = Arc::new(MemoryWinnerStore::default());
        let ledger = WinnerLedger::new(fast_first.clone());
        ledger.upsert(VehicleId(1), 4000.0).await?;
        ledger.upsert(VehicleId(1), 6000.0).await?;

        let slow_first = Arc::new(MemoryWinnerStore::default());
        let ledger = WinnerLedger::new(slow_first.clone());
        ledger.upsert(VehicleId(1), 6000.0).await?;
        ledger.upsert(VehicleId(1), 4000.0).await?;

        let a = fast_first.records();
        let b = slow_first.records();
        assert_eq!(a.first().map(|w| w.wins), Some(2));
        assert_eq!(b.first().map(|w| w.wins), Some(2));
        let best_a = a.first().map(|w| w.time).unwrap_or_default();
        let best_b = b.first().map(|w| w.time).unwrap_or_default();
        assert!((best_a - 4000.0).abs() < 1e-9);
        assert!((best_b - 4000.0).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn write_failure_is_surfaced_not_swallowed() {
        let store = Arc::new(MemoryWinnerStore::default());
        store.fail_writes(true);
        let ledger = WinnerLedger::new(store);

        let result = ledger.upsert(VehicleId(3), 4100.0).await;
        assert!(matches!(result, Err(LedgerError::Write { id: 3, .. })));
    }

    #[tokio::test]
    async fn remove_tolerates_a_missing_record() -> Result<(), LedgerError> {
        let store = Arc::new(MemoryWinnerStore::default());
        let ledger = WinnerLedger::new(store);
        ledger.remove(VehicleId(42)).await
    }
}
