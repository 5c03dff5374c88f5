use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{error, info};
use uuid::Uuid;
use voyage_core::{
    CapacityLedger, LedgerError, NewOffering, Offering, OfferingStore, OfferingUpdate, ReleaseOutcome,
    ReserveOutcome, SeatSnapshot, StoreError,
};

/// In-process tour catalog and capacity ledger.
///
/// Each tour sits behind its own mutex, so the check-and-decrement in
/// `reserve` is a single critical section per tour while different tours
/// never wait on each other. The outer map lock is only held long enough to
/// clone the tour's handle.
pub struct InventoryManager {
    inventory: RwLock<HashMap<Uuid, Arc<Mutex<Offering>>>>,
}

impl InventoryManager {
    pub fn new() -> Self {
        Self {
            inventory: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tour; `available` starts at `capacity`.
    pub fn initialize(&self, new: &NewOffering) -> Offering {
        let offering = Offering::from_new(new);
        self.inventory
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(offering.id, Arc::new(Mutex::new(offering.clone())));
        offering
    }

    fn slot(&self, offering_id: &Uuid) -> Option<Arc<Mutex<Offering>>> {
        self.inventory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(offering_id)
            .cloned()
    }

    fn lock(slot: &Mutex<Offering>) -> MutexGuard<'_, Offering> {
        // Counter writes are the last step under the lock.
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, offering_id: &Uuid) -> Option<Offering> {
        self.slot(offering_id).map(|slot| Self::lock(&slot).clone())
    }

    /// Atomically check `available >= headcount` and decrement.
    pub fn reserve(&self, offering_id: &Uuid, headcount: i32) -> Result<ReserveOutcome, LedgerError> {
        if headcount <= 0 {
            return Err(LedgerError::InvalidHeadcount(headcount));
        }
        let slot = self.slot(offering_id).ok_or(LedgerError::NotFound(*offering_id))?;
        let mut item = Self::lock(&slot);

        if item.available < headcount {
            return Ok(ReserveOutcome::Insufficient {
                available: item.available,
            });
        }

        item.available -= headcount;
        Ok(ReserveOutcome::Reserved {
            available: item.available,
        })
    }

    /// Give seats back, never past `capacity`.
    pub fn release(&self, offering_id: &Uuid, headcount: i32) -> Result<ReleaseOutcome, LedgerError> {
        if headcount <= 0 {
            return Err(LedgerError::InvalidHeadcount(headcount));
        }
        let slot = self.slot(offering_id).ok_or(LedgerError::NotFound(*offering_id))?;
        let mut item = Self::lock(&slot);

        let target = item.available.saturating_add(headcount);
        let clamped = (target - item.capacity).max(0);
        item.available = target.min(item.capacity);

        if clamped > 0 {
            error!(
                "Release on tour {} exceeded capacity {}: requested {}, dropped {}",
                offering_id, item.capacity, headcount, clamped
            );
        }

        Ok(ReleaseOutcome {
            available: item.available,
            clamped,
        })
    }

    pub fn snapshot(&self, offering_id: &Uuid) -> Result<SeatSnapshot, LedgerError> {
        let slot = self.slot(offering_id).ok_or(LedgerError::NotFound(*offering_id))?;
        let item = Self::lock(&slot);
        Ok(SeatSnapshot {
            capacity: item.capacity,
            available: item.available,
        })
    }
}

impl Default for InventoryManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapacityLedger for InventoryManager {
    async fn try_reserve(&self, offering_id: Uuid, headcount: i32) -> Result<ReserveOutcome, LedgerError> {
        self.reserve(&offering_id, headcount)
    }

    async fn release(&self, offering_id: Uuid, headcount: i32) -> Result<ReleaseOutcome, LedgerError> {
        InventoryManager::release(self, &offering_id, headcount)
    }

    async fn peek(&self, offering_id: Uuid) -> Result<SeatSnapshot, LedgerError> {
        self.snapshot(&offering_id)
    }
}

#[async_trait]
impl OfferingStore for InventoryManager {
    async fn create_offering(&self, new: &NewOffering) -> Result<Offering, StoreError> {
        let offering = self.initialize(new);
        info!("Tour created: {} ({} seats)", offering.id, offering.capacity);
        Ok(offering)
    }

    async fn get_offering(&self, id: Uuid) -> Result<Option<Offering>, StoreError> {
        Ok(self.get(&id))
    }

    async fn list_offerings(&self) -> Result<Vec<Offering>, StoreError> {
        let slots: Vec<_> = self
            .inventory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let mut offerings: Vec<Offering> = slots.iter().map(|slot| Self::lock(slot).clone()).collect();
        offerings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(offerings)
    }

    async fn update_offering(&self, id: Uuid, update: &OfferingUpdate) -> Result<Option<Offering>, StoreError> {
        let Some(slot) = self.slot(&id) else {
            return Ok(None);
        };
        let mut item = Self::lock(&slot);
        item.apply(update);
        Ok(Some(item.clone()))
    }
}
