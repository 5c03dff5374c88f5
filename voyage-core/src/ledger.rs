use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only view of a tour's counters. Display only; a snapshot is not a
/// reservation guarantee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatSnapshot {
    pub capacity: i32,
    pub available: i32,
}

impl SeatSnapshot {
    pub fn is_full(&self) -> bool {
        self.available == 0
    }
}

/// Result of an atomic check-and-decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Seats are held; `available` is the counter after the decrement.
    Reserved { available: i32 },
    /// Nothing was mutated; `available` is what the ledger saw.
    Insufficient { available: i32 },
}

impl ReserveOutcome {
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReserveOutcome::Reserved { .. })
    }
}

/// Result of a release. `clamped` is the part of the request that would have
/// pushed `available` above `capacity` and was dropped; anything non-zero
/// means an earlier bookkeeping bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub available: i32,
    pub clamped: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Tour not found in ledger: {0}")]
    NotFound(Uuid),

    #[error("Headcount must be positive, got {0}")]
    InvalidHeadcount(i32),

    #[error("Ledger storage failure: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    /// Storage faults may succeed on retry; the others never will.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}

/// The only component allowed to read-and-modify a tour's `available`
/// counter. Every implementation must make `try_reserve` atomic per tour:
/// concurrent callers can never succeed in aggregate for more seats than the
/// tour has.
#[async_trait]
pub trait CapacityLedger: Send + Sync {
    async fn try_reserve(&self, offering_id: Uuid, headcount: i32) -> Result<ReserveOutcome, LedgerError>;

    async fn release(&self, offering_id: Uuid, headcount: i32) -> Result<ReleaseOutcome, LedgerError>;

    async fn peek(&self, offering_id: Uuid) -> Result<SeatSnapshot, LedgerError>;
}
