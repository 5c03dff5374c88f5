pub mod offering;
pub mod reservation;
pub mod ledger;
pub mod repository;
pub mod identity;
pub mod notify;

pub use identity::Caller;
pub use ledger::{CapacityLedger, LedgerError, ReleaseOutcome, ReserveOutcome, SeatSnapshot};
pub use notify::{LogNotifier, NotificationEmitter};
pub use offering::{NewOffering, Offering, OfferingStatus, OfferingUpdate};
pub use repository::{OfferingStore, ReservationRepository, StoreError};
pub use reservation::{Contact, Reservation, ReservationDraft, ReservationState};

use uuid::Uuid;

/// Errors surfaced by the reservation lifecycle to its callers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Tour not found: {0}")]
    OfferingNotFound(Uuid),

    #[error("Booking not found: {0}")]
    ReservationNotFound(Uuid),

    #[error("Tour {offering_id} is not open for booking (status {status})")]
    OfferingUnavailable {
        offering_id: Uuid,
        status: OfferingStatus,
    },

    #[error("Invalid headcount: {0}")]
    InvalidHeadcount(String),

    #[error("Insufficient capacity on tour {offering_id}: requested {requested}, available {available}")]
    InsufficientCapacity {
        offering_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: ReservationState,
        to: String,
    },

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Fatal inconsistency, operator attention required: {0}")]
    FatalInconsistency(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl CoreError {
    /// Expected rejections a customer can trigger on their own; everything
    /// else is a system fault and gets logged with full context.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CoreError::InsufficientCapacity { .. } | CoreError::OfferingUnavailable { .. }
        )
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::PersistenceFailure(err.to_string())
    }
}

impl From<LedgerError> for CoreError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(id) => CoreError::OfferingNotFound(id),
            LedgerError::InvalidHeadcount(n) => {
                CoreError::InvalidHeadcount(format!("headcount must be positive, got {}", n))
            }
            LedgerError::Storage(e) => CoreError::PersistenceFailure(e.to_string()),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
