use async_trait::async_trait;
use uuid::Uuid;

use crate::offering::{NewOffering, Offering, OfferingUpdate};
use crate::reservation::{Reservation, ReservationState};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate record: {0}")]
    Duplicate(Uuid),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Storage backend failure: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Tour catalog access. Capacity counters are read here but only ever
/// written through [`crate::CapacityLedger`].
#[async_trait]
pub trait OfferingStore: Send + Sync {
    async fn create_offering(&self, new: &NewOffering) -> Result<Offering, StoreError>;

    async fn get_offering(&self, id: Uuid) -> Result<Option<Offering>, StoreError>;

    async fn list_offerings(&self) -> Result<Vec<Offering>, StoreError>;

    async fn update_offering(
        &self,
        id: Uuid,
        update: &OfferingUpdate,
    ) -> Result<Option<Offering>, StoreError>;
}

/// Persistence boundary for bookings.
///
/// `update_state` and `delete` are compare-and-set on the stored state: they
/// return `false` without touching anything when the record is missing or
/// its state is no longer `expected`. The lifecycle manager relies on this
/// so that two racing cancellations release seats once.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn create(&self, reservation: &Reservation) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, StoreError>;

    async fn update_state(
        &self,
        id: Uuid,
        expected: ReservationState,
        next: ReservationState,
    ) -> Result<bool, StoreError>;

    async fn update_note(&self, id: Uuid, note: Option<&str>) -> Result<bool, StoreError>;

    async fn delete(&self, id: Uuid, expected: ReservationState) -> Result<bool, StoreError>;

    async fn list_by_offering(&self, offering_id: Uuid) -> Result<Vec<Reservation>, StoreError>;

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, StoreError>;
}
