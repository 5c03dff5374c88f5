use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use voyage_core::{Reservation, ReservationRepository, ReservationState, StoreError};

/// Booking store kept in process memory. Each compare-and-set runs under the
/// write lock, which gives the same guarantees as a conditional UPDATE.
pub struct InMemoryReservationRepository {
    reservations: RwLock<HashMap<Uuid, Reservation>>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self {
            reservations: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryReservationRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(mut reservations: Vec<Reservation>) -> Vec<Reservation> {
    reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    reservations
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn create(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut reservations = self.reservations.write().await;
        if reservations.contains_key(&reservation.id) {
            return Err(StoreError::Duplicate(reservation.id));
        }
        reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }

    async fn update_state(
        &self,
        id: Uuid,
        expected: ReservationState,
        next: ReservationState,
    ) -> Result<bool, StoreError> {
        let mut reservations = self.reservations.write().await;
        match reservations.get_mut(&id) {
            Some(reservation) if reservation.state == expected => {
                reservation.state = next;
                reservation.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_note(&self, id: Uuid, note: Option<&str>) -> Result<bool, StoreError> {
        let mut reservations = self.reservations.write().await;
        match reservations.get_mut(&id) {
            Some(reservation) => {
                reservation.note = note.map(str::to_string);
                reservation.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid, expected: ReservationState) -> Result<bool, StoreError> {
        let mut reservations = self.reservations.write().await;
        match reservations.get(&id) {
            Some(reservation) if reservation.state == expected => {
                reservations.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_offering(&self, offering_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(newest_first(
            reservations
                .values()
                .filter(|r| r.tour_id == offering_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(newest_first(
            reservations
                .values()
                .filter(|r| r.is_owned_by(user_id))
                .cloned()
                .collect(),
        ))
    }
}
