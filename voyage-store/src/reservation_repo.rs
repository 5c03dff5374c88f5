use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use voyage_core::{Contact, Reservation, ReservationRepository, ReservationState, StoreError};
use voyage_shared::Masked;

pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    tour_id: Uuid,
    contact_name: String,
    contact_email: String,
    contact_phone: String,
    contact_address: String,
    adults: i32,
    children: i32,
    departure_date: NaiveDate,
    total_price: i64,
    state: String,
    user_id: Option<String>,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let state: ReservationState = row
            .state
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("booking {} has state '{}'", row.id, row.state)))?;

        Ok(Reservation {
            id: row.id,
            tour_id: row.tour_id,
            contact: Contact {
                name: row.contact_name,
                email: Masked(row.contact_email),
                phone: Masked(row.contact_phone),
                address: row.contact_address,
            },
            adults: row.adults,
            children: row.children,
            departure_date: row.departure_date,
            total_price: row.total_price,
            state,
            user_id: row.user_id,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, tour_id, contact_name, contact_email, contact_phone, contact_address, \
     adults, children, departure_date, total_price, state, user_id, note, created_at, updated_at";

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(Box::new(e))
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn create(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let result = sqlx::query(&format!(
            "INSERT INTO bookings ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            BOOKING_COLUMNS
        ))
        .bind(reservation.id)
        .bind(reservation.tour_id)
        .bind(&reservation.contact.name)
        .bind(reservation.contact.email.expose())
        .bind(reservation.contact.phone.expose())
        .bind(&reservation.contact.address)
        .bind(reservation.adults)
        .bind(reservation.children)
        .bind(reservation.departure_date)
        .bind(reservation.total_price)
        .bind(reservation.state.as_str())
        .bind(reservation.user_id.as_deref())
        .bind(reservation.note.as_deref())
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate(reservation.id))
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Reservation::try_from).transpose()
    }

    async fn update_state(
        &self,
        id: Uuid,
        expected: ReservationState,
        next: ReservationState,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE bookings SET state = $3, updated_at = NOW() WHERE id = $1 AND state = $2",
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_note(&self, id: Uuid, note: Option<&str>) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE bookings SET note = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(note)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: Uuid, expected: ReservationState) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1 AND state = $2")
            .bind(id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_by_offering(&self, offering_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE tour_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(offering_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }
}
