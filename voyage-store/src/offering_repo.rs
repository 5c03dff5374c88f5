use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;
use voyage_core::{
    CapacityLedger, LedgerError, NewOffering, Offering, OfferingStatus, OfferingStore, OfferingUpdate,
    ReleaseOutcome, ReserveOutcome, SeatSnapshot, StoreError,
};

/// Tours table, serving both the catalog and the capacity ledger. Every
/// counter change is a single conditional UPDATE, so the row lock taken by
/// Postgres is the per-tour critical section.
pub struct PgOfferingStore {
    pool: PgPool,
}

impl PgOfferingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TourRow {
    id: Uuid,
    name: String,
    capacity: i32,
    available: i32,
    adult_price: i64,
    child_price: Option<i64>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TourRow> for Offering {
    type Error = StoreError;

    fn try_from(row: TourRow) -> Result<Self, Self::Error> {
        let status: OfferingStatus = row
            .status
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("tour {} has status '{}'", row.id, row.status)))?;

        Ok(Offering {
            id: row.id,
            name: row.name,
            capacity: row.capacity,
            available: row.available,
            adult_price: row.adult_price,
            child_price: row.child_price,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    capacity: i32,
    available: i32,
}

#[derive(sqlx::FromRow)]
struct ReleaseRow {
    available: i32,
    clamped: i32,
}

const TOUR_COLUMNS: &str =
    "id, name, capacity, available, adult_price, child_price, status, created_at, updated_at";

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(Box::new(e))
}

fn ledger_storage(e: sqlx::Error) -> LedgerError {
    LedgerError::Storage(Box::new(e))
}

#[async_trait]
impl OfferingStore for PgOfferingStore {
    async fn create_offering(&self, new: &NewOffering) -> Result<Offering, StoreError> {
        let offering = Offering::from_new(new);

        sqlx::query(
            "INSERT INTO tours (id, name, capacity, available, adult_price, child_price, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(offering.id)
        .bind(&offering.name)
        .bind(offering.capacity)
        .bind(offering.available)
        .bind(offering.adult_price)
        .bind(offering.child_price)
        .bind(offering.status.as_str())
        .bind(offering.created_at)
        .bind(offering.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        info!("Tour created: {} ({} seats)", offering.id, offering.capacity);
        Ok(offering)
    }

    async fn get_offering(&self, id: Uuid) -> Result<Option<Offering>, StoreError> {
        let row = sqlx::query_as::<_, TourRow>(&format!("SELECT {} FROM tours WHERE id = $1", TOUR_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(Offering::try_from).transpose()
    }

    async fn list_offerings(&self) -> Result<Vec<Offering>, StoreError> {
        let rows = sqlx::query_as::<_, TourRow>(&format!(
            "SELECT {} FROM tours ORDER BY created_at ASC",
            TOUR_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Offering::try_from).collect()
    }

    async fn update_offering(&self, id: Uuid, update: &OfferingUpdate) -> Result<Option<Offering>, StoreError> {
        // Seat counters are only written through the ledger methods below.
        let row = sqlx::query_as::<_, TourRow>(&format!(
            "UPDATE tours SET \
                name = COALESCE($2, name), \
                adult_price = COALESCE($3, adult_price), \
                child_price = CASE WHEN $4 THEN $5 ELSE child_price END, \
                status = COALESCE($6, status), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            TOUR_COLUMNS
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.adult_price)
        .bind(update.child_price.is_some())
        .bind(update.child_price.flatten())
        .bind(update.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Offering::try_from).transpose()
    }
}

#[async_trait]
impl CapacityLedger for PgOfferingStore {
    async fn try_reserve(&self, offering_id: Uuid, headcount: i32) -> Result<ReserveOutcome, LedgerError> {
        if headcount <= 0 {
            return Err(LedgerError::InvalidHeadcount(headcount));
        }

        let reserved: Option<i32> = sqlx::query_scalar(
            "UPDATE tours SET available = available - $2, updated_at = NOW() \
             WHERE id = $1 AND available >= $2 \
             RETURNING available",
        )
        .bind(offering_id)
        .bind(headcount)
        .fetch_optional(&self.pool)
        .await
        .map_err(ledger_storage)?;

        if let Some(available) = reserved {
            return Ok(ReserveOutcome::Reserved { available });
        }

        // Either the tour is missing or it has too few seats left.
        let seats = self.peek(offering_id).await?;
        Ok(ReserveOutcome::Insufficient {
            available: seats.available,
        })
    }

    async fn release(&self, offering_id: Uuid, headcount: i32) -> Result<ReleaseOutcome, LedgerError> {
        if headcount <= 0 {
            return Err(LedgerError::InvalidHeadcount(headcount));
        }

        let row = sqlx::query_as::<_, ReleaseRow>(
            "WITH prev AS ( \
                SELECT id, available, capacity FROM tours WHERE id = $1 FOR UPDATE \
             ) \
             UPDATE tours t SET available = LEAST(prev.available + $2, prev.capacity), updated_at = NOW() \
             FROM prev WHERE t.id = prev.id \
             RETURNING t.available, GREATEST(prev.available + $2 - prev.capacity, 0) AS clamped",
        )
        .bind(offering_id)
        .bind(headcount)
        .fetch_optional(&self.pool)
        .await
        .map_err(ledger_storage)?
        .ok_or(LedgerError::NotFound(offering_id))?;

        if row.clamped > 0 {
            error!(
                "Release on tour {} exceeded capacity: requested {}, dropped {}",
                offering_id, headcount, row.clamped
            );
        }

        Ok(ReleaseOutcome {
            available: row.available,
            clamped: row.clamped,
        })
    }

    async fn peek(&self, offering_id: Uuid) -> Result<SeatSnapshot, LedgerError> {
        let row = sqlx::query_as::<_, SeatRow>("SELECT capacity, available FROM tours WHERE id = $1")
            .bind(offering_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ledger_storage)?
            .ok_or(LedgerError::NotFound(offering_id))?;

        Ok(SeatSnapshot {
            capacity: row.capacity,
            available: row.available,
        })
    }
}
