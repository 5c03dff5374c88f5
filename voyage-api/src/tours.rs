use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voyage_core::{Caller, Contact, CoreError, Offering, OfferingStatus, Reservation, ReservationDraft};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub contact: Contact,
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
    pub departure_date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    /// Honoured for admin-entered bookings only.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl CreateBookingRequest {
    pub fn into_draft(self, tour_id: Uuid) -> ReservationDraft {
        ReservationDraft {
            tour_id,
            contact: self.contact,
            adults: self.adults,
            children: self.children,
            departure_date: self.departure_date,
            note: self.note,
            user_id: self.user_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TourResponse {
    pub id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub available: i32,
    pub adult_price: i64,
    pub child_price: Option<i64>,
    pub status: OfferingStatus,
    pub is_full: bool,
}

impl From<Offering> for TourResponse {
    fn from(tour: Offering) -> Self {
        Self {
            is_full: tour.is_full(),
            id: tour.id,
            name: tour.name,
            capacity: tour.capacity,
            available: tour.available,
            adult_price: tour.adult_price,
            child_price: tour.child_price,
            status: tour.status,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tours", get(list_tours))
        .route("/v1/tours/{id}", get(get_tour))
        .route("/v1/tours/{id}/bookings", post(create_booking))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/tours
pub async fn list_tours(State(state): State<AppState>) -> Result<Json<Vec<TourResponse>>, AppError> {
    let tours = state
        .offerings
        .list_offerings()
        .await
        .map_err(CoreError::from)?;

    Ok(Json(tours.into_iter().map(TourResponse::from).collect()))
}

/// GET /v1/tours/{id}
///
/// Seat counts come from the ledger, not the catalog row.
pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TourResponse>, AppError> {
    let tour = state
        .offerings
        .get_offering(id)
        .await
        .map_err(CoreError::from)?
        .ok_or(CoreError::OfferingNotFound(id))?;
    let seats = state.ledger.peek(id).await.map_err(CoreError::from)?;

    let mut response = TourResponse::from(tour);
    response.capacity = seats.capacity;
    response.available = seats.available;
    response.is_full = seats.is_full();
    Ok(Json(response))
}

/// POST /v1/tours/{id}/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(tour_id): Path<Uuid>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let booking = state.manager.create_pending(req.into_draft(tour_id), &caller).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}
