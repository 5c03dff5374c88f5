use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use voyage_booking::LedgerAudit;
use voyage_core::{Caller, CoreError, NewOffering, OfferingUpdate, Reservation, ReservationState};

use crate::error::AppError;
use crate::state::AppState;
use crate::tours::{CreateBookingRequest, TourResponse};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateBookingRequest {
    #[serde(default)]
    pub state: Option<ReservationState>,
    #[serde(default)]
    pub note: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/tours", post(create_tour))
        .route("/v1/admin/tours/{id}", patch(update_tour))
        .route("/v1/admin/tours/{id}/bookings", post(create_booking).get(list_bookings))
        .route("/v1/admin/tours/{id}/audit", get(audit_tour))
        .route("/v1/admin/bookings/{id}", patch(update_booking).delete(delete_booking))
}

// ============================================================================
// Tour Management
// ============================================================================

/// POST /v1/admin/tours
pub async fn create_tour(
    State(state): State<AppState>,
    Json(req): Json<NewOffering>,
) -> Result<(StatusCode, Json<TourResponse>), AppError> {
    req.validate()?;
    let tour = state.offerings.create_offering(&req).await.map_err(CoreError::from)?;
    Ok((StatusCode::CREATED, Json(TourResponse::from(tour))))
}

/// PATCH /v1/admin/tours/{id}
///
/// Capacity is not editable here.
pub async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<OfferingUpdate>,
) -> Result<Json<TourResponse>, AppError> {
    req.validate()?;
    let tour = state
        .offerings
        .update_offering(id, &req)
        .await
        .map_err(CoreError::from)?
        .ok_or(CoreError::OfferingNotFound(id))?;
    Ok(Json(TourResponse::from(tour)))
}

/// GET /v1/admin/tours/{id}/audit
pub async fn audit_tour(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<LedgerAudit>, AppError> {
    Ok(Json(state.manager.audit_offering(id, &caller).await?))
}

// ============================================================================
// Booking Management
// ============================================================================

/// POST /v1/admin/tours/{id}/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(tour_id): Path<Uuid>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let booking = state.manager.create_confirmed(req.into_draft(tour_id), &caller).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/admin/tours/{id}/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(tour_id): Path<Uuid>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(state.manager.list_for_offering(tour_id, &caller).await?))
}

/// PATCH /v1/admin/bookings/{id}
///
/// State change first, then the note.
pub async fn update_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<Json<Reservation>, AppError> {
    if req.state.is_none() && req.note.is_none() {
        return Err(AppError::ValidationError("Nothing to update".into()));
    }

    let mut booking = match req.state {
        Some(target) => state.manager.transition(id, target, &caller).await?,
        None => state.manager.get(id, &caller).await?,
    };
    if let Some(note) = req.note {
        booking = state.manager.update_note(id, Some(note), &caller).await?;
    }
    Ok(Json(booking))
}

/// DELETE /v1/admin/bookings/{id}
pub async fn delete_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.manager.delete(id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
