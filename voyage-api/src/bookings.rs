use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use voyage_core::{Caller, Reservation};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub note: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/mine", get(list_my_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/note", patch(update_note))
}

/// GET /v1/bookings/mine
pub async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    if caller == Caller::Anonymous {
        return Err(AppError::AuthenticationError("Authentication required".into()));
    }
    Ok(Json(state.manager.list_for_caller(&caller).await?))
}

/// GET /v1/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(state.manager.get(id, &caller).await?))
}

/// PATCH /v1/bookings/{id}/note
pub async fn update_note(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(state.manager.update_note(id, req.note, &caller).await?))
}
