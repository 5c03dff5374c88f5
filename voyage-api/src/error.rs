use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use voyage_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let msg = err.to_string();
        match err {
            CoreError::OfferingNotFound(_) | CoreError::ReservationNotFound(_) => AppError::NotFoundError(msg),
            CoreError::OfferingUnavailable { .. }
            | CoreError::InsufficientCapacity { .. }
            | CoreError::InvalidTransition { .. } => AppError::ConflictError(msg),
            CoreError::InvalidHeadcount(_) | CoreError::ValidationError(_) => AppError::ValidationError(msg),
            CoreError::NotAuthorized(_) => AppError::AuthorizationError(msg),
            CoreError::PersistenceFailure(_) | CoreError::FatalInconsistency(_) => AppError::InternalServerError(msg),
        }
    }
}
