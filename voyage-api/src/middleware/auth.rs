use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use voyage_core::Caller;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn caller(&self) -> Caller {
        match self.role.as_str() {
            "ADMIN" | "SUPER_ADMIN" => Caller::Admin(self.sub.clone()),
            _ => Caller::Customer(self.sub.clone()),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(Some)
        .ok_or_else(|| AppError::AuthenticationError("Malformed Authorization header".into()))
}

// ============================================================================
// Caller Resolution
// ============================================================================

/// Attach a [`Caller`] to every request. No token means anonymous; a token
/// that fails verification is rejected outright.
pub async fn resolve_caller(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = match bearer_token(req.headers())? {
        None => Caller::Anonymous,
        Some(token) => {
            let token_data = decode::<Claims>(
                token,
                &DecodingKey::from_secret(state.auth.secret.as_bytes()),
                &Validation::default(),
            )
            .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))?;
            token_data.claims.caller()
        }
    };

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

// ============================================================================
// Admin Gate
// ============================================================================

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    match req.extensions().get::<Caller>() {
        Some(caller) if caller.is_admin() => Ok(next.run(req).await),
        Some(Caller::Customer(_)) => Err(AppError::AuthorizationError("Administrator role required".into())),
        _ => Err(AppError::AuthenticationError("Authentication required".into())),
    }
}
