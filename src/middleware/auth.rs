//! Bearer-token guards.
//!
//! `require_admin` wraps the whole admin router so a rejected request never
//! reaches a handler. `RequireAdmin` and `CurrentCustomer` are extractors for
//! individual routes outside that router.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::{AdminClaims, CustomerClaims};
use crate::state::AppState;

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts.headers.get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))
}

/// Middleware for admin-only routers. Verified claims are left in request extensions.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();
    let RequireAdmin(claims) = RequireAdmin::from_request_parts(&mut parts, &state).await?;
    parts.extensions.insert(claims);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Extractor that requires an admin-role token.
pub struct RequireAdmin(pub AdminClaims);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<AdminClaims>() {
            return Ok(Self(claims.clone()));
        }
        let claims = state.tokens.verify_admin(bearer_token(parts)?).map_err(|e| {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Admin token rejected");
            AppError::from(e)
        })?;
        Ok(Self(claims))
    }
}

/// Extractor for a signed-in customer, verified against the identity provider's secret.
pub struct CurrentCustomer(pub CustomerClaims);

#[async_trait]
impl FromRequestParts<AppState> for CurrentCustomer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(state.tokens.verify_customer(bearer_token(parts)?)?))
    }
}
