//! Unified handler error.
//!
//! Every route returns `Result<T, AppError>`. Server-side failures are logged
//! here and answered with a generic message so no internals reach the client.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::ProductError;
use crate::services::auth::AuthError;
use crate::services::ingestion::IngestError;
use crate::services::payments::PaymentError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::MissingSessionId => Self::BadRequest(e.to_string()),
            IngestError::Store(e) => Self::Store(e),
        }
    }
}

impl From<ProductError> for AppError {
    fn from(e: ProductError) -> Self { Self::BadRequest(e.to_string()) }
}

/// Unreadable request bodies get the same 400 `{"error": ...}` shape as validation failures.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors.field_errors().into_values().flatten().next()
            .map(|e| e.message.as_ref().map_or_else(|| format!("Invalid {}", e.code), ToString::to_string))
            .unwrap_or_else(|| "Invalid request".to_string());
        Self::BadRequest(message)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::Forbidden => StatusCode::FORBIDDEN,
                AuthError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
            tracing::error!(error = %self, "Request error");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Payment(_) => "Payment provider error".to_string(),
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Auth(AuthError::InvalidToken(_)) => "Invalid or expired token".to_string(),
            Self::Auth(AuthError::Forbidden) => "Admin access required".to_string(),
            Self::Auth(AuthError::Hashing(_)) => "Internal server error".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: AppError) -> StatusCode { err.into_response().status() }

    #[test]
    fn test_app_error_display() {
        assert_eq!(AppError::NotFound("Product".into()).to_string(), "Not found: Product");
        assert_eq!(AppError::BadRequest("invalid input".into()).to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::Auth(AuthError::Forbidden)), StatusCode::FORBIDDEN);
        assert_eq!(status(AppError::from(IngestError::MissingSessionId)), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::Store(StoreError::Conflict("x".into()))), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(AppError::from(ProductError::NoSizes)), StatusCode::BAD_REQUEST);
    }
}
