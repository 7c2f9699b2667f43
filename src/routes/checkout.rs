//! Hosted checkout: create a gateway session, read it back after redirect.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use validator::Validate;

use super::AppJson;
use crate::error::{AppError, Result};
use crate::services::checkout::CheckoutRequest;
use crate::services::payments::SessionDetails;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse { pub session_id: String, pub url: String }

pub async fn create_checkout(State(s): State<AppState>, AppJson(r): AppJson<CheckoutRequest>) -> Result<Json<CheckoutResponse>> {
    r.validate()?;
    let request = r.session_request(&s.config.shipping, &s.config.public_base_url);
    let session = s.payments.create_session(&request).await?;
    tracing::info!(session_id = %session.id, lines = request.lines.len(), shipping = %request.shipping, "Checkout started");
    Ok(Json(CheckoutResponse { session_id: session.id, url: session.url }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig { pub publishable_key: Option<String>, pub currency: String }

/// Public payment settings the storefront needs to render checkout.
pub async fn client_config(State(s): State<AppState>) -> Json<ClientConfig> {
    let payments = &s.config.payments;
    Json(ClientConfig { publishable_key: payments.publishable_key.clone(), currency: payments.currency.clone() })
}

pub async fn get_session(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<SessionDetails>> {
    s.payments.retrieve_session(&id).await?.map(Json).ok_or_else(|| AppError::NotFound("Checkout session".to_string()))
}
