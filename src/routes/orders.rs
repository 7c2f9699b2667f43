//! Order ingestion and order reads.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::AppJson;
use crate::domain::{Order, SessionId};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentCustomer, RequireAdmin};
use crate::services::ingestion::{IngestOutcome, IngestRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderResponse { pub order: Option<Order>, pub message: &'static str }

/// `POST /api/orders`: record a paid checkout session.
pub async fn create_order(State(s): State<AppState>, AppJson(r): AppJson<IngestRequest>) -> Result<(StatusCode, Json<OrderResponse>)> {
    let response = match s.ingestion.ingest(r).await? {
        IngestOutcome::Created(order) => (StatusCode::CREATED, OrderResponse { order: Some(order), message: "Order created" }),
        IngestOutcome::Duplicate(order) => (StatusCode::OK, OrderResponse { order: Some(order), message: "Order already exists" }),
        IngestOutcome::NothingToRecord => (StatusCode::OK, OrderResponse { order: None, message: "No items to record" }),
    };
    Ok((response.0, Json(response.1)))
}

/// `GET /api/orders`: every order, newest first. Admin only.
pub async fn list_orders(State(s): State<AppState>, RequireAdmin(_): RequireAdmin) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.stores.orders.list().await?))
}

/// `GET /api/orders/mine`: the signed-in customer's order history.
pub async fn my_orders(State(s): State<AppState>, CurrentCustomer(customer): CurrentCustomer) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.stores.orders.list_for_user(&customer.sub).await?))
}

/// `GET /api/orders/session/:session_id`: what the confirmation page shows after redirect.
pub async fn order_by_session(State(s): State<AppState>, Path(session_id): Path<String>) -> Result<Json<Order>> {
    let session_id = SessionId::parse(Some(&session_id)).map_err(|e| AppError::BadRequest(e.to_string()))?;
    s.stores.orders.find_by_session(&session_id).await?.map(Json).ok_or_else(|| AppError::NotFound("Order".to_string()))
}
