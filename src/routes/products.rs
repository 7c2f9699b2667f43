//! Public catalog reads.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::domain::Product;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::{ListParams, PaginatedResponse};

pub async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<PaginatedResponse<Product>>> {
    Ok(Json(s.stores.products.list(&p).await?))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    s.stores.products.get(id).await?.map(Json).ok_or_else(|| AppError::NotFound("Product".to_string()))
}
