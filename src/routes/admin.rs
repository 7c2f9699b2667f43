//! Admin console API: login, product CRUD, order search and store stats.
//!
//! Everything except `login` is mounted behind `require_admin`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::AppJson;
use crate::domain::{AdminUser, Order, Product, ProductDraft};
use crate::error::{AppError, Result};
use crate::services::analytics::{self, StoreStats};
use crate::services::auth::{self, AdminClaims, AuthError, IssuedToken};
use crate::state::AppState;
use crate::store::{ListParams, PaginatedResponse, StoreError};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

pub async fn login(State(s): State<AppState>, AppJson(r): AppJson<LoginRequest>) -> Result<Json<IssuedToken>> {
    r.validate()?;
    let admin = s.stores.admins.find_by_email(&r.email).await?;
    let Some(admin) = admin.filter(|a| auth::verify_password(&r.password, &a.password_hash)) else {
        tracing::warn!(email = %r.email, "Admin login failed");
        return Err(AuthError::InvalidCredentials.into());
    };
    tracing::info!(admin_id = %admin.id, "Admin logged in");
    Ok(Json(s.tokens.issue_admin_token(&admin)?))
}

/// Creates the first admin account unless one with that email exists already.
pub async fn ensure_admin(s: &AppState, email: &str, password: &SecretString) -> Result<()> {
    if s.stores.admins.find_by_email(email).await?.is_some() { return Ok(()); }
    let admin = AdminUser::new(email, auth::hash_password(password.expose_secret())?);
    match s.stores.admins.insert(&admin).await {
        Ok(()) => { tracing::info!(email = %admin.email, "Bootstrap admin created"); Ok(()) }
        Err(StoreError::Conflict(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub async fn create_product(State(s): State<AppState>, Extension(admin): Extension<AdminClaims>, AppJson(r): AppJson<ProductDraft>) -> Result<(StatusCode, Json<Product>)> {
    let product = Product::create(r)?;
    s.stores.products.insert(&product).await?;
    tracing::info!(product_id = %product.id, admin = %admin.email, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(State(s): State<AppState>, Extension(admin): Extension<AdminClaims>, Path(id): Path<Uuid>, AppJson(r): AppJson<ProductDraft>) -> Result<Json<Product>> {
    let mut product = s.stores.products.get(id).await?.ok_or_else(|| AppError::NotFound("Product".to_string()))?;
    product.apply(r)?;
    if !s.stores.products.update(&product).await? { return Err(AppError::NotFound("Product".to_string())); }
    tracing::info!(product_id = %id, admin = %admin.email, "Product updated");
    Ok(Json(product))
}

pub async fn delete_product(State(s): State<AppState>, Extension(admin): Extension<AdminClaims>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if !s.stores.products.delete(id).await? { return Err(AppError::NotFound("Product".to_string())); }
    tracing::info!(product_id = %id, admin = %admin.email, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_orders(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<PaginatedResponse<Order>>> {
    Ok(Json(s.stores.orders.search(&p).await?))
}

pub async fn stats(State(s): State<AppState>) -> Result<Json<StoreStats>> {
    let (orders, products) = tokio::try_join!(s.stores.orders.list(), s.stores.products.all())?;
    Ok(Json(analytics::summarize(&orders, &products)))
}
