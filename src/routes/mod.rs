//! HTTP surface.

pub mod admin;
pub mod checkout;
pub mod collections;
pub mod orders;
pub mod products;

use axum::{
    extract::FromRequest,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::middleware::require_admin;
use crate::state::AppState;

/// JSON body extractor whose rejections render as `AppError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/products", get(products::list_products).post(admin::create_product))
        .route("/products/:id", get(products::get_product).put(admin::update_product).delete(admin::delete_product))
        .route("/orders", get(admin::search_orders))
        .route("/stats", get(admin::stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route("/login", post(admin::login));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "roastery-storefront"})) }))
        .route("/api/products", get(products::list_products))
        .route("/api/products/:id", get(products::get_product))
        .route("/api/orders", get(orders::list_orders).post(orders::create_order))
        .route("/api/orders/mine", get(orders::my_orders))
        .route("/api/orders/session/:session_id", get(orders::order_by_session))
        .route("/api/checkout", post(checkout::create_checkout))
        .route("/api/checkout/config", get(checkout::client_config))
        .route("/api/checkout/sessions/:id", get(checkout::get_session))
        .route("/api/me/:kind", get(collections::get_collection).put(collections::put_collection))
        .route("/api/me/:kind/sync", post(collections::sync_collection))
        .nest("/api/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
