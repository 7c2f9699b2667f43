//! Roastery storefront backend
//!
//! Catalog, checkout and order ingestion for a specialty-coffee shop.
//!
//! ## Features
//! - Idempotent order recording keyed by checkout session id
//! - Per-size stock tracking
//! - Admin console API (product CRUD, order search, stats)
//! - Hosted checkout sessions through the payment gateway
//! - Saved carts, wishlists and favorites per customer

pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use routes::router;
pub use state::{AppState, Stores};
