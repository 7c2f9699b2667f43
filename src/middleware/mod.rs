//! Request guards.
pub mod auth;

pub use auth::{require_admin, CurrentCustomer, RequireAdmin};
