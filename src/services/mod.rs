//! Application services sitting between the HTTP handlers and the stores.
pub mod analytics;
pub mod auth;
pub mod checkout;
pub mod ingestion;
pub mod notifications;
pub mod payments;
