//! Persistence ports.
//!
//! Handlers and services code against these traits. `postgres` holds the
//! production adapters, `memory` the in-process ones used by tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{AdminUser, CollectionKind, Order, Product, SavedItem, SessionId, Size};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }
    pub fn per_page(&self) -> u32 { self.per_page.unwrap_or(20).clamp(1, 100) }
    pub fn offset(&self) -> u32 { (self.page() - 1) * self.per_page() }
    pub fn search(&self) -> Option<&str> { self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> { pub data: Vec<T>, pub total: i64, pub page: u32 }

/// Result of an insert guarded by the session-id uniqueness constraint.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(Order),
    /// Another writer got there first; carries the stored order.
    AlreadyExists(Order),
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self, params: &ListParams) -> StoreResult<PaginatedResponse<Product>>;
    async fn all(&self) -> StoreResult<Vec<Product>>;
    async fn get(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn insert(&self, product: &Product) -> StoreResult<()>;
    /// Returns false if the product no longer exists.
    async fn update(&self, product: &Product) -> StoreResult<bool>;
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    /// Removes `qty` units from one size, flooring at zero. `None` if the product or size is missing.
    async fn decrement_size_stock(&self, id: Uuid, size: Size, qty: u32) -> StoreResult<Option<u32>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_session(&self, session_id: &SessionId) -> StoreResult<Option<Order>>;
    async fn insert(&self, order: Order) -> StoreResult<InsertOutcome>;
    /// Newest first.
    async fn list(&self) -> StoreResult<Vec<Order>>;
    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>>;
    async fn search(&self, params: &ListParams) -> StoreResult<PaginatedResponse<Order>>;
}

#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn load(&self, user_id: &str, kind: CollectionKind) -> StoreResult<Vec<SavedItem>>;
    async fn save(&self, user_id: &str, kind: CollectionKind, items: &[SavedItem]) -> StoreResult<()>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>>;
    async fn insert(&self, admin: &AdminUser) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_bounds() {
        let p = ListParams { page: Some(0), per_page: Some(500), ..Default::default() };
        assert_eq!((p.page(), p.per_page(), p.offset()), (1, 100, 0));
        let p = ListParams { page: Some(3), per_page: None, search: Some("  ".into()), ..Default::default() };
        assert_eq!((p.page(), p.per_page(), p.offset()), (3, 20, 40));
        assert_eq!(p.search(), None);
    }
}
