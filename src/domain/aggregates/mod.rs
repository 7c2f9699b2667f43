//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod admin;

pub use product::{Product, ProductDraft, ProductError, SizeEntry};
pub use order::{NewOrder, Order, OrderError, OrderItem, OrderStatus};
pub use cart::{reconcile, normalize, SavedItem};
pub use admin::{normalize_email, AdminUser};
