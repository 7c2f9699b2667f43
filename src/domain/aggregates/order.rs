//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{SessionId, DEFAULT_SIZE};

/// A paid order. Written once per checkout session and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub session_id: SessionId,
    pub user_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub customer_email: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
    /// Missing, null and blank all mean the line has no size selection.
    #[serde(default = "default_size", deserialize_with = "size_or_default")]
    pub size: String,
    #[serde(default)]
    pub image: Option<String>,
}

fn default_size() -> String { DEFAULT_SIZE.to_string() }

fn size_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let size = Option::<String>::deserialize(deserializer)?;
    Ok(size.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).unwrap_or_else(default_size))
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
    /// Lines sold without a size selection never touch size stock.
    pub fn affects_stock(&self) -> bool { self.size != DEFAULT_SIZE }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Completed }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str { match self { Self::Completed => "completed" } }
}

/// Everything the payment-confirmation callback tells us about an order.
#[derive(Clone, Debug, Default)]
pub struct NewOrder {
    pub user_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub customer_email: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
}

impl Order {
    pub fn place(session_id: SessionId, new: NewOrder) -> Result<Self, OrderError> {
        if new.items.is_empty() { return Err(OrderError::NoItems); }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(), session_id, user_id: new.user_id.filter(|u| !u.trim().is_empty()), items: new.items,
            subtotal: new.subtotal, shipping: new.shipping, total: new.total,
            customer_email: new.customer_email.filter(|e| !e.trim().is_empty()),
            shipping_address: new.shipping_address.filter(|a| !a.is_null()),
            status: OrderStatus::Completed, created_at: now, updated_at: now,
        })
    }

    pub fn unit_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    /// Case-insensitive match on session id, customer email and item names.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.session_id.as_str().to_lowercase().contains(&needle)
            || self.customer_email.as_deref().is_some_and(|e| e.to_lowercase().contains(&needle))
            || self.items.iter().any(|i| i.name.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderError { NoItems }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::NoItems => write!(f, "No items") }
    }
}

#[cfg(test)]
pub(crate) fn sample_item(product_id: &str, size: &str, quantity: u32) -> OrderItem {
    OrderItem {
        product_id: product_id.into(), name: "Kenya AA".into(), quantity,
        price: Decimal::new(2899, 2), size: size.into(), image: Some("hero.jpg".into()),
    }
}
