//! Checkout session construction: shipping policy and gateway request building.
//!
//! Prices come from the client cart as-is. They are not re-checked against the
//! catalog here; the gateway charges exactly what the cart showed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::payments::{SessionLine, SessionRequest};
use crate::domain::value_objects::DEFAULT_SIZE;

/// Flat shipping fee, waived once the subtotal reaches the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShippingPolicy { pub flat_fee: Decimal, pub free_threshold: Decimal }

impl ShippingPolicy {
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_threshold { Decimal::ZERO } else { self.flat_fee }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "Cart is empty"), custom = "validate_items")]
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    #[validate(email(message = "A valid email is required"))]
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

fn validate_items(items: &[CheckoutItem]) -> Result<(), ValidationError> {
    for item in items {
        if item.name.trim().is_empty() { return Err(ValidationError::new("item_name")); }
        if item.quantity == 0 { return Err(ValidationError::new("item_quantity")); }
        if item.price.is_sign_negative() { return Err(ValidationError::new("item_price")); }
    }
    Ok(())
}

impl CheckoutRequest {
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(|i| i.price * Decimal::from(i.quantity)).sum()
    }

    pub fn session_request(&self, policy: &ShippingPolicy, base_url: &str) -> SessionRequest {
        let lines = self.items.iter().map(|item| {
            let size = item.size.as_deref().filter(|s| *s != DEFAULT_SIZE);
            SessionLine {
                name: match size { Some(size) => format!("{} ({size})", item.name), None => item.name.clone() },
                description: size.map(|s| format!("Size: {s}")),
                image: item.image.clone().filter(|i| i.starts_with("http")),
                unit_price: item.price,
                quantity: item.quantity,
            }
        }).collect();
        SessionRequest {
            lines,
            shipping: policy.fee_for(self.subtotal()),
            customer_email: self.email.trim().to_string(),
            user_id: self.user_id.clone().filter(|u| !u.is_empty()),
            success_url: format!("{base_url}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel_url: format!("{base_url}/cart"),
        }
    }
}
