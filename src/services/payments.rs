//! Payment gateway client.
//!
//! The storefront never handles card data. It asks the gateway for a hosted
//! checkout session and later reads that session back by id.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PaymentConfig;
use crate::domain::value_objects::to_minor_units;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Amount out of range: {0}")]
    InvalidAmount(Decimal),
}

/// One priced line on the hosted checkout page.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLine {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    pub lines: Vec<SessionLine>,
    pub shipping: Decimal,
    pub customer_email: String,
    pub user_id: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedSession { pub id: String, pub url: String }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    pub id: String,
    pub customer_email: Option<String>,
    pub amount_total: Option<i64>,
    pub payment_status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: &SessionRequest) -> Result<CreatedSession, PaymentError>;
    async fn retrieve_session(&self, id: &str) -> Result<Option<SessionDetails>, PaymentError>;
}

/// Stripe Checkout over its form-encoded REST API.
pub struct StripeGateway {
    client: Client,
    secret_key: SecretString,
    api_base: String,
    currency: String,
}

impl StripeGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.clone(),
            currency: config.currency.clone(),
        }
    }

    fn form(&self, request: &SessionRequest) -> Result<Vec<(String, String)>, PaymentError> {
        let cents = |amount: Decimal| to_minor_units(amount).ok_or(PaymentError::InvalidAmount(amount));
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("customer_email".to_string(), request.customer_email.clone()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];
        for (i, line) in request.lines.iter().enumerate() {
            let key = |field: &str| format!("line_items[{i}][{field}]");
            form.push((key("quantity"), line.quantity.to_string()));
            form.push((key("price_data][currency"), self.currency.clone()));
            form.push((key("price_data][unit_amount"), cents(line.unit_price)?.to_string()));
            form.push((key("price_data][product_data][name"), line.name.clone()));
            if let Some(description) = &line.description {
                form.push((key("price_data][product_data][description"), description.clone()));
            }
            if let Some(image) = &line.image {
                form.push((key("price_data][product_data][images][0"), image.clone()));
            }
        }
        let rate = "shipping_options[0][shipping_rate_data]";
        form.push((format!("{rate}[type]"), "fixed_amount".to_string()));
        form.push((format!("{rate}[fixed_amount][amount]"), cents(request.shipping)?.to_string()));
        form.push((format!("{rate}[fixed_amount][currency]"), self.currency.clone()));
        let label = if request.shipping.is_zero() { "Free shipping" } else { "Standard shipping" };
        form.push((format!("{rate}[display_name]"), label.to_string()));
        if let Some(user_id) = &request.user_id {
            form.push(("metadata[userId]".to_string(), user_id.clone()));
        }
        Ok(form)
    }
}

#[derive(Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<StripeCustomerDetails>,
    amount_total: Option<i64>,
    payment_status: String,
}

#[derive(Deserialize)]
struct StripeCustomerDetails { email: Option<String> }

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, request: &SessionRequest) -> Result<CreatedSession, PaymentError> {
        let session: StripeSession = self.client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&self.form(request)?)
            .send().await?
            .error_for_status()?
            .json().await?;
        tracing::info!(session_id = %session.id, "Checkout session created");
        Ok(CreatedSession { url: session.url.unwrap_or_default(), id: session.id })
    }

    async fn retrieve_session(&self, id: &str) -> Result<Option<SessionDetails>, PaymentError> {
        let response = self.client
            .get(format!("{}/v1/checkout/sessions/{id}", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND { return Ok(None); }
        let session: StripeSession = response.error_for_status()?.json().await?;
        Ok(Some(SessionDetails {
            customer_email: session.customer_details.and_then(|d| d.email).or(session.customer_email),
            id: session.id,
            amount_total: session.amount_total,
            payment_status: session.payment_status,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> StripeGateway {
        StripeGateway::new(&PaymentConfig {
            secret_key: SecretString::from("sk_test".to_string()),
            publishable_key: None,
            api_base: "http://localhost:0".into(),
            currency: "usd".into(),
        })
    }

    fn value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_form_encodes_lines_and_shipping() {
        let request = SessionRequest {
            lines: vec![SessionLine { name: "Kenya AA (250g)".into(), description: None, image: Some("hero.jpg".into()), unit_price: Decimal::new(2899, 2), quantity: 2 }],
            shipping: Decimal::new(450, 2),
            customer_email: "a@b.com".into(),
            user_id: Some("user_1".into()),
            success_url: "https://shop.test/success?session_id={CHECKOUT_SESSION_ID}".into(),
            cancel_url: "https://shop.test/cart".into(),
        };
        let form = gateway().form(&request).unwrap();
        assert_eq!(value(&form, "line_items[0][price_data][unit_amount]"), Some("2899"));
        assert_eq!(value(&form, "line_items[0][quantity]"), Some("2"));
        assert_eq!(value(&form, "line_items[0][price_data][product_data][images][0]"), Some("hero.jpg"));
        assert_eq!(value(&form, "shipping_options[0][shipping_rate_data][fixed_amount][amount]"), Some("450"));
        assert_eq!(value(&form, "metadata[userId]"), Some("user_1"));
        assert_eq!(value(&form, "line_items[0][price_data][product_data][description]"), None);
    }
}
