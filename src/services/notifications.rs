//! Order notification emails.
//!
//! Uses SMTP via lettre for delivery with Askama templates.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::domain::Order;

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> { order: &'a Order, currency: &'a str }

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> { order: &'a Order, currency: &'a str }

#[derive(Template)]
#[template(path = "email/order_alert.html")]
struct OrderAlertHtml<'a> { order: &'a Order, currency: &'a str }

#[derive(Template)]
#[template(path = "email/order_alert.txt")]
struct OrderAlertText<'a> { order: &'a Order, currency: &'a str }

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Sends the two emails that follow a new order.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn send_confirmation(&self, to: &str, order: &Order) -> Result<(), EmailError>;
    async fn send_admin_alert(&self, order: &Order) -> Result<(), EmailError>;
}

#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    alert_address: String,
    currency: String,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig, currency: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(config.smtp_username.clone(), config.smtp_password.expose_secret().to_string());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();
        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            alert_address: config.alert_address.clone(),
            currency: currency.to_uppercase(),
        })
    }

    async fn send_multipart(&self, to: &str, subject: &str, text_body: String, html_body: String) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from_address.parse().map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?)
            .to(to.parse().map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::builder().header(ContentType::TEXT_PLAIN).body(text_body))
                    .singlepart(SinglePart::builder().header(ContentType::TEXT_HTML).body(html_body)),
            )?;
        self.mailer.send(email).await?;
        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl OrderNotifier for SmtpNotifier {
    async fn send_confirmation(&self, to: &str, order: &Order) -> Result<(), EmailError> {
        let currency = self.currency.as_str();
        let html = OrderConfirmationHtml { order, currency }.render()?;
        let text = OrderConfirmationText { order, currency }.render()?;
        self.send_multipart(to, "Your order is confirmed", text, html).await
    }

    async fn send_admin_alert(&self, order: &Order) -> Result<(), EmailError> {
        let currency = self.currency.as_str();
        let html = OrderAlertHtml { order, currency }.render()?;
        let text = OrderAlertText { order, currency }.render()?;
        let subject = format!("New order {} ({currency} {})", order.session_id, order.total);
        self.send_multipart(&self.alert_address, &subject, text, html).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::sample_item;
    use crate::domain::{NewOrder, SessionId};
    use rust_decimal::Decimal;

    fn order() -> Order {
        let mut mug = sample_item("p2", "default", 1);
        mug.name = "Mug <Limited>".into();
        Order::place(SessionId::parse(Some("sess_1")).unwrap(), NewOrder {
            items: vec![sample_item("p1", "250g", 2), mug],
            subtotal: Decimal::new(8697, 2), shipping: Decimal::ZERO, total: Decimal::new(8697, 2),
            customer_email: Some("a@b.com".into()),
            ..Default::default()
        }).unwrap()
    }

    #[test]
    fn test_confirmation_renders_lines() {
        let order = order();
        let text = OrderConfirmationText { order: &order, currency: "USD" }.render().unwrap();
        assert!(text.contains("Kenya AA (250g) x 2: USD 57.98"));
        assert!(text.contains("Total: USD 86.97"));
        let html = OrderConfirmationHtml { order: &order, currency: "USD" }.render().unwrap();
        assert!(html.contains("Mug &#60;Limited&#62;"));
        assert!(!html.contains("<Limited>"));
        assert!(!html.contains("(default)"));
    }

    #[test]
    fn test_alert_names_customer() {
        let order = order();
        let text = OrderAlertText { order: &order, currency: "USD" }.render().unwrap();
        assert!(text.contains("Session sess_1 from a@b.com"));
    }
}
