//! Order ingestion after a successful payment.
//!
//! The payment gateway may repeat its success callback and shoppers refresh
//! the confirmation page, so the same session id can arrive many times. The
//! order store's uniqueness on session id decides which call records the
//! order; only that call touches stock and sends email. Stock and email are
//! best-effort: the payment already happened, so neither can fail the request.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::notifications::OrderNotifier;
use crate::domain::{NewOrder, Order, OrderError, OrderItem, SessionId, Size};
use crate::store::{InsertOutcome, OrderStore, ProductStore, StoreError};

/// Body of `POST /api/orders`. Everything is optional so a missing key is a 400, not a parse failure.
///
/// The payment already went through, so descriptive fields of the wrong type
/// are dropped rather than failing the whole callback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub session_id: Option<String>,
    pub items: Option<Vec<OrderItem>>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub subtotal: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub shipping: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub customer_email: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
}

/// Strings pass through, numbers are stringified, anything else is absent.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone)]
pub enum IngestOutcome {
    Created(Order),
    /// The session already has an order; it is returned unchanged.
    Duplicate(Order),
    /// The cart was empty by the time the callback arrived.
    NothingToRecord,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("sessionId is required")]
    MissingSessionId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct OrderIngestion {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    notifier: Option<Arc<dyn OrderNotifier>>,
}

impl OrderIngestion {
    pub fn new(orders: Arc<dyn OrderStore>, products: Arc<dyn ProductStore>, notifier: Option<Arc<dyn OrderNotifier>>) -> Self {
        Self { orders, products, notifier }
    }

    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome, IngestError> {
        let session_id = SessionId::parse(request.session_id.as_deref()).map_err(|_| IngestError::MissingSessionId)?;

        if let Some(existing) = self.orders.find_by_session(&session_id).await? {
            tracing::info!(session_id = %session_id, order_id = %existing.id, "Order already recorded");
            return Ok(IngestOutcome::Duplicate(existing));
        }

        let new = NewOrder {
            user_id: request.user_id,
            items: request.items.unwrap_or_default(),
            subtotal: request.subtotal.unwrap_or_default(),
            shipping: request.shipping.unwrap_or_default(),
            total: request.total.unwrap_or_default(),
            customer_email: request.customer_email,
            shipping_address: request.shipping_address,
        };
        let order = match Order::place(session_id.clone(), new) {
            Ok(order) => order,
            Err(OrderError::NoItems) => {
                tracing::warn!(session_id = %session_id, "Payment confirmed with no items; nothing recorded");
                return Ok(IngestOutcome::NothingToRecord);
            }
        };

        let order = match self.orders.insert(order).await? {
            InsertOutcome::Inserted(order) => order,
            InsertOutcome::AlreadyExists(existing) => {
                tracing::info!(session_id = %existing.session_id, order_id = %existing.id, "Lost insert race; returning stored order");
                return Ok(IngestOutcome::Duplicate(existing));
            }
        };
        tracing::info!(session_id = %order.session_id, order_id = %order.id, total = %order.total, "Order recorded");

        self.adjust_stock(&order).await;
        self.notify(&order).await;
        Ok(IngestOutcome::Created(order))
    }

    async fn adjust_stock(&self, order: &Order) {
        for item in order.items.iter().filter(|i| i.affects_stock()) {
            let (Ok(product_id), Ok(size)) = (item.product_id.parse::<Uuid>(), item.size.parse::<Size>()) else {
                tracing::warn!(product_id = %item.product_id, size = %item.size, "Unrecognised product or size; stock left unchanged");
                continue;
            };
            match self.products.decrement_size_stock(product_id, size, item.quantity).await {
                Ok(Some(remaining)) => tracing::debug!(product_id = %product_id, size = %size, remaining, "Stock decremented"),
                Ok(None) => tracing::warn!(product_id = %product_id, size = %size, "Product or size not found; stock left unchanged"),
                Err(e) => tracing::warn!(product_id = %product_id, size = %size, error = %e, "Stock decrement failed"),
            }
        }
    }

    async fn notify(&self, order: &Order) {
        let Some(to) = order.customer_email.as_deref() else { return };
        let Some(notifier) = &self.notifier else {
            tracing::warn!(order_id = %order.id, "Email not configured; skipping order notifications");
            return;
        };
        let (confirmation, alert) = tokio::join!(notifier.send_confirmation(to, order), notifier.send_admin_alert(order));
        if let Err(e) = confirmation { tracing::warn!(order_id = %order.id, error = %e, "Customer confirmation email failed"); }
        if let Err(e) = alert { tracing::warn!(order_id = %order.id, error = %e, "Admin alert email failed"); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::sample_draft;
    use crate::domain::Product;
    use crate::services::notifications::EmailError;
    use crate::store::memory::{MemoryOrderStore, MemoryProductStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FailingNotifier { attempts: AtomicUsize }

    #[async_trait]
    impl OrderNotifier for FailingNotifier {
        async fn send_confirmation(&self, to: &str, _: &Order) -> Result<(), EmailError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(EmailError::InvalidAddress(to.to_string()))
        }
        async fn send_admin_alert(&self, _: &Order) -> Result<(), EmailError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(EmailError::InvalidAddress("alerts".into()))
        }
    }

    struct Fixture { ingestion: OrderIngestion, products: Arc<MemoryProductStore>, orders: Arc<MemoryOrderStore>, notifier: Arc<FailingNotifier>, product: Product }

    async fn fixture() -> Fixture {
        let products = Arc::new(MemoryProductStore::new());
        let orders = Arc::new(MemoryOrderStore::new());
        let notifier = Arc::new(FailingNotifier::default());
        let product = Product::create(sample_draft("Kenya AA", 10)).unwrap();
        products.insert(&product).await.unwrap();
        let ingestion = OrderIngestion::new(orders.clone(), products.clone(), Some(notifier.clone() as Arc<dyn OrderNotifier>));
        Fixture { ingestion, products, orders, notifier, product }
    }

    fn request(session: &str, product_id: &str, size: &str, quantity: u32) -> IngestRequest {
        serde_json::from_value(serde_json::json!({
            "sessionId": session,
            "items": [{ "productId": product_id, "name": "Kenya AA", "quantity": quantity, "price": 28.99, "size": size }],
            "subtotal": 57.98, "shipping": 4.5, "total": 62.48, "customerEmail": "a@b.com"
        })).unwrap()
    }

    async fn stock(f: &Fixture, size: Size) -> u32 {
        f.products.get(f.product.id).await.unwrap().unwrap().size(size).unwrap().stock
    }

    #[tokio::test]
    async fn test_email_failures_do_not_fail_ingestion() {
        let f = fixture().await;
        let outcome = f.ingestion.ingest(request("sess_1", &f.product.id.to_string(), "250g", 2)).await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Created(ref o) if o.total == Decimal::new(6248, 2)));
        assert_eq!(f.notifier.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(stock(&f, Size::Grams250).await, 8);
    }

    #[tokio::test]
    async fn test_repeat_returns_first_order_without_second_decrement() {
        let f = fixture().await;
        let id = f.product.id.to_string();
        let IngestOutcome::Created(first) = f.ingestion.ingest(request("sess_1", &id, "250g", 2)).await.unwrap() else { panic!("expected created") };
        let IngestOutcome::Duplicate(second) = f.ingestion.ingest(request("sess_1", &id, "250g", 2)).await.unwrap() else { panic!("expected duplicate") };
        assert_eq!(first.id, second.id);
        assert_eq!(stock(&f, Size::Grams250).await, 8);
        assert_eq!(f.orders.list().await.unwrap().len(), 1);
        assert_eq!(f.notifier.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stock_floors_at_zero() {
        let f = fixture().await;
        f.ingestion.ingest(request("sess_1", &f.product.id.to_string(), "1kg", 50)).await.unwrap();
        assert_eq!(stock(&f, Size::Kilo1).await, 0);
        assert_eq!(stock(&f, Size::Grams250).await, 10);
    }

    #[tokio::test]
    async fn test_default_size_and_unknown_products_leave_stock() {
        let f = fixture().await;
        let before = f.products.get(f.product.id).await.unwrap().unwrap();
        f.ingestion.ingest(request("sess_1", &f.product.id.to_string(), "default", 3)).await.unwrap();
        f.ingestion.ingest(request("sess_2", "p1", "250g", 3)).await.unwrap();
        f.ingestion.ingest(request("sess_3", &f.product.id.to_string(), "500g", 3)).await.unwrap();
        assert_eq!(f.products.get(f.product.id).await.unwrap().unwrap().sizes, before.sizes);
        assert_eq!(f.orders.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_session_and_empty_cart() {
        let f = fixture().await;
        let mut missing = request("", &f.product.id.to_string(), "250g", 1);
        assert!(matches!(f.ingestion.ingest(missing.clone()).await, Err(IngestError::MissingSessionId)));
        missing.session_id = None;
        assert!(matches!(f.ingestion.ingest(missing).await, Err(IngestError::MissingSessionId)));

        let empty = IngestRequest { session_id: Some("sess_9".into()), items: Some(vec![]), ..Default::default() };
        assert!(matches!(f.ingestion.ingest(empty).await.unwrap(), IngestOutcome::NothingToRecord));
        assert!(f.orders.list().await.unwrap().is_empty());
        assert_eq!(f.notifier.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_email_without_customer_address() {
        let f = fixture().await;
        let mut req = request("sess_1", &f.product.id.to_string(), "250g", 1);
        req.customer_email = None;
        f.ingestion.ingest(req).await.unwrap();
        assert_eq!(f.notifier.attempts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_request_drops_mistyped_descriptive_fields() {
        let req: IngestRequest = serde_json::from_value(serde_json::json!({
            "sessionId": "sess_1",
            "items": [{"productId": "p1", "name": "Mug", "quantity": 1, "price": 12.0, "size": null}],
            "userId": 42,
            "customerEmail": false,
            "subtotal": 12.0,
            "total": {"amount": 12}
        })).unwrap();
        assert_eq!(req.user_id.as_deref(), Some("42"));
        assert_eq!(req.customer_email, None);
        assert_eq!(req.subtotal, Some(Decimal::new(1200, 2)));
        assert_eq!(req.total, None);
        assert_eq!(req.shipping, None);
        assert_eq!(req.items.unwrap()[0].size, "default");
    }
}
