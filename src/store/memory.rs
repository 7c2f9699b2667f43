//! In-process stores with the same contracts as the Postgres adapters.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::*;

fn paginate<T: Clone>(items: Vec<T>, params: &ListParams) -> PaginatedResponse<T> {
    let total = items.len() as i64;
    let data = items.into_iter().skip(params.offset() as usize).take(params.per_page() as usize).collect();
    PaginatedResponse { data, total, page: params.page() }
}

#[derive(Default)]
pub struct MemoryProductStore { products: RwLock<HashMap<Uuid, Product>> }

impl MemoryProductStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self, params: &ListParams) -> StoreResult<PaginatedResponse<Product>> {
        let needle = params.search().map(str::to_lowercase);
        let mut found: Vec<Product> = self.all().await?.into_iter()
            .filter(|p| params.category.as_deref().map_or(true, |c| p.category.eq_ignore_ascii_case(c)))
            .filter(|p| params.country.as_deref().map_or(true, |c| p.country.eq_ignore_ascii_case(c)))
            .filter(|p| needle.as_deref().map_or(true, |n| p.name.to_lowercase().contains(n) || p.description.to_lowercase().contains(n)))
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(found, params))
    }

    async fn all(&self) -> StoreResult<Vec<Product>> { Ok(self.products.read().await.values().cloned().collect()) }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Product>> { Ok(self.products.read().await.get(&id).cloned()) }

    async fn insert(&self, product: &Product) -> StoreResult<()> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) { return Err(StoreError::Conflict(format!("product {}", product.id))); }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> StoreResult<bool> {
        let mut products = self.products.write().await;
        match products.get_mut(&product.id) {
            Some(existing) => { *existing = product.clone(); Ok(true) }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> { Ok(self.products.write().await.remove(&id).is_some()) }

    async fn decrement_size_stock(&self, id: Uuid, size: Size, qty: u32) -> StoreResult<Option<u32>> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(&id).and_then(|p| p.decrement_size_stock(size, qty).ok()))
    }
}

#[derive(Default)]
pub struct MemoryOrderStore { orders: RwLock<Vec<Order>> }

impl MemoryOrderStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn find_by_session(&self, session_id: &SessionId) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().await.iter().find(|o| &o.session_id == session_id).cloned())
    }

    async fn insert(&self, order: Order) -> StoreResult<InsertOutcome> {
        let mut orders = self.orders.write().await;
        if let Some(existing) = orders.iter().find(|o| o.session_id == order.session_id) {
            return Ok(InsertOutcome::AlreadyExists(existing.clone()));
        }
        orders.push(order.clone());
        Ok(InsertOutcome::Inserted(order))
    }

    async fn list(&self) -> StoreResult<Vec<Order>> {
        let mut orders = self.orders.read().await.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        Ok(self.list().await?.into_iter().filter(|o| o.user_id.as_deref() == Some(user_id)).collect())
    }

    async fn search(&self, params: &ListParams) -> StoreResult<PaginatedResponse<Order>> {
        let orders = self.list().await?;
        let found = match params.search() {
            Some(needle) => orders.into_iter().filter(|o| o.matches(needle)).collect(),
            None => orders,
        };
        Ok(paginate(found, params))
    }
}

#[derive(Default)]
pub struct MemoryCollectionStore { collections: RwLock<HashMap<(String, CollectionKind), Vec<SavedItem>>> }

impl MemoryCollectionStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl CollectionStore for MemoryCollectionStore {
    async fn load(&self, user_id: &str, kind: CollectionKind) -> StoreResult<Vec<SavedItem>> {
        Ok(self.collections.read().await.get(&(user_id.to_string(), kind)).cloned().unwrap_or_default())
    }

    async fn save(&self, user_id: &str, kind: CollectionKind, items: &[SavedItem]) -> StoreResult<()> {
        self.collections.write().await.insert((user_id.to_string(), kind), items.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAdminStore { admins: RwLock<Vec<AdminUser>> }

impl MemoryAdminStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl AdminStore for MemoryAdminStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>> {
        let email = crate::domain::normalize_email(email);
        Ok(self.admins.read().await.iter().find(|a| a.email == email).cloned())
    }

    async fn insert(&self, admin: &AdminUser) -> StoreResult<()> {
        let mut admins = self.admins.write().await;
        if admins.iter().any(|a| a.email == admin.email) { return Err(StoreError::Conflict(admin.email.clone())); }
        admins.push(admin.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::sample_item;
    use crate::domain::aggregates::product::sample_draft;
    use crate::domain::NewOrder;

    fn order(session: &str) -> Order {
        let new = NewOrder { items: vec![sample_item("p1", "250g", 1)], ..Default::default() };
        Order::place(SessionId::parse(Some(session)).unwrap(), new).unwrap()
    }

    #[tokio::test]
    async fn test_order_insert_is_unique_per_session() {
        let store = MemoryOrderStore::new();
        let first = order("sess_1");
        assert!(matches!(store.insert(first.clone()).await.unwrap(), InsertOutcome::Inserted(_)));
        match store.insert(order("sess_1")).await.unwrap() {
            InsertOutcome::AlreadyExists(existing) => assert_eq!(existing.id, first.id),
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_decrement_missing_size() {
        let store = MemoryProductStore::new();
        let product = Product::create(sample_draft("Kenya AA", 5)).unwrap();
        store.insert(&product).await.unwrap();
        assert_eq!(store.decrement_size_stock(product.id, Size::Grams250, 2).await.unwrap(), Some(3));
        assert_eq!(store.decrement_size_stock(product.id, Size::Grams500, 2).await.unwrap(), None);
        assert_eq!(store.decrement_size_stock(Uuid::now_v7(), Size::Grams250, 2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_product_filters() {
        let store = MemoryProductStore::new();
        let mut other = sample_draft("Yirgacheffe", 5);
        other.country = "Ethiopia".into();
        store.insert(&Product::create(sample_draft("Kenya AA", 5)).unwrap()).await.unwrap();
        store.insert(&Product::create(other).unwrap()).await.unwrap();

        let params = ListParams { country: Some("ethiopia".into()), ..Default::default() };
        let page = store.list(&params).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].name, "Yirgacheffe");

        let params = ListParams { search: Some("FRUITY".into()), per_page: Some(1), ..Default::default() };
        let page = store.list(&params).await.unwrap();
        assert_eq!((page.total, page.data.len()), (2, 1));
    }
}
