//! PostgreSQL adapters. Records are flat rows with JSONB for nested lists.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::*;
use crate::domain::{OrderItem, OrderStatus, SizeEntry};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid, name: String, description: String, price: Decimal, images: Vec<String>,
    category: String, country: String, stock: i32, sizes: Json<Vec<SizeEntry>>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;
    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let stock = u32::try_from(r.stock).map_err(|_| StoreError::Corrupt(format!("product {} has negative stock", r.id)))?;
        Ok(Product {
            id: r.id, name: r.name, description: r.description, price: r.price, images: r.images,
            category: r.category, country: r.country, stock, sizes: r.sizes.0,
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, session_id: String, user_id: Option<String>, items: Json<Vec<OrderItem>>,
    subtotal: Decimal, shipping: Decimal, total: Decimal, customer_email: Option<String>,
    shipping_address: Option<serde_json::Value>, status: String,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;
    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let session_id = SessionId::parse(Some(&r.session_id)).map_err(|_| StoreError::Corrupt(format!("order {} has no session id", r.id)))?;
        let status = match r.status.as_str() {
            "completed" => OrderStatus::Completed,
            other => return Err(StoreError::Corrupt(format!("order {} has status '{other}'", r.id))),
        };
        Ok(Order {
            id: r.id, session_id, user_id: r.user_id, items: r.items.0, subtotal: r.subtotal,
            shipping: r.shipping, total: r.total, customer_email: r.customer_email,
            shipping_address: r.shipping_address, status, created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

fn to_i32(value: u32) -> i32 { i32::try_from(value).unwrap_or(i32::MAX) }

fn rows<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>> where T: TryFrom<R, Error = StoreError> {
    rows.into_iter().map(T::try_from).collect()
}

#[derive(Clone)]
pub struct PgProductStore { pool: PgPool }

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

const PRODUCT_FILTER: &str = "($1::text IS NULL OR lower(category) = lower($1)) \
    AND ($2::text IS NULL OR lower(country) = lower($2)) \
    AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%' OR description ILIKE '%' || $3 || '%')";

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&self, p: &ListParams) -> StoreResult<PaginatedResponse<Product>> {
        let found = sqlx::query_as::<_, ProductRow>(&format!("SELECT * FROM products WHERE {PRODUCT_FILTER} ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"))
            .bind(&p.category).bind(&p.country).bind(p.search()).bind(i64::from(p.per_page())).bind(i64::from(p.offset()))
            .fetch_all(&self.pool).await?;
        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {PRODUCT_FILTER}"))
            .bind(&p.category).bind(&p.country).bind(p.search())
            .fetch_one(&self.pool).await?;
        Ok(PaginatedResponse { data: rows(found)?, total: total.0, page: p.page() })
    }

    async fn all(&self) -> StoreResult<Vec<Product>> {
        rows(sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY name").fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1").bind(id)
            .fetch_optional(&self.pool).await?.map(Product::try_from).transpose()
    }

    async fn insert(&self, p: &Product) -> StoreResult<()> {
        sqlx::query("INSERT INTO products (id, name, description, price, images, category, country, stock, sizes, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(&p.images).bind(&p.category)
            .bind(&p.country).bind(to_i32(p.stock)).bind(Json(&p.sizes)).bind(p.created_at).bind(p.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, p: &Product) -> StoreResult<bool> {
        let done = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, images = $5, category = $6, country = $7, stock = $8, sizes = $9, updated_at = $10 WHERE id = $1")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(&p.images).bind(&p.category)
            .bind(&p.country).bind(to_i32(p.stock)).bind(Json(&p.sizes)).bind(p.updated_at)
            .execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn decrement_size_stock(&self, id: Uuid, size: Size, qty: u32) -> StoreResult<Option<u32>> {
        // Single statement so concurrent decrements serialize on the row lock.
        let remaining: Option<(i32,)> = sqlx::query_as(
            "UPDATE products p SET \
                stock = GREATEST(p.stock - LEAST($3, (SELECT (e->>'stock')::int FROM jsonb_array_elements(p.sizes) e WHERE e->>'size' = $2 LIMIT 1)), 0), \
                sizes = (SELECT jsonb_agg(CASE WHEN e->>'size' = $2 \
                            THEN jsonb_set(e, '{stock}', to_jsonb(GREATEST((e->>'stock')::int - $3, 0))) ELSE e END ORDER BY ord) \
                         FROM jsonb_array_elements(p.sizes) WITH ORDINALITY AS t(e, ord)), \
                updated_at = NOW() \
             WHERE p.id = $1 AND p.sizes @> jsonb_build_array(jsonb_build_object('size', $2::text)) \
             RETURNING (SELECT (e->>'stock')::int FROM jsonb_array_elements(p.sizes) e WHERE e->>'size' = $2 LIMIT 1)")
            .bind(id).bind(size.as_str()).bind(to_i32(qty))
            .fetch_optional(&self.pool).await?;
        Ok(remaining.map(|(stock,)| u32::try_from(stock).unwrap_or(0)))
    }
}

#[derive(Clone)]
pub struct PgOrderStore { pool: PgPool }

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

const ORDER_FILTER: &str = "($1::text IS NULL OR session_id ILIKE '%' || $1 || '%' OR customer_email ILIKE '%' || $1 || '%' \
    OR EXISTS (SELECT 1 FROM jsonb_array_elements(items) i WHERE i->>'name' ILIKE '%' || $1 || '%'))";

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find_by_session(&self, session_id: &SessionId) -> StoreResult<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE session_id = $1").bind(session_id.as_str())
            .fetch_optional(&self.pool).await?.map(Order::try_from).transpose()
    }

    async fn insert(&self, o: Order) -> StoreResult<InsertOutcome> {
        let inserted = sqlx::query_as::<_, OrderRow>("INSERT INTO orders (id, session_id, user_id, items, subtotal, shipping, total, customer_email, shipping_address, status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) ON CONFLICT (session_id) DO NOTHING RETURNING *")
            .bind(o.id).bind(o.session_id.as_str()).bind(&o.user_id).bind(Json(&o.items)).bind(o.subtotal)
            .bind(o.shipping).bind(o.total).bind(&o.customer_email).bind(&o.shipping_address)
            .bind(o.status.as_str()).bind(o.created_at).bind(o.updated_at)
            .fetch_optional(&self.pool).await?;
        if let Some(row) = inserted { return Ok(InsertOutcome::Inserted(row.try_into()?)); }
        match self.find_by_session(&o.session_id).await? {
            Some(existing) => Ok(InsertOutcome::AlreadyExists(existing)),
            None => Err(StoreError::Conflict(format!("order for session {} rejected", o.session_id))),
        }
    }

    async fn list(&self) -> StoreResult<Vec<Order>> {
        rows(sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC, id DESC").fetch_all(&self.pool).await?)
    }

    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        rows(sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn search(&self, p: &ListParams) -> StoreResult<PaginatedResponse<Order>> {
        let found = sqlx::query_as::<_, OrderRow>(&format!("SELECT * FROM orders WHERE {ORDER_FILTER} ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"))
            .bind(p.search()).bind(i64::from(p.per_page())).bind(i64::from(p.offset()))
            .fetch_all(&self.pool).await?;
        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM orders WHERE {ORDER_FILTER}"))
            .bind(p.search()).fetch_one(&self.pool).await?;
        Ok(PaginatedResponse { data: rows(found)?, total: total.0, page: p.page() })
    }
}

#[derive(Clone)]
pub struct PgCollectionStore { pool: PgPool }

impl PgCollectionStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl CollectionStore for PgCollectionStore {
    async fn load(&self, user_id: &str, kind: CollectionKind) -> StoreResult<Vec<SavedItem>> {
        let found: Option<(Json<Vec<SavedItem>>,)> = sqlx::query_as("SELECT items FROM saved_collections WHERE user_id = $1 AND kind = $2")
            .bind(user_id).bind(kind.as_str()).fetch_optional(&self.pool).await?;
        Ok(found.map(|(items,)| items.0).unwrap_or_default())
    }

    async fn save(&self, user_id: &str, kind: CollectionKind, items: &[SavedItem]) -> StoreResult<()> {
        sqlx::query("INSERT INTO saved_collections (user_id, kind, items, updated_at) VALUES ($1, $2, $3, NOW()) ON CONFLICT (user_id, kind) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()")
            .bind(user_id).bind(kind.as_str()).bind(Json(items)).execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgAdminStore { pool: PgPool }

impl PgAdminStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[derive(sqlx::FromRow)]
struct AdminRow { id: Uuid, email: String, password_hash: String, created_at: DateTime<Utc> }

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>> {
        let found = sqlx::query_as::<_, AdminRow>("SELECT id, email, password_hash, created_at FROM admin_users WHERE email = $1")
            .bind(crate::domain::normalize_email(email)).fetch_optional(&self.pool).await?;
        Ok(found.map(|r| AdminUser { id: r.id, email: r.email, password_hash: r.password_hash, created_at: r.created_at }))
    }

    async fn insert(&self, a: &AdminUser) -> StoreResult<()> {
        let done = sqlx::query("INSERT INTO admin_users (id, email, password_hash, created_at) VALUES ($1, $2, $3, $4) ON CONFLICT (email) DO NOTHING")
            .bind(a.id).bind(&a.email).bind(&a.password_hash).bind(a.created_at).execute(&self.pool).await?;
        if done.rows_affected() == 0 { return Err(StoreError::Conflict(a.email.clone())); }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Run against a scratch database: `DATABASE_URL=postgres://... cargo test`.
    //! Without `DATABASE_URL` these return immediately.

    use super::*;
    use crate::domain::aggregates::order::sample_item;
    use crate::domain::aggregates::product::sample_draft;
    use crate::domain::NewOrder;

    async fn pool() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        Some(pool)
    }

    fn order(session: &str) -> Order {
        let new = NewOrder { items: vec![sample_item("p1", "250g", 1)], ..Default::default() };
        Order::place(SessionId::parse(Some(session)).unwrap(), new).unwrap()
    }

    #[tokio::test]
    async fn test_pg_second_insert_for_session_returns_stored_order() {
        let Some(pool) = pool().await else { return };
        let store = PgOrderStore::new(pool);
        let session = format!("cs_pg_{}", Uuid::now_v7());

        let InsertOutcome::Inserted(first) = store.insert(order(&session)).await.unwrap() else { panic!("expected insert") };
        match store.insert(order(&session)).await.unwrap() {
            InsertOutcome::AlreadyExists(existing) => assert_eq!(existing.id, first.id),
            InsertOutcome::Inserted(_) => panic!("session inserted twice"),
        }
        let stored = store.find_by_session(&first.session_id).await.unwrap().unwrap();
        assert_eq!(stored.items, first.items);
    }

    #[tokio::test]
    async fn test_pg_size_stock_decrement() {
        let Some(pool) = pool().await else { return };
        let store = PgProductStore::new(pool);
        let product = Product::create(sample_draft("Kenya AA", 5)).unwrap();
        store.insert(&product).await.unwrap();

        assert_eq!(store.decrement_size_stock(product.id, Size::Grams250, 2).await.unwrap(), Some(3));
        let after = store.get(product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 6);
        assert_eq!(after.size(Size::Kilo1).unwrap().stock, 3);

        assert_eq!(store.decrement_size_stock(product.id, Size::Grams250, 50).await.unwrap(), Some(0));
        assert_eq!(store.get(product.id).await.unwrap().unwrap().stock, 3);

        assert_eq!(store.decrement_size_stock(product.id, Size::Grams500, 1).await.unwrap(), None);
        assert_eq!(store.decrement_size_stock(Uuid::now_v7(), Size::Grams250, 1).await.unwrap(), None);
        assert!(store.delete(product.id).await.unwrap());
    }
}
