use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use vendra_cart::cart::{CartItem, CartRepository};

pub struct StoreCartRepository {
    pool: PgPool,
}

impl StoreCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: Uuid,
    session_key: String,
    product_id: Uuid,
    supplier_id: Uuid,
    quantity: i32,
    name: String,
    sku: String,
    image_url: Option<String>,
    unit_price_cents: i64,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            id: row.id,
            session_key: row.session_key,
            product_id: row.product_id,
            supplier_id: row.supplier_id,
            quantity: row.quantity,
            name: row.name,
            sku: row.sku,
            image_url: row.image_url,
            unit_price_cents: row.unit_price_cents,
            created_at: row.created_at,
        }
    }
}

const CART_COLUMNS: &str = "id, session_key, product_id, supplier_id, quantity, name, sku, image_url, unit_price_cents, created_at";

#[async_trait]
impl CartRepository for StoreCartRepository {
    async fn list_items(
        &self,
        session_key: &str,
    ) -> Result<Vec<CartItem>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, CartItemRow>(&format!(
            "SELECT {} FROM cart_items WHERE session_key = $1 ORDER BY created_at",
            CART_COLUMNS
        ))
        .bind(session_key)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    async fn find_item(
        &self,
        session_key: &str,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            "SELECT {} FROM cart_items WHERE session_key = $1 AND product_id = $2",
            CART_COLUMNS
        ))
        .bind(session_key)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CartItem::from))
    }

    async fn upsert_item(
        &self,
        item: &CartItem,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, session_key, product_id, supplier_id, quantity, name, sku, image_url, unit_price_cents, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (session_key, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(item.id)
        .bind(&item.session_key)
        .bind(item.product_id)
        .bind(item.supplier_id)
        .bind(item.quantity)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.image_url)
        .bind(item.unit_price_cents)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_item(
        &self,
        session_key: &str,
        product_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("DELETE FROM cart_items WHERE session_key = $1 AND product_id = $2")
            .bind(session_key)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(
        &self,
        session_key: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("DELETE FROM cart_items WHERE session_key = $1")
            .bind(session_key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
