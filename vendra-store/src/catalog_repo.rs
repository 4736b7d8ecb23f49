use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use vendra_catalog::product::{Product, ProductRepository};
use vendra_catalog::supplier::{Supplier, SupplierRepository};

pub struct StoreProductRepository {
    pool: PgPool,
}

impl StoreProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    supplier_id: Uuid,
    name: String,
    sku: String,
    brand: Option<String>,
    image_url: Option<String>,
    price_cents: i64,
    stock: i32,
    min_stock_quantity: i32,
    sold_count: i32,
    rating: Option<f64>,
    is_published: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            supplier_id: row.supplier_id,
            name: row.name,
            sku: row.sku,
            brand: row.brand,
            image_url: row.image_url,
            price_cents: row.price_cents,
            stock: row.stock,
            min_stock_quantity: row.min_stock_quantity,
            sold_count: row.sold_count,
            rating: row.rating,
            is_published: row.is_published,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, supplier_id, name, sku, brand, image_url, price_cents, stock, min_stock_quantity, sold_count, rating, is_published, created_at";

#[async_trait]
impl ProductRepository for StoreProductRepository {
    async fn get_product(
        &self,
        id: Uuid,
    ) -> Result<Option<Product>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn list_by_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE supplier_id = $1 ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        ))
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn try_reserve_stock(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        // Conditional decrement: the WHERE clause makes the check and the
        // write one statement, so concurrent checkouts cannot both take the
        // last unit.
        let result = sqlx::query(
            "UPDATE products SET stock = stock - $1, sold_count = sold_count + $1 WHERE id = $2 AND stock >= $1",
        )
        .bind(quantity)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn restock(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
            .bind(quantity)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct StoreSupplierRepository {
    pool: PgPool,
}

impl StoreSupplierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SupplierRow {
    id: Uuid,
    name: String,
    email: String,
    is_system: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: row.id,
            name: row.name,
            email: row.email,
            is_system: row.is_system,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl SupplierRepository for StoreSupplierRepository {
    async fn get_supplier(
        &self,
        id: Uuid,
    ) -> Result<Option<Supplier>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, SupplierRow>(
            "SELECT id, name, email, is_system, created_at FROM suppliers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Supplier::from))
    }

    async fn insert_supplier(
        &self,
        supplier: &Supplier,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            "INSERT INTO suppliers (id, name, email, is_system, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.email)
        .bind(supplier.is_system)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_system_supplier(
        &self,
    ) -> Result<Option<Supplier>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, SupplierRow>(
            "SELECT id, name, email, is_system, created_at FROM suppliers WHERE is_system = TRUE LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Supplier::from))
    }
}
