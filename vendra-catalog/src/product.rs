use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog product. The `stock` counter is authoritative: checkout is the
/// only decrementer (via `try_reserve_stock`) and cancellation the only
/// incrementer (via `restock`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub name: String,
    pub sku: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub stock: i32,
    pub min_stock_quantity: i32,
    pub sold_count: i32,
    pub rating: Option<f64>,
    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Product {
    /// Capture the fields carts and order items copy at add time.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            product_id: self.id,
            supplier_id: self.supplier_id,
            name: self.name.clone(),
            sku: self.sku.clone(),
            brand: self.brand.clone(),
            image_url: self.image_url.clone(),
            unit_price_cents: self.price_cents,
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock < self.min_stock_quantity
    }
}

/// Point-in-time copy of the product fields a cart or order carries.
/// Never refreshed from the catalog after capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub name: String,
    pub sku: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub unit_price_cents: i64,
}

/// Repository trait for catalog access and the two sanctioned stock mutations.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_product(
        &self,
        id: Uuid,
    ) -> Result<Option<Product>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_by_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>>;

    /// Atomically decrement stock by `quantity` and bump `sold_count` when
    /// enough stock is available. Returns false (and mutates nothing) when
    /// stock is short or the product is unknown. The check and the decrement
    /// are one conditional operation, so concurrent reservations of the last
    /// units cannot both pass.
    async fn try_reserve_stock(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// Return previously reserved stock (order cancellation).
    async fn restock(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
