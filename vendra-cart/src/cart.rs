use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use vendra_catalog::product::ProductRepository;

/// One line in a session's cart.
///
/// Price, name, sku and image are snapshotted from the catalog when the line
/// is first added and never re-read, so a later catalog edit cannot change
/// what the shopper saw. Repeat adds only merge quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub session_key: String,
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity: i32,
    pub name: String,
    pub sku: String,
    pub image_url: Option<String>,
    pub unit_price_cents: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl CartItem {
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity as i64
    }
}

/// A session's cart with its display subtotal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub subtotal_cents: i64,
}

/// Repository trait for session cart lines.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn list_items(
        &self,
        session_key: &str,
    ) -> Result<Vec<CartItem>, Box<dyn std::error::Error + Send + Sync>>;

    async fn find_item(
        &self,
        session_key: &str,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, Box<dyn std::error::Error + Send + Sync>>;

    /// Insert or replace the line for (session, product).
    async fn upsert_item(
        &self,
        item: &CartItem,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn remove_item(
        &self,
        session_key: &str,
        product_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn clear(
        &self,
        session_key: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product is not available for purchase: {0}")]
    ProductUnavailable(String),

    #[error("Cart has no line for product {0}")]
    ItemNotFound(Uuid),

    #[error("Cart storage failed: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Cart operations used by the storefront and consumed by checkout.
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { carts, products }
    }

    /// Add a product to the cart, merging quantity into an existing line.
    /// The merged line keeps its original snapshot. Stock is deliberately not
    /// checked here; availability is only enforced at checkout.
    pub async fn add_item(
        &self,
        session_key: &str,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        if let Some(mut existing) = self.carts.find_item(session_key, product_id).await? {
            existing.quantity += quantity;
            self.carts.upsert_item(&existing).await?;
            return Ok(existing);
        }

        let product = self
            .products
            .get_product(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;
        if !product.is_published {
            return Err(CartError::ProductUnavailable(product.name));
        }

        let snapshot = product.snapshot();
        let item = CartItem {
            id: Uuid::new_v4(),
            session_key: session_key.to_string(),
            product_id,
            supplier_id: snapshot.supplier_id,
            quantity,
            name: snapshot.name,
            sku: snapshot.sku,
            image_url: snapshot.image_url,
            unit_price_cents: snapshot.unit_price_cents,
            created_at: chrono::Utc::now(),
        };
        self.carts.upsert_item(&item).await?;
        tracing::debug!("Cart line added for session {}", session_key);
        Ok(item)
    }

    pub async fn update_quantity(
        &self,
        session_key: &str,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut item = self
            .carts
            .find_item(session_key, product_id)
            .await?
            .ok_or(CartError::ItemNotFound(product_id))?;
        item.quantity = quantity;
        self.carts.upsert_item(&item).await?;
        Ok(item)
    }

    pub async fn remove_item(
        &self,
        session_key: &str,
        product_id: Uuid,
    ) -> Result<(), CartError> {
        self.carts.remove_item(session_key, product_id).await?;
        Ok(())
    }

    pub async fn clear(&self, session_key: &str) -> Result<(), CartError> {
        self.carts.clear(session_key).await?;
        Ok(())
    }

    pub async fn get_cart(&self, session_key: &str) -> Result<Cart, CartError> {
        let items = self.carts.list_items(session_key).await?;
        let subtotal_cents = items.iter().map(|i| i.line_total_cents()).sum();
        Ok(Cart {
            items,
            subtotal_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCartRepository;
    use vendra_catalog::memory::InMemoryProductRepository;
    use vendra_catalog::product::Product;

    fn seeded_service() -> (CartService, Arc<InMemoryProductRepository>, Uuid) {
        let products = Arc::new(InMemoryProductRepository::new());
        let product = Product {
            id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            name: "Linen Apron".to_string(),
            sku: "LA-22".to_string(),
            brand: Some("Loom & Thread".to_string()),
            image_url: None,
            price_cents: 3_000,
            stock: 10,
            min_stock_quantity: 2,
            sold_count: 0,
            rating: Some(4.2),
            is_published: true,
            created_at: chrono::Utc::now(),
        };
        let product_id = product.id;
        products.seed(product);
        let service = CartService::new(Arc::new(InMemoryCartRepository::new()), products.clone());
        (service, products, product_id)
    }

    #[tokio::test]
    async fn test_repeat_add_merges_quantity_and_keeps_snapshot() {
        let (service, products, product_id) = seeded_service();

        service.add_item("session:a", product_id, 1).await.unwrap();

        // Catalog price changes after the first add; the line must not move.
        {
            let mut updated = products.get_product(product_id).await.unwrap().unwrap();
            updated.price_cents = 9_999;
            products.seed(updated);
        }

        let merged = service.add_item("session:a", product_id, 2).await.unwrap();
        assert_eq!(merged.quantity, 3);
        assert_eq!(merged.unit_price_cents, 3_000);

        let cart = service.get_cart("session:a").await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.subtotal_cents, 9_000);
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_product_and_bad_quantity() {
        let (service, _, product_id) = seeded_service();

        let err = service.add_item("session:a", Uuid::new_v4(), 1).await;
        assert!(matches!(err, Err(CartError::ProductNotFound(_))));

        let err = service.add_item("session:a", product_id, 0).await;
        assert!(matches!(err, Err(CartError::InvalidQuantity(0))));
    }

    #[tokio::test]
    async fn test_unpublished_product_cannot_be_added() {
        let (service, products, product_id) = seeded_service();
        {
            let mut hidden = products.get_product(product_id).await.unwrap().unwrap();
            hidden.is_published = false;
            products.seed(hidden);
        }
        let err = service.add_item("session:a", product_id, 1).await;
        assert!(matches!(err, Err(CartError::ProductUnavailable(_))));
    }

    #[tokio::test]
    async fn test_remove_and_clear_empty_the_cart() {
        let (service, _, product_id) = seeded_service();
        service.add_item("session:a", product_id, 2).await.unwrap();

        service.remove_item("session:a", product_id).await.unwrap();
        assert!(service.get_cart("session:a").await.unwrap().items.is_empty());

        service.add_item("session:a", product_id, 1).await.unwrap();
        service.clear("session:a").await.unwrap();
        let cart = service.get_cart("session:a").await.unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.subtotal_cents, 0);
    }

    #[tokio::test]
    async fn test_update_quantity_replaces_count() {
        let (service, _, product_id) = seeded_service();
        service.add_item("session:a", product_id, 2).await.unwrap();
        let updated = service
            .update_quantity("session:a", product_id, 5)
            .await
            .unwrap();
        assert_eq!(updated.quantity, 5);

        let err = service.update_quantity("session:a", Uuid::new_v4(), 5).await;
        assert!(matches!(err, Err(CartError::ItemNotFound(_))));
    }
}
