use crate::product::{Product, ProductRepository};
use crate::supplier::{Supplier, SupplierRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory catalog used by tests and local development.
///
/// Stock reservation takes the write lock for the whole check-and-decrement,
/// which gives the same no-oversell guarantee the SQL conditional update
/// provides in the Postgres implementation.
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
        }
    }

    pub fn seed(&self, product: Product) {
        self.products.write().unwrap().insert(product.id, product);
    }
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn get_product(
        &self,
        id: Uuid,
    ) -> Result<Option<Product>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.products.read().unwrap().get(&id).cloned())
    }

    async fn list_by_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .products
            .read()
            .unwrap()
            .values()
            .filter(|p| p.supplier_id == supplier_id)
            .cloned()
            .collect())
    }

    async fn try_reserve_stock(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut products = self.products.write().unwrap();
        match products.get_mut(&id) {
            Some(product) if product.stock >= quantity => {
                product.stock -= quantity;
                product.sold_count += quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restock(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut products = self.products.write().unwrap();
        if let Some(product) = products.get_mut(&id) {
            product.stock += quantity;
        }
        Ok(())
    }
}

pub struct InMemorySupplierRepository {
    suppliers: RwLock<HashMap<Uuid, Supplier>>,
}

impl InMemorySupplierRepository {
    pub fn new() -> Self {
        Self {
            suppliers: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySupplierRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SupplierRepository for InMemorySupplierRepository {
    async fn get_supplier(
        &self,
        id: Uuid,
    ) -> Result<Option<Supplier>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.suppliers.read().unwrap().get(&id).cloned())
    }

    async fn insert_supplier(
        &self,
        supplier: &Supplier,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.suppliers
            .write()
            .unwrap()
            .insert(supplier.id, supplier.clone());
        Ok(())
    }

    async fn find_system_supplier(
        &self,
    ) -> Result<Option<Supplier>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .suppliers
            .read()
            .unwrap()
            .values()
            .find(|s| s.is_system)
            .cloned())
    }
}
