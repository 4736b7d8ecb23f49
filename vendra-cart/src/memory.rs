use crate::cart::{CartItem, CartRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory session cart used by tests and local development.
pub struct InMemoryCartRepository {
    lines: RwLock<HashMap<String, Vec<CartItem>>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self {
            lines: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCartRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn list_items(
        &self,
        session_key: &str,
    ) -> Result<Vec<CartItem>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .lines
            .read()
            .unwrap()
            .get(session_key)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_item(
        &self,
        session_key: &str,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .lines
            .read()
            .unwrap()
            .get(session_key)
            .and_then(|items| items.iter().find(|i| i.product_id == product_id))
            .cloned())
    }

    async fn upsert_item(
        &self,
        item: &CartItem,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut lines = self.lines.write().unwrap();
        let items = lines.entry(item.session_key.clone()).or_default();
        match items.iter_mut().find(|i| i.product_id == item.product_id) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(())
    }

    async fn remove_item(
        &self,
        session_key: &str,
        product_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(items) = self.lines.write().unwrap().get_mut(session_key) {
            items.retain(|i| i.product_id != product_id);
        }
        Ok(())
    }

    async fn clear(
        &self,
        session_key: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.lines.write().unwrap().remove(session_key);
        Ok(())
    }
}
