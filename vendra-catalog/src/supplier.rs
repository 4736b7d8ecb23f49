use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Name under which the platform's own supplier record is created when the
/// fallback resolution strategy has to invent one.
pub const SYSTEM_SUPPLIER_NAME: &str = "Vendra Platform";

/// A vendor selling through the storefront.
///
/// Commission is a platform-wide configuration value, not a per-supplier
/// column; see DESIGN.md for the rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_system: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Supplier {
    pub fn system() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: SYSTEM_SUPPLIER_NAME.to_string(),
            email: "settlement@vendra.example".to_string(),
            is_system: true,
            created_at: chrono::Utc::now(),
        }
    }
}

#[async_trait]
pub trait SupplierRepository: Send + Sync {
    async fn get_supplier(
        &self,
        id: Uuid,
    ) -> Result<Option<Supplier>, Box<dyn std::error::Error + Send + Sync>>;

    async fn insert_supplier(
        &self,
        supplier: &Supplier,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn find_system_supplier(
        &self,
    ) -> Result<Option<Supplier>, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, thiserror::Error)]
pub enum SupplierResolutionError {
    #[error("Supplier not found: {0}")]
    NotFound(Uuid),

    #[error("Supplier lookup failed: {0}")]
    Lookup(String),
}

/// Strategy deciding what happens when a payment references a supplier id
/// that no longer exists. Routing money to the wrong party must be an
/// explicit choice, so both behaviors are first-class implementations.
#[async_trait]
pub trait SupplierResolution: Send + Sync {
    async fn resolve(&self, supplier_id: Uuid) -> Result<Uuid, SupplierResolutionError>;
}

/// Fail the payment when the supplier record is missing.
pub struct StrictResolution {
    suppliers: Arc<dyn SupplierRepository>,
}

impl StrictResolution {
    pub fn new(suppliers: Arc<dyn SupplierRepository>) -> Self {
        Self { suppliers }
    }
}

#[async_trait]
impl SupplierResolution for StrictResolution {
    async fn resolve(&self, supplier_id: Uuid) -> Result<Uuid, SupplierResolutionError> {
        let found = self
            .suppliers
            .get_supplier(supplier_id)
            .await
            .map_err(|e| SupplierResolutionError::Lookup(e.to_string()))?;
        match found {
            Some(supplier) => Ok(supplier.id),
            None => Err(SupplierResolutionError::NotFound(supplier_id)),
        }
    }
}

/// Route the payment to the well-known system supplier when the record is
/// missing, creating that supplier lazily on first use.
pub struct FallbackResolution {
    suppliers: Arc<dyn SupplierRepository>,
}

impl FallbackResolution {
    pub fn new(suppliers: Arc<dyn SupplierRepository>) -> Self {
        Self { suppliers }
    }
}

#[async_trait]
impl SupplierResolution for FallbackResolution {
    async fn resolve(&self, supplier_id: Uuid) -> Result<Uuid, SupplierResolutionError> {
        let found = self
            .suppliers
            .get_supplier(supplier_id)
            .await
            .map_err(|e| SupplierResolutionError::Lookup(e.to_string()))?;
        if let Some(supplier) = found {
            return Ok(supplier.id);
        }

        if let Some(system) = self
            .suppliers
            .find_system_supplier()
            .await
            .map_err(|e| SupplierResolutionError::Lookup(e.to_string()))?
        {
            return Ok(system.id);
        }

        let system = Supplier::system();
        self.suppliers
            .insert_supplier(&system)
            .await
            .map_err(|e| SupplierResolutionError::Lookup(e.to_string()))?;
        Ok(system.id)
    }
}
