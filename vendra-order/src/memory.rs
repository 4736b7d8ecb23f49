use crate::models::{Customer, Order, OrderPaymentStatus, Payment, SupplierSettlement};
use crate::repository::{
    CheckoutCommitError, CustomerRepository, OrderRepository, PaymentRepository,
    SettlementRepository,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;
use vendra_cart::cart::CartRepository;
use vendra_catalog::product::ProductRepository;

/// In-memory order store used by tests and local development.
///
/// The checkout commit spans three stores (orders, products, carts), so this
/// implementation composes the in-memory product and cart repositories and
/// emulates the transaction by reserving stock line by line and releasing
/// every prior reservation when one line comes up short.
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
    products: Arc<dyn ProductRepository>,
    carts: Arc<dyn CartRepository>,
}

impl InMemoryOrderRepository {
    pub fn new(products: Arc<dyn ProductRepository>, carts: Arc<dyn CartRepository>) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            products,
            carts,
        }
    }

    /// Insert an order directly, bypassing checkout. Test seam.
    pub fn seed(&self, order: Order) {
        self.orders.write().unwrap().insert(order.id, order);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn commit_checkout(
        &self,
        order: &Order,
        session_key: &str,
    ) -> Result<(), CheckoutCommitError> {
        // Reserve stock per line; roll back earlier lines on a shortfall.
        let mut reserved: Vec<(Uuid, i32)> = Vec::new();
        for item in &order.items {
            let ok = self
                .products
                .try_reserve_stock(item.product_id, item.quantity)
                .await
                .map_err(CheckoutCommitError::Storage)?;
            if !ok {
                for (product_id, quantity) in reserved {
                    let _ = self.products.restock(product_id, quantity).await;
                }
                return Err(CheckoutCommitError::OutOfStock {
                    product_id: item.product_id,
                });
            }
            reserved.push((item.product_id, item.quantity));
        }

        self.orders
            .write()
            .unwrap()
            .insert(order.id, order.clone());
        self.carts
            .clear(session_key)
            .await
            .map_err(CheckoutCommitError::Storage)?;
        Ok(())
    }

    async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.orders.read().unwrap().get(&id).cloned())
    }

    async fn list_orders(
        &self,
        customer_ref: &str,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .unwrap()
            .values()
            .filter(|o| o.customer_ref == customer_ref)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    async fn list_orders_with_supplier_items(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .unwrap()
            .values()
            .filter(|o| o.has_item_from(supplier_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    async fn commit_cancellation(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for item in &order.items {
            self.products.restock(item.product_id, item.quantity).await?;
        }
        self.orders
            .write()
            .unwrap()
            .insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.orders
            .write()
            .unwrap()
            .insert(order.id, order.clone());
        Ok(())
    }

    async fn set_payment_status(
        &self,
        id: Uuid,
        status: OrderPaymentStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(order) = self.orders.write().unwrap().get_mut(&id) {
            order.payment_status = status;
        }
        Ok(())
    }
}

pub struct InMemoryPaymentRepository {
    payments: RwLock<Vec<Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self {
            payments: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryPaymentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn insert_payment(
        &self,
        payment: &Payment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.payments.write().unwrap().push(payment.clone());
        Ok(())
    }

    async fn list_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<Payment>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .payments
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect())
    }
}

pub struct InMemorySettlementRepository {
    settlements: RwLock<Vec<SupplierSettlement>>,
}

impl InMemorySettlementRepository {
    pub fn new() -> Self {
        Self {
            settlements: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemorySettlementRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettlementRepository for InMemorySettlementRepository {
    async fn insert_if_absent(
        &self,
        settlement: &SupplierSettlement,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut settlements = self.settlements.write().unwrap();
        let exists = settlements.iter().any(|s| {
            s.order_id == settlement.order_id
                && s.payment_id == settlement.payment_id
                && s.supplier_id == settlement.supplier_id
        });
        if exists {
            return Ok(false);
        }
        settlements.push(settlement.clone());
        Ok(true)
    }

    async fn list_by_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Vec<SupplierSettlement>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .settlements
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.payment_id == payment_id)
            .cloned()
            .collect())
    }
}

pub struct InMemoryCustomerRepository {
    customers: RwLock<HashMap<Uuid, Customer>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self {
            customers: RwLock::new(HashMap::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.customers.read().unwrap().len()
    }
}

impl Default for InMemoryCustomerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Customer>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .customers
            .read()
            .unwrap()
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn insert_customer(
        &self,
        customer: &Customer,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.customers
            .write()
            .unwrap()
            .insert(customer.id, customer.clone());
        Ok(())
    }
}
