use crate::models::{
    Customer, Order, OrderItem, OrderItemStatus, OrderPaymentStatus, OrderStatus, ShippingStatus,
};
use crate::repository::{CheckoutCommitError, CustomerRepository, OrderRepository};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;
use vendra_cart::cart::{CartItem, CartRepository};
use vendra_catalog::product::ProductRepository;
use vendra_core::identity::CallerIdentity;
use vendra_shared::models::events::OrderPlacedEvent;
use vendra_shared::Address;

/// Business rules injected from configuration, never hard-coded.
#[derive(Debug, Clone)]
pub struct CheckoutRules {
    /// Subtotals strictly above this ship free.
    pub free_shipping_threshold_cents: i64,
    pub shipping_fee_cents: i64,
}

impl Default for CheckoutRules {
    fn default() -> Self {
        Self {
            free_shipping_threshold_cents: 5_000,
            shipping_fee_cents: 1_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub shipping_method: String,
    pub customer_notes: Option<String>,
    pub billing_address: Address,
    pub shipping_address: Address,
    pub contact: CustomerContact,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: i32,
        available: i32,
    },

    #[error("Product {0} is no longer available")]
    ProductMissing(Uuid),

    #[error("Invalid checkout request: {0}")]
    Validation(String),

    #[error("Checkout failed: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Converts a session cart into a durable order.
///
/// Everything that mutates state happens inside the repository's
/// `commit_checkout` unit of work; until that commit, no stock change, order
/// row or cart deletion is visible to anyone else.
pub struct CheckoutOrchestrator {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
    customers: Arc<dyn CustomerRepository>,
    orders: Arc<dyn OrderRepository>,
    rules: CheckoutRules,
}

impl CheckoutOrchestrator {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        products: Arc<dyn ProductRepository>,
        customers: Arc<dyn CustomerRepository>,
        orders: Arc<dyn OrderRepository>,
        rules: CheckoutRules,
    ) -> Self {
        Self {
            carts,
            products,
            customers,
            orders,
            rules,
        }
    }

    pub async fn checkout(
        &self,
        caller: &CallerIdentity,
        req: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        // 1. Validate the request shape before touching anything
        req.billing_address
            .validate()
            .map_err(CheckoutError::Validation)?;
        req.shipping_address
            .validate()
            .map_err(CheckoutError::Validation)?;
        if req.contact.name.trim().is_empty() || req.contact.email.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "contact name and email are required".to_string(),
            ));
        }

        // 2. Load the caller's cart
        let session_key = caller.cart_key();
        let cart_items = self.carts.list_items(&session_key).await?;
        if cart_items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // 3. Pre-check stock against the current catalog. This produces the
        //    friendly error message; the authoritative guard is the
        //    conditional decrement inside commit_checkout.
        let mut brands: std::collections::HashMap<Uuid, Option<String>> =
            std::collections::HashMap::new();
        for line in &cart_items {
            let product = self
                .products
                .get_product(line.product_id)
                .await?
                .ok_or(CheckoutError::ProductMissing(line.product_id))?;
            if product.stock < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    name: product.name,
                    requested: line.quantity,
                    available: product.stock,
                });
            }
            brands.insert(product.id, product.brand);
        }

        // 4. Totals from the cart's snapshotted prices, not a fresh catalog read
        let subtotal_cents: i64 = cart_items.iter().map(|i| i.line_total_cents()).sum();
        let shipping_cents = if subtotal_cents > self.rules.free_shipping_threshold_cents {
            0
        } else {
            self.rules.shipping_fee_cents
        };
        let tax_cents = 0;
        let discount_cents = 0;
        let grand_total_cents = subtotal_cents + tax_cents + shipping_cents - discount_cents;

        // 5. Lazily create a customer profile on an authenticated first order
        if let CallerIdentity::Customer { user_id, email } = caller {
            if self.customers.find_by_user(*user_id).await?.is_none() {
                let profile = Customer {
                    id: Uuid::new_v4(),
                    user_id: *user_id,
                    name: req.contact.name.clone(),
                    email: email.clone(),
                    created_at: Utc::now(),
                };
                self.customers.insert_customer(&profile).await?;
            }
        }

        // 6. Build the order and its item snapshots
        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let items: Vec<OrderItem> = cart_items
            .iter()
            .map(|line| {
                let brand = brands.get(&line.product_id).cloned().flatten();
                order_item_from_line(order_id, line, brand)
            })
            .collect();
        let order = Order {
            id: order_id,
            order_number: generate_order_number(),
            customer_ref: caller.customer_ref(),
            user_id: caller.user_id(),
            customer_name: req.contact.name,
            customer_email: req.contact.email,
            customer_phone: req.contact.phone,
            customer_notes: req.customer_notes,
            shipping_method: req.shipping_method,
            tracking_number: None,
            admin_notes: None,
            billing_address: req.billing_address,
            shipping_address: req.shipping_address,
            subtotal_cents,
            tax_cents,
            shipping_cents,
            discount_cents,
            grand_total_cents,
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Pending,
            shipping_status: ShippingStatus::NotShipped,
            order_date: now,
            processing_date: None,
            shipped_date: None,
            delivered_date: None,
            cancelled_date: None,
            cancel_reason: None,
            cancel_notes: None,
            items,
        };

        // 7. Atomic commit: order + items insert, conditional stock
        //    decrement, cart deletion. All-or-nothing.
        match self.orders.commit_checkout(&order, &session_key).await {
            Ok(()) => {}
            Err(CheckoutCommitError::OutOfStock { product_id }) => {
                // Lost a race since the pre-check; report current availability.
                let current = self.products.get_product(product_id).await?;
                let (name, available) = current
                    .map(|p| (p.name, p.stock))
                    .unwrap_or_else(|| (product_id.to_string(), 0));
                let requested = order
                    .items
                    .iter()
                    .find(|i| i.product_id == product_id)
                    .map(|i| i.quantity)
                    .unwrap_or(0);
                return Err(CheckoutError::InsufficientStock {
                    name,
                    requested,
                    available,
                });
            }
            Err(CheckoutCommitError::Storage(e)) => return Err(CheckoutError::Storage(e)),
        }

        let event = OrderPlacedEvent {
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_ref: order.customer_ref.clone(),
            grand_total_cents: order.grand_total_cents,
            item_count: order.items.len(),
            timestamp: now.timestamp(),
        };
        tracing::info!(event = ?event, "Order placed");

        Ok(order)
    }
}

fn order_item_from_line(order_id: Uuid, line: &CartItem, brand: Option<String>) -> OrderItem {
    let discount_cents = 0;
    let tax_cents = 0;
    OrderItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: line.product_id,
        supplier_id: line.supplier_id,
        name: line.name.clone(),
        sku: line.sku.clone(),
        brand,
        image_url: line.image_url.clone(),
        unit_price_cents: line.unit_price_cents,
        quantity: line.quantity,
        discount_cents,
        tax_cents,
        total_price_cents: line.unit_price_cents * line.quantity as i64 - discount_cents
            + tax_cents,
        status: OrderItemStatus::Active,
        created_at: Utc::now(),
    }
}

/// Human-readable order number: prefix + compact timestamp + 4-digit random
/// suffix. Collisions are accepted, not deduplicated.
fn generate_order_number() -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("ORD-{}-{:04}", timestamp, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryCustomerRepository, InMemoryOrderRepository};
    use vendra_cart::cart::CartService;
    use vendra_cart::memory::InMemoryCartRepository;
    use vendra_catalog::memory::InMemoryProductRepository;
    use vendra_catalog::product::Product;

    struct Fixture {
        carts: Arc<InMemoryCartRepository>,
        products: Arc<InMemoryProductRepository>,
        customers: Arc<InMemoryCustomerRepository>,
        orchestrator: CheckoutOrchestrator,
        cart_service: CartService,
    }

    fn fixture() -> Fixture {
        let carts = Arc::new(InMemoryCartRepository::new());
        let products = Arc::new(InMemoryProductRepository::new());
        let customers = Arc::new(InMemoryCustomerRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new(
            products.clone(),
            carts.clone(),
        ));
        let orchestrator = CheckoutOrchestrator::new(
            carts.clone(),
            products.clone(),
            customers.clone(),
            orders,
            CheckoutRules::default(),
        );
        let cart_service = CartService::new(carts.clone(), products.clone());
        Fixture {
            carts,
            products,
            customers,
            orchestrator,
            cart_service,
        }
    }

    fn seed_product(fix: &Fixture, price_cents: i64, stock: i32) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            name: "Ceramic Pour-Over".to_string(),
            sku: format!("CP-{}", stock),
            brand: None,
            image_url: None,
            price_cents,
            stock,
            min_stock_quantity: 1,
            sold_count: 0,
            rating: None,
            is_published: true,
            created_at: Utc::now(),
        };
        fix.products.seed(product.clone());
        product
    }

    fn request() -> CheckoutRequest {
        let address = Address {
            recipient: "Ada Lovelace".to_string(),
            phone: "+44 20 7946 0000".to_string(),
            line1: "12 Analytical Row".to_string(),
            line2: None,
            city: "London".to_string(),
            region: "Greater London".to_string(),
            postal_code: "N1 9GU".to_string(),
            country: "GB".to_string(),
        };
        CheckoutRequest {
            shipping_method: "standard".to_string(),
            customer_notes: None,
            billing_address: address.clone(),
            shipping_address: address,
            contact: CustomerContact {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
            },
        }
    }

    fn anonymous() -> CallerIdentity {
        CallerIdentity::Anonymous {
            session_id: "s-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_checkout_totals_stock_and_cart_clearing() {
        let fix = fixture();
        let caller = anonymous();
        // price 30.00, qty 2 => subtotal 60.00 => free shipping
        let product = seed_product(&fix, 3_000, 10);
        fix.cart_service
            .add_item(&caller.cart_key(), product.id, 2)
            .await
            .unwrap();

        let order = fix.orchestrator.checkout(&caller, request()).await.unwrap();

        assert_eq!(order.subtotal_cents, 6_000);
        assert_eq!(order.shipping_cents, 0);
        assert_eq!(order.grand_total_cents, 6_000);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.order_number.starts_with("ORD-"));

        let after = fix.products.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 8);
        assert_eq!(after.sold_count, 2);

        let cart = fix.carts.list_items(&caller.cart_key()).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_small_subtotal_pays_flat_shipping() {
        let fix = fixture();
        let caller = anonymous();
        let product = seed_product(&fix, 2_000, 5);
        fix.cart_service
            .add_item(&caller.cart_key(), product.id, 1)
            .await
            .unwrap();

        let order = fix.orchestrator.checkout(&caller, request()).await.unwrap();
        assert_eq!(order.shipping_cents, 1_000);
        assert_eq!(order.grand_total_cents, 3_000);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected_without_side_effects() {
        let fix = fixture();
        let result = fix.orchestrator.checkout(&anonymous(), request()).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_insufficient_stock_names_product_and_availability() {
        let fix = fixture();
        let caller = anonymous();
        let product = seed_product(&fix, 3_000, 1);
        fix.cart_service
            .add_item(&caller.cart_key(), product.id, 3)
            .await
            .unwrap();

        let result = fix.orchestrator.checkout(&caller, request()).await;
        match result {
            Err(CheckoutError::InsufficientStock {
                name,
                requested,
                available,
            }) => {
                assert_eq!(name, product.name);
                assert_eq!(requested, 3);
                assert_eq!(available, 1);
            }
            other => panic!("expected InsufficientStock, got {:?}", other.map(|o| o.id)),
        }

        // No partial mutation: stock untouched, cart intact.
        let after = fix.products.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 1);
        assert_eq!(
            fix.carts.list_items(&caller.cart_key()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_multi_line_shortfall_rolls_back_every_reservation() {
        let fix = fixture();
        let caller = anonymous();
        let plenty = seed_product(&fix, 1_000, 10);
        let scarce = seed_product(&fix, 1_000, 1);
        fix.cart_service
            .add_item(&caller.cart_key(), plenty.id, 2)
            .await
            .unwrap();
        fix.cart_service
            .add_item(&caller.cart_key(), scarce.id, 2)
            .await
            .unwrap();

        let result = fix.orchestrator.checkout(&caller, request()).await;
        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientStock { .. })
        ));

        // The first line's reservation must have been rolled back.
        let p = fix.products.get_product(plenty.id).await.unwrap().unwrap();
        assert_eq!(p.stock, 10);
        assert_eq!(p.sold_count, 0);
    }

    #[tokio::test]
    async fn test_authenticated_first_order_creates_customer_profile_once() {
        let fix = fixture();
        let user_id = Uuid::new_v4();
        let caller = CallerIdentity::Customer {
            user_id,
            email: "ada@example.com".to_string(),
        };
        let product = seed_product(&fix, 8_000, 10);

        fix.cart_service
            .add_item(&caller.cart_key(), product.id, 1)
            .await
            .unwrap();
        let order = fix.orchestrator.checkout(&caller, request()).await.unwrap();
        assert_eq!(order.user_id, Some(user_id));

        let profile = fix.customers.find_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(profile.email, "ada@example.com");

        // Second order reuses the profile.
        fix.cart_service
            .add_item(&caller.cart_key(), product.id, 1)
            .await
            .unwrap();
        fix.orchestrator.checkout(&caller, request()).await.unwrap();
        assert_eq!(fix.customers.count(), 1);
    }

    #[tokio::test]
    async fn test_blank_address_is_rejected_before_any_side_effect() {
        let fix = fixture();
        let caller = anonymous();
        let product = seed_product(&fix, 3_000, 5);
        fix.cart_service
            .add_item(&caller.cart_key(), product.id, 1)
            .await
            .unwrap();

        let mut req = request();
        req.shipping_address.postal_code = String::new();
        let result = fix.orchestrator.checkout(&caller, req).await;
        assert!(matches!(result, Err(CheckoutError::Validation(_))));

        let after = fix.products.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 5);
    }
}
