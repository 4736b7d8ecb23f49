use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use vendra_order::models::{Order, OrderItem, OrderPaymentStatus};
use vendra_order::repository::{CheckoutCommitError, OrderRepository};
use vendra_shared::Address;

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_ref: String,
    user_id: Option<Uuid>,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    customer_notes: Option<String>,
    shipping_method: String,
    tracking_number: Option<String>,
    admin_notes: Option<String>,
    billing_address: serde_json::Value,
    shipping_address: serde_json::Value,
    subtotal_cents: i64,
    tax_cents: i64,
    shipping_cents: i64,
    discount_cents: i64,
    grand_total_cents: i64,
    status: String,
    payment_status: String,
    shipping_status: String,
    order_date: chrono::DateTime<chrono::Utc>,
    processing_date: Option<chrono::DateTime<chrono::Utc>>,
    shipped_date: Option<chrono::DateTime<chrono::Utc>>,
    delivered_date: Option<chrono::DateTime<chrono::Utc>>,
    cancelled_date: Option<chrono::DateTime<chrono::Utc>>,
    cancel_reason: Option<String>,
    cancel_notes: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    supplier_id: Uuid,
    name: String,
    sku: String,
    brand: Option<String>,
    image_url: Option<String>,
    unit_price_cents: i64,
    quantity: i32,
    discount_cents: i64,
    tax_cents: i64,
    total_price_cents: i64,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

const ORDER_COLUMNS: &str = "id, order_number, customer_ref, user_id, customer_name, customer_email, customer_phone, customer_notes, shipping_method, tracking_number, admin_notes, billing_address, shipping_address, subtotal_cents, tax_cents, shipping_cents, discount_cents, grand_total_cents, status, payment_status, shipping_status, order_date, processing_date, shipped_date, delivered_date, cancelled_date, cancel_reason, cancel_notes";

const ITEM_COLUMNS: &str = "id, order_id, product_id, supplier_id, name, sku, brand, image_url, unit_price_cents, quantity, discount_cents, tax_cents, total_price_cents, status, created_at";

fn order_from_rows(
    row: OrderRow,
    item_rows: Vec<OrderItemRow>,
) -> Result<Order, Box<dyn std::error::Error + Send + Sync>> {
    let billing_address: Address = serde_json::from_value(row.billing_address)?;
    let shipping_address: Address = serde_json::from_value(row.shipping_address)?;

    let mut items = Vec::with_capacity(item_rows.len());
    for item in item_rows {
        items.push(OrderItem {
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            supplier_id: item.supplier_id,
            name: item.name,
            sku: item.sku,
            brand: item.brand,
            image_url: item.image_url,
            unit_price_cents: item.unit_price_cents,
            quantity: item.quantity,
            discount_cents: item.discount_cents,
            tax_cents: item.tax_cents,
            total_price_cents: item.total_price_cents,
            status: item.status.parse()?,
            created_at: item.created_at,
        });
    }

    Ok(Order {
        id: row.id,
        order_number: row.order_number,
        customer_ref: row.customer_ref,
        user_id: row.user_id,
        customer_name: row.customer_name,
        customer_email: row.customer_email,
        customer_phone: row.customer_phone,
        customer_notes: row.customer_notes,
        shipping_method: row.shipping_method,
        tracking_number: row.tracking_number,
        admin_notes: row.admin_notes,
        billing_address,
        shipping_address,
        subtotal_cents: row.subtotal_cents,
        tax_cents: row.tax_cents,
        shipping_cents: row.shipping_cents,
        discount_cents: row.discount_cents,
        grand_total_cents: row.grand_total_cents,
        status: row.status.parse()?,
        payment_status: row.payment_status.parse()?,
        shipping_status: row.shipping_status.parse()?,
        order_date: row.order_date,
        processing_date: row.processing_date,
        shipped_date: row.shipped_date,
        delivered_date: row.delivered_date,
        cancelled_date: row.cancelled_date,
        cancel_reason: row.cancel_reason,
        cancel_notes: row.cancel_notes,
        items,
    })
}

async fn insert_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, order_number, customer_ref, user_id, customer_name, customer_email, customer_phone, customer_notes, shipping_method, tracking_number, admin_notes, billing_address, shipping_address, subtotal_cents, tax_cents, shipping_cents, discount_cents, grand_total_cents, status, payment_status, shipping_status, order_date, processing_date, shipped_date, delivered_date, cancelled_date, cancel_reason, cancel_notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28)
        "#,
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(&order.customer_ref)
    .bind(order.user_id)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.customer_notes)
    .bind(&order.shipping_method)
    .bind(&order.tracking_number)
    .bind(&order.admin_notes)
    .bind(serde_json::to_value(&order.billing_address).unwrap_or_default())
    .bind(serde_json::to_value(&order.shipping_address).unwrap_or_default())
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.shipping_cents)
    .bind(order.discount_cents)
    .bind(order.grand_total_cents)
    .bind(order.status.as_str())
    .bind(order.payment_status.as_str())
    .bind(order.shipping_status.as_str())
    .bind(order.order_date)
    .bind(order.processing_date)
    .bind(order.shipped_date)
    .bind(order.delivered_date)
    .bind(order.cancelled_date)
    .bind(&order.cancel_reason)
    .bind(&order.cancel_notes)
    .execute(&mut **tx)
    .await?;

    for item in &order.items {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, supplier_id, name, sku, brand, image_url, unit_price_cents, quantity, discount_cents, tax_cents, total_price_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(item.supplier_id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.brand)
        .bind(&item.image_url)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(item.discount_cents)
        .bind(item.tax_cents)
        .bind(item.total_price_cents)
        .bind(item.status.as_str())
        .bind(item.created_at)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn commit_checkout(
        &self,
        order: &Order,
        session_key: &str,
    ) -> Result<(), CheckoutCommitError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CheckoutCommitError::Storage(Box::new(e)))?;

        // 1. Conditional stock decrement per line; rows_affected = 0 means
        //    another checkout took the stock first.
        for item in &order.items {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - $1, sold_count = sold_count + $1 WHERE id = $2 AND stock >= $1",
            )
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckoutCommitError::Storage(Box::new(e)))?;

            if result.rows_affected() != 1 {
                tx.rollback()
                    .await
                    .map_err(|e| CheckoutCommitError::Storage(Box::new(e)))?;
                return Err(CheckoutCommitError::OutOfStock {
                    product_id: item.product_id,
                });
            }
        }

        // 2. Order and item snapshots
        insert_order_tx(&mut tx, order)
            .await
            .map_err(|e| CheckoutCommitError::Storage(Box::new(e)))?;

        // 3. The cart is consumed by the same transaction
        sqlx::query("DELETE FROM cart_items WHERE session_key = $1")
            .bind(session_key)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckoutCommitError::Storage(Box::new(e)))?;

        tx.commit()
            .await
            .map_err(|e| CheckoutCommitError::Storage(Box::new(e)))?;
        Ok(())
    }

    async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let item_rows = sqlx::query_as::<_, OrderItemRow>(&format!(
                    "SELECT {} FROM order_items WHERE order_id = $1 ORDER BY created_at",
                    ITEM_COLUMNS
                ))
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
                Ok(Some(order_from_rows(row, item_rows)?))
            }
            None => Ok(None),
        }
    }

    async fn list_orders(
        &self,
        customer_ref: &str,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM orders WHERE customer_ref = $1 ORDER BY order_date DESC",
        )
        .bind(customer_ref)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::new();
        for (id,) in ids {
            if let Some(order) = self.get_order(id).await? {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    async fn list_orders_with_supplier_items(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT o.id FROM orders o
            JOIN order_items i ON i.order_id = o.id
            WHERE i.supplier_id = $1
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::new();
        for (id,) in ids {
            if let Some(order) = self.get_order(id).await? {
                orders.push(order);
            }
        }
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    async fn commit_cancellation(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        // Stock back first; a missing product row is tolerated (0 rows).
        for item in &order.items {
            sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
                .bind(item.quantity)
                .bind(item.product_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $1,
                cancelled_date = COALESCE(cancelled_date, $2),
                cancel_reason = $3,
                cancel_notes = $4
            WHERE id = $5
            "#,
        )
        .bind(order.status.as_str())
        .bind(order.cancelled_date)
        .bind(&order.cancel_reason)
        .bind(&order.cancel_notes)
        .bind(order.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $1,
                shipping_status = $2,
                tracking_number = $3,
                admin_notes = $4,
                processing_date = COALESCE(processing_date, $5),
                shipped_date = COALESCE(shipped_date, $6),
                delivered_date = COALESCE(delivered_date, $7),
                cancelled_date = COALESCE(cancelled_date, $8)
            WHERE id = $9
            "#,
        )
        .bind(order.status.as_str())
        .bind(order.shipping_status.as_str())
        .bind(&order.tracking_number)
        .bind(&order.admin_notes)
        .bind(order.processing_date)
        .bind(order.shipped_date)
        .bind(order.delivered_date)
        .bind(order.cancelled_date)
        .bind(order.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_payment_status(
        &self,
        id: Uuid,
        status: OrderPaymentStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("UPDATE orders SET payment_status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
