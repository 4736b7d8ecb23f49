use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use vendra_order::models::{Customer, Payment, SupplierSettlement};
use vendra_order::repository::{CustomerRepository, PaymentRepository, SettlementRepository};

pub struct StorePaymentRepository {
    pool: PgPool,
}

impl StorePaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: Uuid,
    supplier_id: Uuid,
    transaction_id: Option<String>,
    amount_cents: i64,
    fee_cents: i64,
    net_cents: i64,
    currency: String,
    status: String,
    failure_message: Option<String>,
    raw_response: serde_json::Value,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> Result<Payment, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Payment {
            id: self.id,
            order_id: self.order_id,
            supplier_id: self.supplier_id,
            transaction_id: self.transaction_id,
            amount_cents: self.amount_cents,
            fee_cents: self.fee_cents,
            net_cents: self.net_cents,
            currency: self.currency,
            status: self.status.parse()?,
            failure_message: self.failure_message,
            raw_response: self.raw_response,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl PaymentRepository for StorePaymentRepository {
    async fn insert_payment(
        &self,
        payment: &Payment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, supplier_id, transaction_id, amount_cents, fee_cents, net_cents, currency, status, failure_message, raw_response, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(payment.supplier_id)
        .bind(&payment.transaction_id)
        .bind(payment.amount_cents)
        .bind(payment.fee_cents)
        .bind(payment.net_cents)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(&payment.failure_message)
        .bind(&payment.raw_response)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<Payment>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, order_id, supplier_id, transaction_id, amount_cents, fee_cents, net_cents, currency, status, failure_message, raw_response, created_at FROM payments WHERE order_id = $1 ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PaymentRow::into_payment).collect()
    }
}

pub struct StoreSettlementRepository {
    pool: PgPool,
}

impl StoreSettlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SettlementRow {
    id: Uuid,
    supplier_id: Uuid,
    order_id: Uuid,
    payment_id: Uuid,
    transaction_ref: String,
    gross_cents: i64,
    commission_cents: i64,
    net_cents: i64,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl SettlementRow {
    fn into_settlement(
        self,
    ) -> Result<SupplierSettlement, Box<dyn std::error::Error + Send + Sync>> {
        Ok(SupplierSettlement {
            id: self.id,
            supplier_id: self.supplier_id,
            order_id: self.order_id,
            payment_id: self.payment_id,
            transaction_ref: self.transaction_ref,
            gross_cents: self.gross_cents,
            commission_cents: self.commission_cents,
            net_cents: self.net_cents,
            status: self.status.parse()?,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl SettlementRepository for StoreSettlementRepository {
    async fn insert_if_absent(
        &self,
        settlement: &SupplierSettlement,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        // The (order, payment, supplier) unique constraint backs the
        // dedup; ON CONFLICT DO NOTHING makes re-invocation a no-op.
        let result = sqlx::query(
            r#"
            INSERT INTO supplier_settlements (id, supplier_id, order_id, payment_id, transaction_ref, gross_cents, commission_cents, net_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (order_id, payment_id, supplier_id) DO NOTHING
            "#,
        )
        .bind(settlement.id)
        .bind(settlement.supplier_id)
        .bind(settlement.order_id)
        .bind(settlement.payment_id)
        .bind(&settlement.transaction_ref)
        .bind(settlement.gross_cents)
        .bind(settlement.commission_cents)
        .bind(settlement.net_cents)
        .bind(settlement.status.as_str())
        .bind(settlement.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_by_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Vec<SupplierSettlement>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, SettlementRow>(
            "SELECT id, supplier_id, order_id, payment_id, transaction_ref, gross_cents, commission_cents, net_cents, status, created_at FROM supplier_settlements WHERE payment_id = $1 ORDER BY supplier_id",
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SettlementRow::into_settlement).collect()
    }
}

pub struct StoreCustomerRepository {
    pool: PgPool,
}

impl StoreCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    email: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
impl CustomerRepository for StoreCustomerRepository {
    async fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Customer>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, user_id, name, email, created_at FROM customers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| Customer {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            email: r.email,
            created_at: r.created_at,
        }))
    }

    async fn insert_customer(
        &self,
        customer: &Customer,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            "INSERT INTO customers (id, user_id, name, email, created_at) VALUES ($1, $2, $3, $4, $5) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(customer.id)
        .bind(customer.user_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
