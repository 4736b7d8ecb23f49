use crate::repository::OrderRepository;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;
use vendra_catalog::product::ProductRepository;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Dashboard aggregation failed: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Clone, Serialize)]
pub struct LowStockAlert {
    pub product_id: Uuid,
    pub name: String,
    pub stock: i32,
    pub min_stock_quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyIncome {
    pub year: i32,
    pub month: u32,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub sold_count: i32,
    pub total_sales_cents: i64,
}

/// Read-only rollup of a supplier's storefront activity.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub supplier_id: Uuid,
    pub published_products: usize,
    pub total_stock: i64,
    pub low_stock_alerts: Vec<LowStockAlert>,
    pub orders_by_status: BTreeMap<String, u64>,
    pub total_sales_cents: i64,
    pub monthly_income: Vec<MonthlyIncome>,
    pub top_products: Vec<TopProduct>,
    pub average_rating: Option<f64>,
}

/// Builds supplier dashboards from orders and catalog state. Purely derived;
/// performs no mutation and tolerates a supplier with no products or orders.
pub struct SupplierDashboard {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl SupplierDashboard {
    pub fn new(products: Arc<dyn ProductRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { products, orders }
    }

    pub async fn dashboard(
        &self,
        supplier_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DashboardSnapshot, DashboardError> {
        let products = self.products.list_by_supplier(supplier_id).await?;
        let orders = self
            .orders
            .list_orders_with_supplier_items(supplier_id)
            .await?;

        let published: Vec<_> = products.iter().filter(|p| p.is_published).collect();
        let total_stock: i64 = published.iter().map(|p| p.stock as i64).sum();

        let low_stock_alerts: Vec<LowStockAlert> = products
            .iter()
            .filter(|p| p.is_low_stock())
            .map(|p| LowStockAlert {
                product_id: p.id,
                name: p.name.clone(),
                stock: p.stock,
                min_stock_quantity: p.min_stock_quantity,
            })
            .collect();

        let mut orders_by_status: BTreeMap<String, u64> = BTreeMap::new();
        for order in &orders {
            *orders_by_status
                .entry(order.status.as_str().to_string())
                .or_insert(0) += 1;
        }

        // Only this supplier's lines count toward its income figures.
        let mut total_sales_cents: i64 = 0;
        let mut sales_by_product: BTreeMap<Uuid, i64> = BTreeMap::new();
        let months = trailing_months(now, 12);
        let mut income_by_month: BTreeMap<(i32, u32), i64> =
            months.iter().map(|&key| (key, 0)).collect();
        for order in &orders {
            let order_month = (order.order_date.year(), order.order_date.month());
            for item in order.items.iter().filter(|i| i.supplier_id == supplier_id) {
                total_sales_cents += item.total_price_cents;
                *sales_by_product.entry(item.product_id).or_insert(0) += item.total_price_cents;
                if let Some(bucket) = income_by_month.get_mut(&order_month) {
                    *bucket += item.total_price_cents;
                }
            }
        }
        let monthly_income: Vec<MonthlyIncome> = months
            .iter()
            .map(|&(year, month)| MonthlyIncome {
                year,
                month,
                total_cents: income_by_month.get(&(year, month)).copied().unwrap_or(0),
            })
            .collect();

        let mut ranked: Vec<&vendra_catalog::product::Product> = products.iter().collect();
        ranked.sort_by(|a, b| b.sold_count.cmp(&a.sold_count).then(a.name.cmp(&b.name)));
        let top_products: Vec<TopProduct> = ranked
            .into_iter()
            .take(5)
            .map(|p| TopProduct {
                product_id: p.id,
                name: p.name.clone(),
                sold_count: p.sold_count,
                total_sales_cents: sales_by_product.get(&p.id).copied().unwrap_or(0),
            })
            .collect();

        let ratings: Vec<f64> = products.iter().filter_map(|p| p.rating).collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        };

        Ok(DashboardSnapshot {
            supplier_id,
            published_products: published.len(),
            total_stock,
            low_stock_alerts,
            orders_by_status,
            total_sales_cents,
            monthly_income,
            top_products,
            average_rating,
        })
    }
}

/// The last `count` (year, month) pairs ending with `now`'s month, oldest
/// first.
fn trailing_months(now: DateTime<Utc>, count: u32) -> Vec<(i32, u32)> {
    let mut year = now.year();
    let mut month = now.month();
    let mut months = Vec::with_capacity(count as usize);
    for _ in 0..count {
        months.push((year, month));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    months.reverse();
    months
}
