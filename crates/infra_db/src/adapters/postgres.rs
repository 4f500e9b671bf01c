//! PostgreSQL adapters for the sales and commission ports
//!
//! Each adapter wraps a repository and bounds every call with the configured
//! query timeout. A call that runs past it is abandoned; an open transaction
//! is rolled back when its future is dropped.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use infra_db::{create_pool, DatabaseConfig, PostgresOrderAdapter};
//! use domain_sales::OrderPort;
//!
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//! let orders: Arc<dyn OrderPort> = Arc::new(PostgresOrderAdapter::new(pool, config.query_timeout));
//! ```

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, CommissionPaymentId, DomainPort, HealthCheckResult, HealthCheckable, OrderId, PortError,
    ProductId, SellerId,
};
use domain_commission::{CommissionPayment, CommissionPort};
use domain_sales::{CatalogPort, Order, OrderPort, Product};

use crate::error::DatabaseError;
use crate::repositories::{CommissionRepository, OrderRepository, ProductRepository};

/// Runs a repository call under `limit`
async fn timed<T, F>(operation: &'static str, limit: Duration, call: F) -> Result<T, PortError>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(PortError::from),
        Err(_) => Err(DatabaseError::Timeout {
            operation,
            duration_ms: limit.as_millis() as u64,
        }
        .into()),
    }
}

/// Performs `SELECT 1` and reports latency
async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };
    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}

/// PostgreSQL-backed implementation of [`OrderPort`]
#[derive(Debug, Clone)]
pub struct PostgresOrderAdapter {
    repository: OrderRepository,
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresOrderAdapter {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            repository: OrderRepository::new(pool.clone()),
            pool,
            query_timeout,
        }
    }

    pub fn repository(&self) -> &OrderRepository {
        &self.repository
    }
}

impl DomainPort for PostgresOrderAdapter {}

#[async_trait]
impl HealthCheckable for PostgresOrderAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-order-adapter").await
    }
}

#[async_trait]
impl OrderPort for PostgresOrderAdapter {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn insert_order(&self, order: &Order) -> Result<Order, PortError> {
        timed("insert_order", self.query_timeout, self.repository.insert(order)).await?;
        Ok(order.clone())
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
        timed("get_order", self.query_timeout, self.repository.get(Uuid::from(id))).await
    }

    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn save_order(&self, order: &Order, expected_version: i64) -> Result<Order, PortError> {
        let version = timed(
            "save_order",
            self.query_timeout,
            self.repository.update_versioned(order, expected_version),
        )
        .await?;
        debug!(version, "Order saved");

        let mut stored = order.clone();
        stored.version = version;
        Ok(stored)
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn delete_order(&self, id: OrderId, expected_version: i64) -> Result<(), PortError> {
        timed(
            "delete_order",
            self.query_timeout,
            self.repository.delete_versioned(Uuid::from(id), expected_version),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn find_by_gateway_payment_id(&self, external_payment_id: &str) -> Result<Order, PortError> {
        timed(
            "find_by_gateway_payment_id",
            self.query_timeout,
            self.repository.find_by_gateway_payment_id(external_payment_id),
        )
        .await
    }

    #[instrument(skip(self), fields(seller_id = %seller_id))]
    async fn list_orders_by_seller(&self, seller_id: SellerId) -> Result<Vec<Order>, PortError> {
        timed(
            "list_orders_by_seller",
            self.query_timeout,
            self.repository.list_by_seller(Uuid::from(seller_id)),
        )
        .await
    }
}

/// PostgreSQL-backed implementation of [`CatalogPort`]
#[derive(Debug, Clone)]
pub struct PostgresCatalogAdapter {
    repository: ProductRepository,
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresCatalogAdapter {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            repository: ProductRepository::new(pool.clone()),
            pool,
            query_timeout,
        }
    }
}

impl DomainPort for PostgresCatalogAdapter {}

#[async_trait]
impl HealthCheckable for PostgresCatalogAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-catalog-adapter").await
    }
}

#[async_trait]
impl CatalogPort for PostgresCatalogAdapter {
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, PortError> {
        let ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        timed("get_products", self.query_timeout, self.repository.get_many(&ids)).await
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn upsert_product(&self, product: &Product) -> Result<(), PortError> {
        timed("upsert_product", self.query_timeout, self.repository.upsert(product)).await
    }
}

/// PostgreSQL-backed implementation of [`CommissionPort`]
#[derive(Debug, Clone)]
pub struct PostgresCommissionAdapter {
    repository: CommissionRepository,
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresCommissionAdapter {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            repository: CommissionRepository::new(pool.clone()),
            pool,
            query_timeout,
        }
    }
}

impl DomainPort for PostgresCommissionAdapter {}

#[async_trait]
impl HealthCheckable for PostgresCommissionAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-commission-adapter").await
    }
}

#[async_trait]
impl CommissionPort for PostgresCommissionAdapter {
    #[instrument(skip(self, payment), fields(payment_id = %payment.id, orders = payment.order_ids.len()))]
    async fn settle(&self, payment: &CommissionPayment) -> Result<CommissionPayment, PortError> {
        timed("settle_commissions", self.query_timeout, self.repository.settle(payment)).await?;
        Ok(payment.clone())
    }

    #[instrument(skip(self), fields(payment_id = %id))]
    async fn get_payment(&self, id: CommissionPaymentId) -> Result<CommissionPayment, PortError> {
        timed("get_commission_payment", self.query_timeout, self.repository.get(Uuid::from(id))).await
    }

    #[instrument(skip(self), fields(payment_id = %id))]
    async fn reverse(&self, id: CommissionPaymentId) -> Result<CommissionPayment, PortError> {
        timed("reverse_commissions", self.query_timeout, self.repository.reverse(Uuid::from(id))).await
    }

    #[instrument(skip(self), fields(seller_id = %seller_id))]
    async fn list_payments(&self, seller_id: SellerId) -> Result<Vec<CommissionPayment>, PortError> {
        timed(
            "list_commission_payments",
            self.query_timeout,
            self.repository.list_by_seller(Uuid::from(seller_id)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slow_call_becomes_timeout() {
        let result: Result<(), PortError> = timed("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;

        match result {
            Err(PortError::Timeout { operation, duration_ms }) => {
                assert_eq!(operation, "slow");
                assert_eq!(duration_ms, 10);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_repository_error_is_translated() {
        let result: Result<(), PortError> = timed("lookup", Duration::from_secs(1), async {
            Err(DatabaseError::not_found("Order", "ORD-1"))
        })
        .await;

        assert!(matches!(result, Err(PortError::NotFound { .. })));
    }
}
