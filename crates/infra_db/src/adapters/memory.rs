//! In-memory storage adapter
//!
//! [`InMemoryStore`] implements every port over one `RwLock`-guarded state,
//! with the same semantics as the PostgreSQL adapters: versioned order
//! saves, a unique gateway payment id, and all-or-nothing commission
//! settlement. Multi-record writes are staged on copies and only applied
//! once every check has passed.
//!
//! Failures can be injected per operation to exercise rollback paths, and
//! an artificial latency can be set to exercise timeouts.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use core_kernel::{
    AdapterHealth, CommissionPaymentId, DomainPort, HealthCheckResult, HealthCheckable, OrderId, PortError,
    ProductId, SellerId,
};
use domain_commission::{CommissionPayment, CommissionPort};
use domain_sales::{CatalogPort, Order, OrderPort, Product};

/// Write operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    InsertOrder,
    SaveOrder,
    DeleteOrder,
    Settle,
    Reverse,
}

#[derive(Debug, Default)]
struct StoreState {
    orders: HashMap<OrderId, Order>,
    products: HashMap<ProductId, Product>,
    payments: HashMap<CommissionPaymentId, CommissionPayment>,
}

/// In-memory implementation of the order, catalog and commission ports
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    op_timeout: Duration,
    latency: Mutex<Duration>,
    fail_next: Mutex<HashSet<WriteOp>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl InMemoryStore {
    /// Creates an empty store; every call is bounded by `op_timeout`
    pub fn new(op_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            op_timeout,
            latency: Mutex::new(Duration::ZERO),
            fail_next: Mutex::new(HashSet::new()),
        }
    }

    /// Makes the next `op` fail after its changes are staged
    pub fn fail_next(&self, op: WriteOp) {
        self.fail_next.lock().unwrap_or_else(|e| e.into_inner()).insert(op);
    }

    /// Delays every subsequent call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }

    fn injected(&self, op: WriteOp) -> Result<(), PortError> {
        if self.fail_next.lock().unwrap_or_else(|e| e.into_inner()).remove(&op) {
            warn!(?op, "Injected write failure");
            return Err(PortError::internal(format!("Injected failure in {:?}", op)));
        }
        Ok(())
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, PortError>
    where
        F: Future<Output = Result<T, PortError>>,
    {
        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        let delayed = async {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            call.await
        };
        tokio::time::timeout(self.op_timeout, delayed)
            .await
            .map_err(|_| PortError::timeout(operation, self.op_timeout))?
    }
}

fn gateway_id(order: &Order) -> Option<&str> {
    order.gateway.as_ref().map(|g| g.external_payment_id.as_str())
}

impl DomainPort for InMemoryStore {}

#[async_trait]
impl HealthCheckable for InMemoryStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let (status, message) = match tokio::time::timeout(self.op_timeout, self.state.read()).await {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(_) => (AdapterHealth::Degraded, Some("State lock contended".to_string())),
        };
        HealthCheckResult {
            adapter_id: "in-memory-store".to_string(),
            status,
            latency_ms: start.elapsed().as_millis() as u64,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl OrderPort for InMemoryStore {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn insert_order(&self, order: &Order) -> Result<Order, PortError> {
        self.bounded("insert_order", async {
            let mut state = self.state.write().await;
            if state.orders.contains_key(&order.id) {
                return Err(PortError::conflict(format!("Order {} already exists", order.id)));
            }
            if let Some(ext) = gateway_id(order) {
                if state.orders.values().any(|o| gateway_id(o) == Some(ext)) {
                    return Err(PortError::conflict(format!("Gateway payment {} already attached", ext)));
                }
            }
            self.injected(WriteOp::InsertOrder)?;
            state.orders.insert(order.id, order.clone());
            Ok(order.clone())
        })
        .await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
        self.bounded("get_order", async {
            self.state
                .read()
                .await
                .orders
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Order", id))
        })
        .await
    }

    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn save_order(&self, order: &Order, expected_version: i64) -> Result<Order, PortError> {
        self.bounded("save_order", async {
            let mut state = self.state.write().await;
            let stored = state
                .orders
                .get(&order.id)
                .ok_or_else(|| PortError::not_found("Order", order.id))?;
            if stored.version != expected_version {
                return Err(PortError::conflict(format!(
                    "Order {} is at version {}, expected {}",
                    order.id, stored.version, expected_version
                )));
            }
            if let Some(ext) = gateway_id(order) {
                if state
                    .orders
                    .values()
                    .any(|o| o.id != order.id && gateway_id(o) == Some(ext))
                {
                    return Err(PortError::conflict(format!("Gateway payment {} already attached", ext)));
                }
            }

            let mut staged = order.clone();
            staged.version = expected_version + 1;
            self.injected(WriteOp::SaveOrder)?;
            state.orders.insert(staged.id, staged.clone());
            debug!(version = staged.version, "Order saved");
            Ok(staged)
        })
        .await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn delete_order(&self, id: OrderId, expected_version: i64) -> Result<(), PortError> {
        self.bounded("delete_order", async {
            let mut state = self.state.write().await;
            let stored = state.orders.get(&id).ok_or_else(|| PortError::not_found("Order", id))?;
            if stored.version != expected_version {
                return Err(PortError::conflict(format!(
                    "Order {} is at version {}, expected {}",
                    id, stored.version, expected_version
                )));
            }
            self.injected(WriteOp::DeleteOrder)?;
            state.orders.remove(&id);
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn find_by_gateway_payment_id(&self, external_payment_id: &str) -> Result<Order, PortError> {
        self.bounded("find_by_gateway_payment_id", async {
            self.state
                .read()
                .await
                .orders
                .values()
                .find(|o| gateway_id(o) == Some(external_payment_id))
                .cloned()
                .ok_or_else(|| PortError::not_found("Gateway payment", external_payment_id))
        })
        .await
    }

    #[instrument(skip(self), fields(seller_id = %seller_id))]
    async fn list_orders_by_seller(&self, seller_id: SellerId) -> Result<Vec<Order>, PortError> {
        self.bounded("list_orders_by_seller", async {
            let mut orders: Vec<_> = self
                .state
                .read()
                .await
                .orders
                .values()
                .filter(|o| o.seller_id == Some(seller_id))
                .cloned()
                .collect();
            orders.sort_by_key(|o| o.created_at);
            Ok(orders)
        })
        .await
    }
}

#[async_trait]
impl CatalogPort for InMemoryStore {
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, PortError> {
        self.bounded("get_products", async {
            let state = self.state.read().await;
            Ok(ids.iter().filter_map(|id| state.products.get(id).cloned()).collect())
        })
        .await
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn upsert_product(&self, product: &Product) -> Result<(), PortError> {
        self.bounded("upsert_product", async {
            self.state.write().await.products.insert(product.id, product.clone());
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl CommissionPort for InMemoryStore {
    #[instrument(skip(self, payment), fields(payment_id = %payment.id, orders = payment.order_ids.len()))]
    async fn settle(&self, payment: &CommissionPayment) -> Result<CommissionPayment, PortError> {
        self.bounded("settle_commissions", async {
            let mut state = self.state.write().await;

            let mut staged = Vec::with_capacity(payment.order_ids.len());
            for id in &payment.order_ids {
                let mut order = state
                    .orders
                    .get(id)
                    .cloned()
                    .ok_or_else(|| PortError::not_found("Order", id))?;
                payment
                    .check_order(&order)
                    .map_err(|e| PortError::conflict(e.to_string()))?;
                payment.apply_to(&mut order);
                order.version += 1;
                staged.push(order);
            }
            self.injected(WriteOp::Settle)?;

            for order in staged {
                state.orders.insert(order.id, order);
            }
            state.payments.insert(payment.id, payment.clone());
            Ok(payment.clone())
        })
        .await
    }

    #[instrument(skip(self), fields(payment_id = %id))]
    async fn get_payment(&self, id: CommissionPaymentId) -> Result<CommissionPayment, PortError> {
        self.bounded("get_commission_payment", async {
            self.state
                .read()
                .await
                .payments
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("CommissionPayment", id))
        })
        .await
    }

    #[instrument(skip(self), fields(payment_id = %id))]
    async fn reverse(&self, id: CommissionPaymentId) -> Result<CommissionPayment, PortError> {
        self.bounded("reverse_commissions", async {
            let mut state = self.state.write().await;
            let payment = state
                .payments
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("CommissionPayment", id))?;

            let staged: Vec<Order> = payment
                .order_ids
                .iter()
                .filter_map(|order_id| state.orders.get(order_id).cloned())
                .map(|mut order| {
                    CommissionPayment::release(&mut order);
                    order.version += 1;
                    order
                })
                .collect();
            self.injected(WriteOp::Reverse)?;

            for order in staged {
                state.orders.insert(order.id, order);
            }
            state.payments.remove(&id);
            Ok(payment)
        })
        .await
    }

    #[instrument(skip(self), fields(seller_id = %seller_id))]
    async fn list_payments(&self, seller_id: SellerId) -> Result<Vec<CommissionPayment>, PortError> {
        self.bounded("list_commission_payments", async {
            let mut payments: Vec<_> = self
                .state
                .read()
                .await
                .payments
                .values()
                .filter(|p| p.seller_id == seller_id)
                .cloned()
                .collect();
            payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
            Ok(payments)
        })
        .await
    }
}
