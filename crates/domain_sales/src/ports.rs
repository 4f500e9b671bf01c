//! Sales Domain Ports
//!
//! Port interfaces the sales domain needs from its storage. Adapters live in
//! `infra_db` (PostgreSQL and in-memory); a lightweight mock is available
//! under the `mock` feature for unit tests.
//!
//! # Concurrency
//!
//! Orders carry a `version`. [`OrderPort::save_order`] must only succeed when
//! the stored version still equals `expected_version`, and must bump it. A
//! mismatch is reported as [`PortError::Conflict`].
//!
//! ```rust,ignore
//! let mut order = orders.get_order(id).await?;
//! let expected = order.version;
//! order.change_discount(dec!(10))?;
//! let saved = orders.save_order(&order, expected).await?;
//! assert_eq!(saved.version, expected + 1);
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, OrderId, PortError, ProductId, SellerId};

use crate::order::Order;
use crate::product::Product;

/// Storage for order aggregates, installments included
#[async_trait]
pub trait OrderPort: DomainPort {
    /// Stores a new order
    ///
    /// # Returns
    ///
    /// The stored order, or `PortError::Conflict` if the id already exists
    async fn insert_order(&self, order: &Order) -> Result<Order, PortError>;

    /// Retrieves an order by ID, or `PortError::NotFound`
    async fn get_order(&self, id: OrderId) -> Result<Order, PortError>;

    /// Replaces an order if its stored version equals `expected_version`
    ///
    /// # Returns
    ///
    /// The stored order with its new version, or `PortError::Conflict` if it
    /// changed since it was read
    async fn save_order(&self, order: &Order, expected_version: i64) -> Result<Order, PortError>;

    /// Permanently removes an order, provided it is still at `expected_version`
    ///
    /// Fails with `PortError::Conflict` if the order changed since it was read.
    async fn delete_order(&self, id: OrderId, expected_version: i64) -> Result<(), PortError>;

    /// Looks an order up by the payment id the gateway knows it under
    async fn find_by_gateway_payment_id(&self, external_payment_id: &str) -> Result<Order, PortError>;

    /// All orders sold by a seller, trashed ones included
    async fn list_orders_by_seller(&self, seller_id: SellerId) -> Result<Vec<Order>, PortError>;
}

/// Read access to the product catalog
#[async_trait]
pub trait CatalogPort: DomainPort {
    /// Returns the products found among `ids`; unknown ids are skipped
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, PortError>;

    /// Inserts or replaces a product
    async fn upsert_product(&self, product: &Product) -> Result<(), PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Shared order map, so other mocks can act on the same orders
    pub type SharedOrders = Arc<RwLock<HashMap<OrderId, Order>>>;

    /// In-memory mock implementation of OrderPort
    #[derive(Debug, Default, Clone)]
    pub struct MockOrderPort {
        orders: SharedOrders,
    }

    impl MockOrderPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Handle to the underlying map
        pub fn shared(&self) -> SharedOrders {
            Arc::clone(&self.orders)
        }
    }

    impl DomainPort for MockOrderPort {}

    #[async_trait]
    impl OrderPort for MockOrderPort {
        async fn insert_order(&self, order: &Order) -> Result<Order, PortError> {
            let mut orders = self.orders.write().await;
            if orders.contains_key(&order.id) {
                return Err(PortError::conflict(format!("Order {} already exists", order.id)));
            }
            orders.insert(order.id, order.clone());
            Ok(order.clone())
        }

        async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
            self.orders
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Order", id))
        }

        async fn save_order(&self, order: &Order, expected_version: i64) -> Result<Order, PortError> {
            let mut orders = self.orders.write().await;
            let stored = orders
                .get_mut(&order.id)
                .ok_or_else(|| PortError::not_found("Order", order.id))?;
            if stored.version != expected_version {
                return Err(PortError::conflict(format!(
                    "Order {} is at version {}, expected {}",
                    order.id, stored.version, expected_version
                )));
            }
            let mut updated = order.clone();
            updated.version = expected_version + 1;
            *stored = updated.clone();
            Ok(updated)
        }

        async fn delete_order(&self, id: OrderId, expected_version: i64) -> Result<(), PortError> {
            let mut orders = self.orders.write().await;
            let stored = orders.get(&id).ok_or_else(|| PortError::not_found("Order", id))?;
            if stored.version != expected_version {
                return Err(PortError::conflict(format!(
                    "Order {} is at version {}, expected {}",
                    id, stored.version, expected_version
                )));
            }
            orders.remove(&id);
            Ok(())
        }

        async fn find_by_gateway_payment_id(&self, external_payment_id: &str) -> Result<Order, PortError> {
            self.orders
                .read()
                .await
                .values()
                .find(|o| {
                    o.gateway
                        .as_ref()
                        .is_some_and(|g| g.external_payment_id == external_payment_id)
                })
                .cloned()
                .ok_or_else(|| PortError::not_found("Gateway payment", external_payment_id))
        }

        async fn list_orders_by_seller(&self, seller_id: SellerId) -> Result<Vec<Order>, PortError> {
            let mut orders: Vec<Order> = self
                .orders
                .read()
                .await
                .values()
                .filter(|o| o.seller_id == Some(seller_id))
                .cloned()
                .collect();
            orders.sort_by_key(|o| o.created_at);
            Ok(orders)
        }
    }

    /// In-memory mock implementation of CatalogPort
    #[derive(Debug, Default, Clone)]
    pub struct MockCatalogPort {
        products: Arc<RwLock<HashMap<ProductId, Product>>>,
    }

    impl MockCatalogPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with products for testing
        pub async fn with_products(products: Vec<Product>) -> Self {
            let port = Self::new();
            {
                let mut map = port.products.write().await;
                for product in products {
                    map.insert(product.id, product);
                }
            }
            port
        }
    }

    impl DomainPort for MockCatalogPort {}

    #[async_trait]
    impl CatalogPort for MockCatalogPort {
        async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, PortError> {
            let products = self.products.read().await;
            Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
        }

        async fn upsert_product(&self, product: &Product) -> Result<(), PortError> {
            self.products.write().await.insert(product.id, product.clone());
            Ok(())
        }
    }
}
