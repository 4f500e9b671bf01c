//! Commission Domain Ports
//!
//! Settlement touches two kinds of record (the batch and every referenced
//! order), so the port exposes it as one atomic operation instead of
//! letting the service write them separately.

use async_trait::async_trait;

use core_kernel::{CommissionPaymentId, DomainPort, PortError, SellerId};

use crate::payment::CommissionPayment;

/// Storage for commission settlement batches
#[async_trait]
pub trait CommissionPort: DomainPort {
    /// Stores `payment` and flags every referenced order as paid
    ///
    /// Both effects happen or neither does. Each order is checked with
    /// [`CommissionPayment::check_order`] inside the same unit of work, and
    /// its version is bumped.
    ///
    /// # Returns
    ///
    /// The stored batch; `PortError::NotFound` for an unknown order,
    /// `PortError::Conflict` if an order cannot be settled
    async fn settle(&self, payment: &CommissionPayment) -> Result<CommissionPayment, PortError>;

    /// Retrieves a batch by ID, or `PortError::NotFound`
    async fn get_payment(&self, id: CommissionPaymentId) -> Result<CommissionPayment, PortError>;

    /// Clears the paid flags on every referenced order and deletes the batch
    ///
    /// Both effects happen or neither does. Orders that no longer exist are
    /// skipped.
    async fn reverse(&self, id: CommissionPaymentId) -> Result<CommissionPayment, PortError>;

    /// A seller's batches, most recent first
    async fn list_payments(&self, seller_id: SellerId) -> Result<Vec<CommissionPayment>, PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use domain_sales::ports::mock::SharedOrders;

    /// In-memory mock implementation of CommissionPort
    ///
    /// Works on the same order map as a `MockOrderPort`.
    #[derive(Debug)]
    pub struct MockCommissionPort {
        orders: SharedOrders,
        payments: RwLock<HashMap<CommissionPaymentId, CommissionPayment>>,
        fail_next_write: AtomicBool,
    }

    impl MockCommissionPort {
        pub fn new(orders: SharedOrders) -> Self {
            Self {
                orders,
                payments: RwLock::new(HashMap::new()),
                fail_next_write: AtomicBool::new(false),
            }
        }

        /// Makes the next settle or reverse fail after staging its changes
        pub fn fail_next_write(&self) {
            self.fail_next_write.store(true, Ordering::SeqCst);
        }

        pub async fn payment_count(&self) -> usize {
            self.payments.read().await.len()
        }

        fn injected_failure(&self) -> Result<(), PortError> {
            if self.fail_next_write.swap(false, Ordering::SeqCst) {
                return Err(PortError::internal("Injected write failure"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockCommissionPort {}

    #[async_trait]
    impl CommissionPort for MockCommissionPort {
        async fn settle(&self, payment: &CommissionPayment) -> Result<CommissionPayment, PortError> {
            let mut orders = self.orders.write().await;
            let mut payments = self.payments.write().await;

            let mut staged = Vec::with_capacity(payment.order_ids.len());
            for id in &payment.order_ids {
                let mut order = orders
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
            self.injected_failure()?;

            for order in staged {
                orders.insert(order.id, order);
            }
            payments.insert(payment.id, payment.clone());
            Ok(payment.clone())
        }

        async fn get_payment(&self, id: CommissionPaymentId) -> Result<CommissionPayment, PortError> {
            self.payments
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("CommissionPayment", id))
        }

        async fn reverse(&self, id: CommissionPaymentId) -> Result<CommissionPayment, PortError> {
            let mut orders = self.orders.write().await;
            let mut payments = self.payments.write().await;

            let payment = payments
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("CommissionPayment", id))?;

            let staged: Vec<_> = payment
                .order_ids
                .iter()
                .filter_map(|order_id| orders.get(order_id).cloned())
                .map(|mut order| {
                    CommissionPayment::release(&mut order);
                    order.version += 1;
                    order
                })
                .collect();
            self.injected_failure()?;

            for order in staged {
                orders.insert(order.id, order);
            }
            payments.remove(&id);
            Ok(payment)
        }

        async fn list_payments(&self, seller_id: SellerId) -> Result<Vec<CommissionPayment>, PortError> {
            let mut payments: Vec<_> = self
                .payments
                .read()
                .await
                .values()
                .filter(|p| p.seller_id == seller_id)
                .cloned()
                .collect();
            payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
            Ok(payments)
        }
    }
}
