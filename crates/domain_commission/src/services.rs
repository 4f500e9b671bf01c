//! Commission settlement service

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use core_kernel::{CommissionPaymentId, RequestContext, SellerId};
use domain_sales::OrderPort;

use crate::error::CommissionError;
use crate::payment::{CommissionPayment, PayCommissions};
use crate::ports::CommissionPort;
use crate::statement::CommissionStatement;

/// Service for paying and reversing seller commissions
pub struct CommissionService {
    orders: Arc<dyn OrderPort>,
    commissions: Arc<dyn CommissionPort>,
}

impl CommissionService {
    pub fn new(orders: Arc<dyn OrderPort>, commissions: Arc<dyn CommissionPort>) -> Self {
        Self { orders, commissions }
    }

    /// Delivered, unpaid orders with a commission for `seller_id`
    pub async fn unpaid_commissions(&self, seller_id: SellerId) -> Result<CommissionStatement, CommissionError> {
        let orders = self.orders.list_orders_by_seller(seller_id).await?;
        Ok(CommissionStatement::from_orders(seller_id, &orders))
    }

    /// Creates a settlement batch and flags its orders as paid, atomically
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is not positive or no order is given
    /// - `NotFound` if a referenced order does not exist
    /// - `TransactionFailed` if an order is already paid, belongs to another
    ///   seller, or the store failed; nothing is applied in any of these cases
    pub async fn pay_commissions(
        &self,
        ctx: &RequestContext,
        request: PayCommissions,
    ) -> Result<CommissionPayment, CommissionError> {
        let seller_id = request.seller_id;
        let payment = CommissionPayment::from_request(request, Utc::now())
            .map_err(|e| {
                warn!(%seller_id, error = %e, "Commission payment rejected");
                e
            })?
            .paid_by(ctx.actor.label());

        let stored = self.commissions.settle(&payment).await.map_err(|e| {
            warn!(%seller_id, payment_id = %payment.id, error = %e, "Commission settlement failed");
            CommissionError::from(e)
        })?;

        info!(
            payment_id = %stored.id,
            %seller_id,
            amount = %stored.amount,
            orders = stored.order_ids.len(),
            actor = %ctx.actor.label(),
            "Commissions paid"
        );
        Ok(stored)
    }

    /// Deletes a batch and clears the paid flags on its orders, atomically
    pub async fn reverse_commission_payment(
        &self,
        ctx: &RequestContext,
        payment_id: CommissionPaymentId,
    ) -> Result<CommissionPayment, CommissionError> {
        let reversed = self.commissions.reverse(payment_id).await.map_err(|e| {
            warn!(%payment_id, error = %e, "Commission reversal failed");
            CommissionError::from(e)
        })?;

        info!(
            %payment_id,
            seller_id = %reversed.seller_id,
            orders = reversed.order_ids.len(),
            actor = %ctx.actor.label(),
            "Commission payment reversed"
        );
        Ok(reversed)
    }

    pub async fn get_payment(&self, payment_id: CommissionPaymentId) -> Result<CommissionPayment, CommissionError> {
        Ok(self.commissions.get_payment(payment_id).await?)
    }

    pub async fn list_payments(&self, seller_id: SellerId) -> Result<Vec<CommissionPayment>, CommissionError> {
        Ok(self.commissions.list_payments(seller_id).await?)
    }
}
