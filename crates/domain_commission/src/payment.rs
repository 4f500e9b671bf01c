//! Commission settlement batches
//!
//! A [`CommissionPayment`] references the orders it settles. Creating it and
//! flagging those orders as paid is one atomic unit; so is reversing it.
//! Storage adapters use [`CommissionPayment::check_order`],
//! [`CommissionPayment::apply_to`] and [`CommissionPayment::release`] inside
//! their transaction so every adapter enforces the same rules.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CommissionPaymentId, OrderId, SellerId};
use domain_sales::Order;

use crate::error::CommissionError;

/// Request to settle a seller's commissions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayCommissions {
    pub seller_id: SellerId,
    pub seller_name: String,
    pub amount: Decimal,
    pub order_ids: Vec<OrderId>,
    /// Free-form label, e.g. "2024-03" or "1ª quinzena de março"
    pub period: String,
}

/// One settlement batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionPayment {
    pub id: CommissionPaymentId,
    pub seller_id: SellerId,
    pub seller_name: String,
    /// Sum of settled commissions
    pub amount: Decimal,
    pub period: String,
    pub payment_date: DateTime<Utc>,
    pub order_ids: BTreeSet<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<String>,
}

impl CommissionPayment {
    /// Builds a batch from a settlement request
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is not positive or no order is given
    pub fn from_request(request: PayCommissions, payment_date: DateTime<Utc>) -> Result<Self, CommissionError> {
        if request.amount <= Decimal::ZERO {
            return Err(CommissionError::invalid_amount(format!(
                "Commission payment must be positive, got {}",
                request.amount
            )));
        }
        if request.order_ids.is_empty() {
            return Err(CommissionError::invalid_amount(
                "Commission payment must reference at least one order",
            ));
        }

        Ok(Self {
            id: CommissionPaymentId::new_v7(),
            seller_id: request.seller_id,
            seller_name: request.seller_name,
            amount: request.amount,
            period: request.period,
            payment_date,
            order_ids: request.order_ids.into_iter().collect(),
            paid_by: None,
        })
    }

    pub fn paid_by(mut self, staff: impl Into<String>) -> Self {
        self.paid_by = Some(staff.into());
        self
    }

    /// Checks that `order` may be settled by this batch
    pub fn check_order(&self, order: &Order) -> Result<(), CommissionError> {
        if order.seller_id != Some(self.seller_id) {
            return Err(CommissionError::rejected(format!(
                "Order {} does not belong to seller {}",
                order.id, self.seller_id
            )));
        }
        if order.commission_paid {
            return Err(CommissionError::rejected(format!(
                "Commission for order {} is already paid",
                order.id
            )));
        }
        if order.is_trashed() {
            return Err(CommissionError::rejected(format!("Order {} is in the trash", order.id)));
        }
        Ok(())
    }

    /// Flags `order` as settled by this batch
    pub fn apply_to(&self, order: &mut Order) {
        order.commission_paid = true;
        order.commission_date = Some(self.payment_date);
    }

    /// Clears the settlement flags on `order`
    pub fn release(order: &mut Order) {
        order.commission_paid = false;
        order.commission_date = None;
    }
}
