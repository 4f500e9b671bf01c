//! Unpaid commission statements
//!
//! Groups a seller's delivered, unpaid orders into a payable summary that
//! can be turned directly into a settlement request.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{OrderId, SellerId};
use domain_sales::{Order, OrderStatus};

use crate::payment::PayCommissions;

/// One order's contribution to a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionLine {
    pub order_id: OrderId,
    pub order_total: Decimal,
    pub commission: Decimal,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Commissions a seller is owed and has not been paid yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionStatement {
    pub seller_id: SellerId,
    pub seller_name: Option<String>,
    pub lines: Vec<CommissionLine>,
    pub total: Decimal,
}

impl CommissionStatement {
    /// Builds the statement from any set of the seller's orders
    ///
    /// Keeps orders that are delivered, not trashed, not yet paid, and carry
    /// a positive commission.
    pub fn from_orders<'a>(seller_id: SellerId, orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut seller_name = None;
        let mut lines: Vec<CommissionLine> = orders
            .into_iter()
            .filter(|o| o.seller_id == Some(seller_id))
            .filter(|o| is_payable(o))
            .map(|o| {
                if seller_name.is_none() {
                    seller_name = o.seller_name.clone();
                }
                CommissionLine {
                    order_id: o.id,
                    order_total: o.total,
                    commission: o.commission,
                    delivered_at: o.delivered_at,
                }
            })
            .collect();
        lines.sort_by_key(|l| (l.delivered_at, l.order_id));

        let total = lines.iter().map(|l| l.commission).sum();
        Self {
            seller_id,
            seller_name,
            lines,
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn order_ids(&self) -> Vec<OrderId> {
        self.lines.iter().map(|l| l.order_id).collect()
    }

    /// Settlement request covering every line of the statement
    pub fn to_request(&self, period: impl Into<String>) -> PayCommissions {
        PayCommissions {
            seller_id: self.seller_id,
            seller_name: self.seller_name.clone().unwrap_or_default(),
            amount: self.total,
            order_ids: self.order_ids(),
            period: period.into(),
        }
    }
}

fn is_payable(order: &Order) -> bool {
    order.status == OrderStatus::Delivered
        && !order.commission_paid
        && order.commission > Decimal::ZERO
}
