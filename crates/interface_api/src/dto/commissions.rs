//! Commission DTOs

use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use core_kernel::{OrderId, SellerId};
use domain_commission::PayCommissions;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PayCommissionsRequest {
    pub seller_id: SellerId,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub seller_name: String,
    pub amount: Decimal,
    pub order_ids: Vec<OrderId>,
    #[validate(length(min = 1, max = 64, message = "must be 1 to 64 characters"))]
    pub period: String,
}

impl From<PayCommissionsRequest> for PayCommissions {
    fn from(request: PayCommissionsRequest) -> Self {
        PayCommissions {
            seller_id: request.seller_id,
            seller_name: request.seller_name,
            amount: request.amount,
            order_ids: request.order_ids,
            period: request.period,
        }
    }
}
