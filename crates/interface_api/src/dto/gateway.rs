//! Payment gateway DTOs

use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachGatewayRequest {
    #[validate(length(min = 1, max = 128))]
    pub external_payment_id: String,
}

/// Status notification posted by the payment gateway
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEventRequest {
    #[validate(length(min = 1, max = 128))]
    pub external_payment_id: String,
    #[validate(length(min = 1, max = 64))]
    pub status: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}
