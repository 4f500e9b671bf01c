//! Order DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use core_kernel::{CustomerId, PaymentId, ProductId, SellerId};
use domain_sales::{NewOrder, OrderItem, OrderStatus, PaymentInput, PaymentMethod};

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    pub price: Decimal,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Option<CustomerId>,
    pub seller_id: Option<SellerId>,
    pub seller_name: Option<String>,
    #[validate(length(min = 1, message = "order needs at least one item"), nested)]
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub down_payment: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub installments: u32,
    pub first_due_date: Option<NaiveDate>,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(request: CreateOrderRequest) -> Self {
        NewOrder {
            customer_id: request.customer_id,
            seller_id: request.seller_id,
            seller_name: request.seller_name,
            items: request
                .items
                .into_iter()
                .map(|i| OrderItem::new(i.product_id, i.name, i.price, i.quantity))
                .collect(),
            discount: request.discount,
            down_payment: request.down_payment,
            payment_method: request.payment_method,
            installments: request.installments,
            first_due_date: request.first_due_date,
        }
    }
}

fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(ValidationError::new("range").with_message("must be greater than 0".into()));
    }
    Ok(())
}

fn non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < Decimal::ZERO {
        return Err(ValidationError::new("range").with_message("must not be negative".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    /// Sending the same id twice records the payment once
    pub payment_id: Option<PaymentId>,
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    pub date: Option<DateTime<Utc>>,
    pub method: PaymentMethod,
}

impl From<RecordPaymentRequest> for PaymentInput {
    fn from(request: RecordPaymentRequest) -> Self {
        PaymentInput {
            id: request.payment_id,
            amount: request.amount,
            date: request.date,
            method: request.method,
        }
    }
}

/// Body for every action that takes a single amount
#[derive(Debug, Deserialize, Validate)]
pub struct AmountRequest {
    #[validate(custom(function = "non_negative_amount"))]
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InstallmentCountRequest {
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueDateRequest {
    pub due_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRequest {
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}
