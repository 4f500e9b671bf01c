//! Order handlers
//!
//! Every admin action on an order maps to one endpoint. Mutations require
//! the acting staff member in the `x-staff-id` header.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::{OrderId, PaymentId};
use domain_sales::{Order, PaymentReceipt};

use crate::dto::orders::*;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::CurrentActor;
use crate::AppState;

fn order_id(raw: &str) -> Result<OrderId, ApiError> {
    parse_id("order", raw)
}

/// Creates an order, with its installment schedule for crediário sales
pub async fn create_order(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    request.validate()?;
    let order = state.orders.create_order(&ctx, request.into()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.get_order(order_id(&id)?).await?))
}

/// Permanently deletes a trashed order
pub async fn hard_delete(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.orders.hard_delete(&ctx, order_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------------------------------------------------------------
// Installment payments
// ----------------------------------------------------------------------

pub async fn record_payment(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path((id, number)): Path<(String, u32)>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<PaymentReceipt>, ApiError> {
    request.validate()?;
    let receipt = state
        .orders
        .record_payment(&ctx, order_id(&id)?, number, request.into())
        .await?;
    Ok(Json(receipt))
}

pub async fn reverse_payment(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path((id, number, payment_id)): Path<(String, u32, String)>,
) -> Result<Json<Order>, ApiError> {
    let payment_id: PaymentId = parse_id("payment", &payment_id)?;
    let order = state
        .orders
        .reverse_payment(&ctx, order_id(&id)?, number, payment_id)
        .await?;
    Ok(Json(order))
}

// ----------------------------------------------------------------------
// Financial edits
// ----------------------------------------------------------------------

pub async fn change_discount(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<Order>, ApiError> {
    request.validate()?;
    Ok(Json(state.orders.change_discount(&ctx, order_id(&id)?, request.amount).await?))
}

pub async fn register_down_payment(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<Order>, ApiError> {
    request.validate()?;
    Ok(Json(
        state
            .orders
            .register_down_payment(&ctx, order_id(&id)?, request.amount)
            .await?,
    ))
}

pub async fn reset_down_payment(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.reset_down_payment(&ctx, order_id(&id)?).await?))
}

pub async fn change_installment_count(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<InstallmentCountRequest>,
) -> Result<Json<Order>, ApiError> {
    request.validate()?;
    Ok(Json(
        state
            .orders
            .change_installment_count(&ctx, order_id(&id)?, request.count)
            .await?,
    ))
}

pub async fn regenerate_schedule(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.regenerate_schedule(&ctx, order_id(&id)?).await?))
}

pub async fn set_installment_amount(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path((id, number)): Path<(String, u32)>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<Order>, ApiError> {
    request.validate()?;
    Ok(Json(
        state
            .orders
            .set_installment_amount(&ctx, order_id(&id)?, number, request.amount)
            .await?,
    ))
}

pub async fn set_installment_due_date(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path((id, number)): Path<(String, u32)>,
    Json(request): Json<DueDateRequest>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(
        state
            .orders
            .set_installment_due_date(&ctx, order_id(&id)?, number, request.due_date)
            .await?,
    ))
}

pub async fn update_payment_method(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<PaymentMethodRequest>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(
        state
            .orders
            .update_payment_method(&ctx, order_id(&id)?, request.payment_method)
            .await?,
    ))
}

// ----------------------------------------------------------------------
// Lifecycle
// ----------------------------------------------------------------------

pub async fn update_status(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.update_status(&ctx, order_id(&id)?, request.status).await?))
}

pub async fn trash(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.trash(&ctx, order_id(&id)?).await?))
}

pub async fn restore(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.restore(&ctx, order_id(&id)?).await?))
}

// ----------------------------------------------------------------------
// Commission on a single order
// ----------------------------------------------------------------------

pub async fn recalculate_commission(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.recalculate_commission(&ctx, order_id(&id)?).await?))
}

pub async fn set_manual_commission(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<Order>, ApiError> {
    request.validate()?;
    Ok(Json(
        state
            .orders
            .set_manual_commission(&ctx, order_id(&id)?, request.amount)
            .await?,
    ))
}

pub async fn clear_manual_commission(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.clear_manual_commission(&ctx, order_id(&id)?).await?))
}
