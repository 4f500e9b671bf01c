//! Commission settlement handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::{CommissionPaymentId, SellerId};
use domain_commission::{CommissionPayment, CommissionStatement};

use crate::dto::commissions::PayCommissionsRequest;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::CurrentActor;
use crate::AppState;

/// Delivered, unpaid commissions owed to a seller
pub async fn unpaid_commissions(
    State(state): State<AppState>,
    Path(seller_id): Path<String>,
) -> Result<Json<CommissionStatement>, ApiError> {
    let seller_id: SellerId = parse_id("seller", &seller_id)?;
    Ok(Json(state.commissions.unpaid_commissions(seller_id).await?))
}

/// A seller's settlement batches, most recent first
pub async fn list_payments(
    State(state): State<AppState>,
    Path(seller_id): Path<String>,
) -> Result<Json<Vec<CommissionPayment>>, ApiError> {
    let seller_id: SellerId = parse_id("seller", &seller_id)?;
    Ok(Json(state.commissions.list_payments(seller_id).await?))
}

pub async fn pay_commissions(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Json(request): Json<PayCommissionsRequest>,
) -> Result<(StatusCode, Json<CommissionPayment>), ApiError> {
    request.validate()?;
    let payment = state.commissions.pay_commissions(&ctx, request.into()).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommissionPayment>, ApiError> {
    let id: CommissionPaymentId = parse_id("commission payment", &id)?;
    Ok(Json(state.commissions.get_payment(id).await?))
}

/// Deletes a batch and marks its orders unpaid again
pub async fn reverse_payment(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<CommissionPayment>, ApiError> {
    let id: CommissionPaymentId = parse_id("commission payment", &id)?;
    Ok(Json(state.commissions.reverse_commission_payment(&ctx, id).await?))
}
