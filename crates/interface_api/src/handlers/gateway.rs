//! Payment gateway handlers
//!
//! The core stores what the gateway reports without interpreting it.

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use core_kernel::RequestContext;
use domain_sales::Order;

use crate::dto::gateway::{AttachGatewayRequest, GatewayEventRequest};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::CurrentActor;
use crate::AppState;

/// Links an order to the payment id the gateway issued for it
pub async fn attach_payment(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<AttachGatewayRequest>,
) -> Result<Json<Order>, ApiError> {
    request.validate()?;
    let order = state
        .orders
        .attach_gateway_payment(&ctx, parse_id("order", &id)?, request.external_payment_id)
        .await?;
    Ok(Json(order))
}

/// Webhook receiving gateway status changes
pub async fn status_event(
    State(state): State<AppState>,
    Json(event): Json<GatewayEventRequest>,
) -> Result<Json<Order>, ApiError> {
    event.validate()?;
    let order = state
        .orders
        .apply_gateway_status(
            &RequestContext::system(),
            &event.external_payment_id,
            event.status,
            event.metadata,
        )
        .await?;
    Ok(Json(order))
}
