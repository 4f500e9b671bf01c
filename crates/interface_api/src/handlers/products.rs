//! Product catalog handlers
//!
//! Only the fields that drive financing and commission are kept here.

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use domain_sales::Product;

use crate::error::ApiError;
use crate::middleware::CurrentActor;
use crate::AppState;

pub async fn upsert_product(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Json(product): Json<Product>,
) -> Result<StatusCode, ApiError> {
    if product.price < rust_decimal::Decimal::ZERO {
        return Err(ApiError::Unprocessable(format!("Product {} has a negative price", product.id)));
    }
    if product.max_installments == Some(0) {
        return Err(ApiError::Unprocessable("maxInstallments must be at least 1".to_string()));
    }

    state
        .catalog
        .upsert_product(&product)
        .await
        .map_err(domain_sales::SalesError::from)?;
    info!(product_id = %product.id, actor = %ctx.actor.label(), "Product saved");
    Ok(StatusCode::NO_CONTENT)
}
