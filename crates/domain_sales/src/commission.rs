//! Seller commission calculation

use rust_decimal::Decimal;

use core_kernel::{Rate, DEFAULT_COMMISSION_PERCENTAGE};

use crate::error::SalesError;
use crate::order::{ensure_cent_range, Order, OrderItem};
use crate::product::{CommissionRule, CommissionType, ProductCatalog};

/// Calculates the commission owed to the order's seller
///
/// A manual override always wins and is returned unchanged. Orders without
/// a seller earn nothing. Otherwise each line item contributes according to
/// its product's rule; products without an explicit rule, or missing from
/// the catalog, fall back to the default percentage.
///
/// - `fixed`: `value * quantity`
/// - `percentage`: `price * quantity * value / 100`
///
/// # Errors
///
/// - `InvalidAmount` if a rule drives the commission out of cent range
pub fn calculate_commission(order: &Order, catalog: &ProductCatalog) -> Result<Decimal, SalesError> {
    if order.is_commission_manual {
        return Ok(order.commission);
    }
    if order.seller_id.is_none() {
        return Ok(Decimal::ZERO);
    }

    let total = order.items.iter().try_fold(Decimal::ZERO, |acc, item| {
        let rule = catalog
            .get(&item.product_id)
            .and_then(|product| product.commission)
            .unwrap_or_else(|| CommissionRule::percentage(DEFAULT_COMMISSION_PERCENTAGE));
        acc.checked_add(item_commission(item, &rule)?)
            .ok_or_else(|| SalesError::invalid_amount("Commission is out of range"))
    })?;
    ensure_cent_range(total)?;
    Ok(total)
}

fn item_commission(item: &OrderItem, rule: &CommissionRule) -> Result<Decimal, SalesError> {
    let quantity = Decimal::from(item.quantity);
    match rule.commission_type {
        CommissionType::Fixed => rule
            .commission_value
            .checked_mul(quantity)
            .ok_or_else(|| SalesError::invalid_amount("Commission is out of range")),
        CommissionType::Percentage => Ok(Rate::from_percentage(rule.commission_value).apply(item.line_total()?)?),
    }
}
