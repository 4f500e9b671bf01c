//! Property-Based Test Generators
//!
//! Proptest strategies that produce inputs satisfying the domain's
//! preconditions.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use domain_sales::{Installment, InstallmentStatus};

/// Strategy for amounts in whole cents, R$ 0,01 to R$ 100.000,00
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for installment counts within the store cap
pub fn installment_count_strategy() -> impl Strategy<Value = u32> {
    1u32..=24u32
}

/// Strategy for first due dates, day of month included up to 31
pub fn due_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030i32, 1u32..=12u32, 1u32..=31u32).prop_map(|(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
            .or_else(|| NaiveDate::from_ymd_opt(y, m, 28))
            .unwrap_or(NaiveDate::MIN)
    })
}

/// Strategy for commission percentages, 0% to 20% with two decimals
pub fn percentage_strategy() -> impl Strategy<Value = Decimal> {
    (0u32..=2000u32).prop_map(|n| Decimal::new(n as i64, 2))
}

/// Strategy for a financed total together with a count that can split it
///
/// The total always has at least one cent per installment.
pub fn financed_split_strategy() -> impl Strategy<Value = (Decimal, u32)> {
    installment_count_strategy().prop_flat_map(|count| {
        ((count as i64)..10_000_000i64).prop_map(move |cents| (Decimal::new(cents, 2), count))
    })
}

/// Strategy for the paid fraction of a single installment, in percent
pub fn paid_fraction_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![Just(0u32), 1u32..100u32, Just(100u32)]
}

/// Applies `paid_percent` of `installment.amount` as its paid amount
pub fn with_paid_fraction(mut installment: Installment, paid_percent: u32) -> Installment {
    let paid = (installment.amount * Decimal::from(paid_percent) / Decimal::from(100)).round_dp(2);
    installment.paid_amount = paid;
    installment.status = InstallmentStatus::derive(paid, installment.amount);
    installment
}
