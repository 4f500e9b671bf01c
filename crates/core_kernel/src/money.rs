//! Cent arithmetic on rust_decimal amounts
//!
//! Amounts stay `Decimal` in major units everywhere in the domain; this module
//! converts them to integer cents and holds the cent-exact splitter used to turn
//! a financed total into installments.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Overflow during calculation")]
    Overflow,
}

/// Rounds a major-unit amount to whole cents, half away from zero.
///
/// Fails with `Overflow` when the amount does not fit in `i64` cents.
pub fn to_cents(amount: Decimal) -> Result<i64, MoneyError> {
    let cents = amount
        .checked_mul(dec!(100))
        .ok_or(MoneyError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    cents.to_i64().ok_or(MoneyError::Overflow)
}

/// Converts integer cents back to a major-unit decimal with two places.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Splits `total` into `count` integer-cent parts that sum exactly to the
/// rounded total. The first `total_cents % count` parts carry one extra cent.
///
/// # Errors
///
/// - `InvalidAmount` when `count` is zero or `total` is not positive
/// - `Overflow` when `total` is too large to express in cents
///
/// # Example
///
/// ```rust
/// use core_kernel::money::split_cents;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(split_cents(dec!(100.00), 3).unwrap(), vec![3334, 3333, 3333]);
/// ```
pub fn split_cents(total: Decimal, count: u32) -> Result<Vec<i64>, MoneyError> {
    if count == 0 {
        return Err(MoneyError::InvalidAmount("Cannot split into zero installments".to_string()));
    }
    let total_cents = to_cents(total)?;
    if total_cents <= 0 {
        return Err(MoneyError::InvalidAmount(format!(
            "Amount to split must be positive, got {}",
            total
        )));
    }

    let count = i64::from(count);
    let base = total_cents / count;
    let remainder = total_cents % count;

    Ok((0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect())
}

/// Represents a percentage rate (e.g., a commission rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// The rate as a decimal (e.g., 0.05 for 5%)
    value: Decimal,
}

impl Rate {
    /// Creates a rate from a percentage (e.g., 5.0 for 5%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self {
            value: percentage / dec!(100),
        }
    }

    /// Applies this rate to a plain decimal amount
    pub fn apply(&self, amount: Decimal) -> Result<Decimal, MoneyError> {
        amount.checked_mul(self.value).ok_or(MoneyError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_front_loads_remainder() {
        assert_eq!(split_cents(dec!(100.00), 3).unwrap(), vec![3334, 3333, 3333]);
        assert_eq!(split_cents(dec!(0.05), 3).unwrap(), vec![2, 2, 1]);
    }

    #[test]
    fn test_split_rejects_zero_count() {
        assert!(matches!(split_cents(dec!(10), 0), Err(MoneyError::InvalidAmount(_))));
    }

    #[test]
    fn test_split_rejects_non_positive_total() {
        assert!(split_cents(Decimal::ZERO, 2).is_err());
        assert!(split_cents(dec!(-5), 2).is_err());
        // rounds to zero cents
        assert!(split_cents(dec!(0.004), 1).is_err());
    }

    #[test]
    fn test_to_cents_rounds_half_away_from_zero() {
        assert_eq!(to_cents(dec!(10.005)).unwrap(), 1001);
        assert_eq!(to_cents(dec!(10.004)).unwrap(), 1000);
    }

    #[test]
    fn test_huge_amounts_overflow_instead_of_panicking() {
        assert_eq!(to_cents(Decimal::MAX), Err(MoneyError::Overflow));
        assert_eq!(to_cents(Decimal::MIN), Err(MoneyError::Overflow));
        assert_eq!(split_cents(Decimal::MAX, 1), Err(MoneyError::Overflow));
        // fits in Decimal after scaling but not in i64
        assert_eq!(to_cents(Decimal::from(i64::MAX)), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_rate_application() {
        let rate = Rate::from_percentage(dec!(5));
        assert_eq!(rate.apply(dec!(200.00)), Ok(dec!(10.00)));
        assert_eq!(Rate::from_percentage(dec!(500)).apply(Decimal::MAX), Err(MoneyError::Overflow));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn split_sum_equals_original(
            cents in 1i64..1_000_000_000i64,
            parts in 1u32..120u32
        ) {
            let split = split_cents(from_cents(cents), parts).unwrap();

            prop_assert_eq!(split.len(), parts as usize);
            prop_assert_eq!(split.iter().sum::<i64>(), cents);
        }

        #[test]
        fn split_parts_differ_by_at_most_one_cent(
            cents in 1i64..10_000_000i64,
            parts in 1u32..60u32
        ) {
            let split = split_cents(from_cents(cents), parts).unwrap();
            let max = *split.iter().max().unwrap();
            let min = *split.iter().min().unwrap();

            prop_assert!(max - min <= 1);
            prop_assert!(split.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
