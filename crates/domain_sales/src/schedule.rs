//! Installment schedule generation
//!
//! Builds the monthly dues of a crediário sale and regenerates the pending
//! part of an existing schedule without touching installments that already
//! carry payments.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{add_months, money::from_cents, split_cents};

use crate::error::SalesError;
use crate::installment::Installment;

/// Builds `count` monthly installments summing exactly to `financed_total`
///
/// Installment `k` (0-based) is due `k` calendar months after
/// `first_due_date`, clamped to month end.
///
/// # Errors
///
/// - `InvalidAmount` if `count` is zero or `financed_total` is not positive
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use domain_sales::schedule::build_schedule;
/// use rust_decimal_macros::dec;
///
/// let first = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
/// let schedule = build_schedule(dec!(300.00), 3, first).unwrap();
/// assert_eq!(schedule[1].due_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
/// ```
pub fn build_schedule(
    financed_total: Decimal,
    count: u32,
    first_due_date: NaiveDate,
) -> Result<Vec<Installment>, SalesError> {
    build_from(financed_total, count, first_due_date, 1)
}

/// Rebuilds the pending part of a schedule
///
/// Installments with at least one recorded payment are frozen: they keep
/// their amount, due date, and ledger, and are renumbered first in their
/// original order. The rest of `financed_total` is split over `pending_count`
/// new installments starting at `first_pending_due`.
///
/// # Errors
///
/// - `InvalidAmount` if the frozen installments already cover the financed
///   total, or `pending_count` is zero
pub fn regenerate_pending(
    existing: &[Installment],
    financed_total: Decimal,
    pending_count: u32,
    first_pending_due: NaiveDate,
) -> Result<Vec<Installment>, SalesError> {
    let mut frozen: Vec<Installment> = existing
        .iter()
        .filter(|i| i.has_payments())
        .cloned()
        .collect();
    frozen.sort_by_key(|i| i.installment_number);

    let frozen_total: Decimal = frozen.iter().map(|i| i.amount).sum();
    let remainder = financed_total - frozen_total;
    if remainder <= Decimal::ZERO {
        return Err(SalesError::invalid_amount(format!(
            "Nothing left to finance: paid installments already total {} of {}",
            frozen_total, financed_total
        )));
    }

    for (index, installment) in frozen.iter_mut().enumerate() {
        installment.installment_number = index as u32 + 1;
    }

    let next_number = frozen.len() as u32 + 1;
    let pending = build_from(remainder, pending_count, first_pending_due, next_number)?;
    frozen.extend(pending);
    Ok(frozen)
}

/// Due date the regenerated pending installments should start from
///
/// The earliest due date among installments without payments; failing that,
/// one month after the last frozen installment; failing that, one month
/// after `today`.
pub fn first_pending_due_date(existing: &[Installment], today: NaiveDate) -> Result<NaiveDate, SalesError> {
    if let Some(earliest) = existing
        .iter()
        .filter(|i| !i.has_payments())
        .map(|i| i.due_date)
        .min()
    {
        return Ok(earliest);
    }

    let anchor = existing.iter().map(|i| i.due_date).max().unwrap_or(today);
    Ok(add_months(anchor, 1)?)
}

/// Number of installments that carry payments
pub fn frozen_count(existing: &[Installment]) -> u32 {
    existing.iter().filter(|i| i.has_payments()).count() as u32
}

fn build_from(
    total: Decimal,
    count: u32,
    first_due_date: NaiveDate,
    first_number: u32,
) -> Result<Vec<Installment>, SalesError> {
    let amounts = split_cents(total, count)?;

    amounts
        .into_iter()
        .enumerate()
        .map(|(index, cents)| {
            let offset = index as u32;
            let due_date = add_months(first_due_date, offset)?;
            Ok(Installment::new(first_number + offset, from_cents(cents), due_date))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installment::{InstallmentPayment, InstallmentStatus};
    use crate::order::PaymentMethod;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_leap_year_month_end_schedule() {
        let schedule = build_schedule(dec!(300.00), 3, date(2024, 1, 31)).unwrap();

        let dues: Vec<NaiveDate> = schedule.iter().map(|i| i.due_date).collect();
        assert_eq!(dues, vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]);

        let amounts: Vec<Decimal> = schedule.iter().map(|i| i.amount).collect();
        assert_eq!(amounts, vec![dec!(100.00), dec!(100.00), dec!(100.00)]);

        assert!(schedule.iter().all(|i| i.status == InstallmentStatus::Pending));
        assert!(schedule.iter().all(|i| i.payments.is_empty()));
        assert_eq!(
            schedule.iter().map(|i| i.installment_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_remainder_front_loaded() {
        let schedule = build_schedule(dec!(100.00), 3, date(2024, 5, 10)).unwrap();
        let amounts: Vec<Decimal> = schedule.iter().map(|i| i.amount).collect();
        assert_eq!(amounts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    }

    #[test]
    fn test_zero_count_rejected() {
        assert!(matches!(
            build_schedule(dec!(100), 0, date(2024, 1, 1)),
            Err(SalesError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_regenerate_freezes_paid_installments() {
        let mut schedule = build_schedule(dec!(1000.00), 10, date(2024, 3, 15)).unwrap();
        schedule[0]
            .record_payment(InstallmentPayment::new(dec!(100), Utc::now(), PaymentMethod::Pix))
            .unwrap();

        let first_pending = first_pending_due_date(&schedule, date(2024, 3, 20)).unwrap();
        assert_eq!(first_pending, date(2024, 4, 15));

        let regenerated = regenerate_pending(&schedule, dec!(1000.00), 5, first_pending).unwrap();

        assert_eq!(regenerated.len(), 6);
        assert_eq!(regenerated[0], schedule[0]);
        assert!(regenerated[1..].iter().all(|i| i.amount == dec!(180.00)));
        assert_eq!(regenerated[5].due_date, date(2024, 8, 15));
        assert_eq!(regenerated.iter().map(|i| i.amount).sum::<Decimal>(), dec!(1000.00));
    }

    #[test]
    fn test_regenerate_renumbers_partial_installments_first() {
        let mut schedule = build_schedule(dec!(300.00), 3, date(2024, 1, 10)).unwrap();
        schedule[2]
            .record_payment(InstallmentPayment::new(dec!(20), Utc::now(), PaymentMethod::Cash))
            .unwrap();

        let regenerated = regenerate_pending(&schedule, dec!(300.00), 2, date(2024, 1, 10)).unwrap();

        assert_eq!(regenerated[0].installment_number, 1);
        assert_eq!(regenerated[0].paid_amount, dec!(20));
        assert_eq!(regenerated[0].due_date, date(2024, 3, 10));
        assert_eq!(regenerated[1].amount, dec!(100.00));
        assert_eq!(regenerated[2].installment_number, 3);
    }

    #[test]
    fn test_regenerate_fails_when_fully_covered() {
        let mut schedule = build_schedule(dec!(100.00), 1, date(2024, 1, 10)).unwrap();
        schedule[0]
            .record_payment(InstallmentPayment::new(dec!(100), Utc::now(), PaymentMethod::Cash))
            .unwrap();

        assert!(regenerate_pending(&schedule, dec!(100.00), 2, date(2024, 2, 10)).is_err());
    }

    #[test]
    fn test_first_pending_due_when_all_paid() {
        let mut schedule = build_schedule(dec!(100.00), 1, date(2024, 1, 31)).unwrap();
        schedule[0]
            .record_payment(InstallmentPayment::new(dec!(100), Utc::now(), PaymentMethod::Cash))
            .unwrap();

        assert_eq!(
            first_pending_due_date(&schedule, date(2024, 6, 1)).unwrap(),
            date(2024, 2, 29)
        );
        assert_eq!(first_pending_due_date(&[], date(2024, 6, 1)).unwrap(), date(2024, 7, 1));
    }
}
