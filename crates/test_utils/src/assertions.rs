//! Custom Test Assertions
//!
//! Assertion helpers for schedules and payment ledgers that report the
//! offending installment instead of a bare `false`.

use rust_decimal::Decimal;

use domain_sales::{Installment, InstallmentStatus, Order};

/// Asserts that the schedule sums exactly to `financed`
///
/// # Panics
///
/// Panics with each installment amount if the sum differs
pub fn assert_schedule_sums_to(schedule: &[Installment], financed: Decimal) {
    let sum: Decimal = schedule.iter().map(|i| i.amount).sum();
    assert_eq!(
        sum,
        financed,
        "Schedule sums to {} instead of {}; amounts: {:?}",
        sum,
        financed,
        schedule.iter().map(|i| i.amount).collect::<Vec<_>>()
    );
}

/// Asserts that installment numbers run 1..=N without gaps
pub fn assert_contiguous_numbering(schedule: &[Installment]) {
    for (index, installment) in schedule.iter().enumerate() {
        assert_eq!(
            installment.installment_number as usize,
            index + 1,
            "Installment at position {} is numbered {}",
            index,
            installment.installment_number
        );
    }
}

/// Asserts that due dates never go backwards
pub fn assert_due_dates_non_decreasing(schedule: &[Installment]) {
    for pair in schedule.windows(2) {
        assert!(
            pair[0].due_date <= pair[1].due_date,
            "Installment {} is due {} after installment {} due {}",
            pair[0].installment_number,
            pair[0].due_date,
            pair[1].installment_number,
            pair[1].due_date
        );
    }
}

/// Asserts that each installment's paid amount and status match its ledger
pub fn assert_ledger_consistent(installment: &Installment) {
    let ledger: Decimal = installment.payments.iter().map(|p| p.amount).sum();
    assert_eq!(
        installment.paid_amount, ledger,
        "Installment {} has paidAmount {} but its payments sum to {}",
        installment.installment_number, installment.paid_amount, ledger
    );
    assert_eq!(
        installment.status,
        InstallmentStatus::derive(installment.paid_amount, installment.amount),
        "Installment {} status does not match its paid amount",
        installment.installment_number
    );
}

/// Asserts every schedule invariant on an order at once
pub fn assert_order_consistent(order: &Order) {
    assert_schedule_sums_to(&order.installment_details, order.financed_total());
    assert_contiguous_numbering(&order.installment_details);
    assert_due_dates_non_decreasing(&order.installment_details);
    for installment in &order.installment_details {
        assert_ledger_consistent(installment);
    }
    assert_eq!(
        order.installments as usize,
        order.installment_details.len(),
        "Order {} declares {} installments but has {}",
        order.id,
        order.installments,
        order.installment_details.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn schedule() -> Vec<Installment> {
        let due = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        vec![
            Installment::new(1, dec!(33.34), due),
            Installment::new(2, dec!(33.33), due),
            Installment::new(3, dec!(33.33), due),
        ]
    }

    #[test]
    fn test_matching_schedule_passes() {
        let schedule = schedule();
        assert_schedule_sums_to(&schedule, dec!(100.00));
        assert_contiguous_numbering(&schedule);
        assert_due_dates_non_decreasing(&schedule);
    }

    #[test]
    #[should_panic(expected = "Schedule sums to")]
    fn test_wrong_total_panics() {
        assert_schedule_sums_to(&schedule(), dec!(99.99));
    }
}
