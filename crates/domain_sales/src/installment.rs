//! Installment payment ledger
//!
//! Each installment keeps an append-only list of payment events. The paid
//! amount, status, and remaining balance are always derived from that list
//! and the installment's current amount.
//!
//! # Invariants
//!
//! - `paid_amount == sum(payments[].amount)`
//! - `status` is a pure function of `paid_amount` vs `amount`
//! - `payment_date` is stamped the first time the installment becomes paid
//!   and cleared only when a reversal leaves it unpaid

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::PaymentId;

use crate::error::SalesError;
use crate::order::{ensure_cent_range, PaymentMethod};

/// Derived installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentStatus {
    /// Nothing paid yet
    #[serde(rename = "Pendente")]
    Pending,
    /// Some, but not all, of the amount is paid
    #[serde(rename = "Parcial")]
    Partial,
    /// Paid amount reached the installment amount
    #[serde(rename = "Pago")]
    Paid,
}

impl InstallmentStatus {
    /// Status implied by a paid amount against an amount due
    pub fn derive(paid_amount: Decimal, amount: Decimal) -> Self {
        if paid_amount >= amount {
            InstallmentStatus::Paid
        } else if paid_amount > Decimal::ZERO {
            InstallmentStatus::Partial
        } else {
            InstallmentStatus::Pending
        }
    }
}

/// One recorded payment event against an installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPayment {
    /// Unique within the order; reused ids are treated as retries
    pub id: PaymentId,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub method: PaymentMethod,
    /// Staff member who recorded it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_by: Option<String>,
}

impl InstallmentPayment {
    pub fn new(amount: Decimal, date: DateTime<Utc>, method: PaymentMethod) -> Self {
        Self {
            id: PaymentId::new_v7(),
            amount,
            date,
            method,
            received_by: None,
        }
    }

    pub fn with_id(mut self, id: PaymentId) -> Self {
        self.id = id;
        self
    }

    pub fn received_by(mut self, staff: impl Into<String>) -> Self {
        self.received_by = Some(staff.into());
        self
    }
}

/// Result of appending a payment to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The payment was appended
    Applied,
    /// A payment with the same id already exists; nothing changed
    Duplicate,
}

/// One scheduled due within an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    /// 1-based, contiguous within the order
    pub installment_number: u32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub paid_amount: Decimal,
    #[serde(default)]
    pub payments: Vec<InstallmentPayment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
}

impl Installment {
    /// Creates an unpaid installment
    pub fn new(installment_number: u32, amount: Decimal, due_date: NaiveDate) -> Self {
        let mut installment = Self {
            installment_number,
            amount,
            due_date,
            status: InstallmentStatus::Pending,
            paid_amount: Decimal::ZERO,
            payments: Vec::new(),
            payment_date: None,
        };
        installment.refresh_status();
        installment
    }

    /// Appends a payment and recomputes the derived fields
    ///
    /// Overpayment is accepted: `paid_amount` may exceed `amount`.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the payment amount is not positive or the
    ///   ledger total would leave cent range
    pub fn record_payment(&mut self, payment: InstallmentPayment) -> Result<RecordOutcome, SalesError> {
        if payment.amount <= Decimal::ZERO {
            return Err(SalesError::invalid_amount(format!(
                "Payment amount must be positive, got {}",
                payment.amount
            )));
        }
        if self.has_payment(payment.id) {
            return Ok(RecordOutcome::Duplicate);
        }
        let paid_amount = self
            .paid_amount
            .checked_add(payment.amount)
            .ok_or_else(|| SalesError::invalid_amount("Paid amount is out of range"))?;
        ensure_cent_range(paid_amount)?;

        let was_paid = self.is_paid();
        let paid_at = payment.date;
        self.payments.push(payment);
        self.recompute_paid_amount();

        if !was_paid && self.is_paid() && self.payment_date.is_none() {
            self.payment_date = Some(paid_at);
        }

        Ok(RecordOutcome::Applied)
    }

    /// Removes a payment from the ledger and recomputes the derived fields
    ///
    /// # Errors
    ///
    /// - `NotFound` if no payment with `payment_id` exists
    pub fn reverse_payment(&mut self, payment_id: PaymentId) -> Result<InstallmentPayment, SalesError> {
        let position = self
            .payments
            .iter()
            .position(|p| p.id == payment_id)
            .ok_or_else(|| SalesError::not_found("Payment", payment_id))?;

        let removed = self.payments.remove(position);
        self.recompute_paid_amount();

        if !self.is_paid() {
            self.payment_date = None;
        }

        Ok(removed)
    }

    /// Overrides the amount owed; payment history is untouched
    pub fn set_amount(&mut self, amount: Decimal) -> Result<(), SalesError> {
        if amount < Decimal::ZERO {
            return Err(SalesError::invalid_amount(format!(
                "Installment amount cannot be negative, got {}",
                amount
            )));
        }
        ensure_cent_range(amount)?;
        self.amount = amount;
        self.refresh_status();
        if self.is_paid() && self.payment_date.is_none() {
            self.payment_date = self.payments.last().map(|p| p.date);
        }
        Ok(())
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    pub fn has_payment(&self, payment_id: PaymentId) -> bool {
        self.payments.iter().any(|p| p.id == payment_id)
    }

    /// True once any payment has been recorded (Paid or Partial)
    pub fn has_payments(&self) -> bool {
        !self.payments.is_empty()
    }

    /// Amount still owed, never negative
    pub fn remaining(&self) -> Decimal {
        (self.amount - self.paid_amount).max(Decimal::ZERO)
    }

    /// Not paid and past its due date on `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_paid() && self.due_date < today
    }

    fn recompute_paid_amount(&mut self) {
        self.paid_amount = self.payments.iter().map(|p| p.amount).sum();
        self.refresh_status();
    }

    fn refresh_status(&mut self) {
        self.status = InstallmentStatus::derive(self.paid_amount, self.amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn installment(amount: Decimal) -> Installment {
        Installment::new(1, amount, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    }

    fn payment(amount: Decimal, day: u32) -> InstallmentPayment {
        InstallmentPayment::new(
            amount,
            Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            PaymentMethod::Cash,
        )
    }

    #[test]
    fn test_partial_then_paid() {
        let mut inst = installment(dec!(100));

        inst.record_payment(payment(dec!(50), 1)).unwrap();
        assert_eq!(inst.status, InstallmentStatus::Partial);
        assert_eq!(inst.paid_amount, dec!(50));
        assert!(inst.payment_date.is_none());

        let second = payment(dec!(50), 10);
        let second_date = second.date;
        inst.record_payment(second).unwrap();
        assert_eq!(inst.status, InstallmentStatus::Paid);
        assert_eq!(inst.paid_amount, dec!(100));
        assert_eq!(inst.payment_date, Some(second_date));
    }

    #[test]
    fn test_payment_date_not_moved_by_later_payments() {
        let mut inst = installment(dec!(100));
        let first = payment(dec!(100), 2);
        let first_date = first.date;
        inst.record_payment(first).unwrap();
        inst.record_payment(payment(dec!(10), 20)).unwrap();

        assert_eq!(inst.paid_amount, dec!(110));
        assert_eq!(inst.payment_date, Some(first_date));
    }

    #[test]
    fn test_duplicate_payment_id_is_noop() {
        let mut inst = installment(dec!(100));
        let p = payment(dec!(30), 1);

        assert_eq!(inst.record_payment(p.clone()).unwrap(), RecordOutcome::Applied);
        assert_eq!(inst.record_payment(p).unwrap(), RecordOutcome::Duplicate);
        assert_eq!(inst.paid_amount, dec!(30));
        assert_eq!(inst.payments.len(), 1);
    }

    #[test]
    fn test_rejects_non_positive_payment() {
        let mut inst = installment(dec!(100));
        assert!(matches!(
            inst.record_payment(payment(Decimal::ZERO, 1)),
            Err(SalesError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_payment_beyond_cent_range_leaves_ledger_untouched() {
        let mut inst = installment(dec!(100));
        inst.record_payment(payment(dec!(40), 1)).unwrap();

        assert!(matches!(
            inst.record_payment(payment(Decimal::MAX, 2)),
            Err(SalesError::InvalidAmount(_))
        ));
        assert_eq!(inst.paid_amount, dec!(40));
        assert_eq!(inst.payments.len(), 1);
        assert!(inst.set_amount(Decimal::MAX).is_err());
        assert_eq!(inst.amount, dec!(100));
    }

    #[test]
    fn test_reverse_restores_previous_state() {
        let mut inst = installment(dec!(100));
        inst.record_payment(payment(dec!(40), 1)).unwrap();
        let before = inst.clone();

        let p = payment(dec!(60), 2);
        let id = p.id;
        inst.record_payment(p).unwrap();
        assert!(inst.is_paid());

        inst.reverse_payment(id).unwrap();
        assert_eq!(inst, before);
    }

    #[test]
    fn test_reverse_unknown_payment() {
        let mut inst = installment(dec!(100));
        assert!(matches!(
            inst.reverse_payment(PaymentId::new()),
            Err(SalesError::NotFound(_))
        ));
    }

    #[test]
    fn test_amount_override_recomputes_status() {
        let mut inst = installment(dec!(100));
        inst.record_payment(payment(dec!(80), 1)).unwrap();

        inst.set_amount(dec!(80)).unwrap();
        assert!(inst.is_paid());
        assert!(inst.payment_date.is_some());

        inst.set_amount(dec!(120)).unwrap();
        assert_eq!(inst.status, InstallmentStatus::Partial);
        assert_eq!(inst.remaining(), dec!(40));

        assert!(inst.set_amount(dec!(-1)).is_err());
    }

    #[test]
    fn test_overdue() {
        let inst = installment(dec!(100));
        assert!(inst.is_overdue(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()));
        assert!(!inst.is_overdue(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
    }

    #[test]
    fn test_status_serializes_as_portuguese_labels() {
        assert_eq!(serde_json::to_string(&InstallmentStatus::Paid).unwrap(), "\"Pago\"");
        assert_eq!(serde_json::to_string(&InstallmentStatus::Partial).unwrap(), "\"Parcial\"");
    }
}
