//! Order financial mutator and lifecycle transitions
//!
//! Every transition here is a pure function of the order and its explicit
//! inputs. Persistence, versioning, and logging happen in
//! [`crate::services::OrderService`].
//!
//! Schedule-affecting transitions (`change_installment_count`,
//! `regenerate_schedule`) leave `sum(installment amounts) == total - downPayment`.
//! Recorded payments are never discarded: installments carrying payments are
//! frozen and carried over when the schedule is rebuilt.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use core_kernel::{PaymentId, StoreSettings};

use crate::commission::calculate_commission;
use crate::error::SalesError;
use crate::installment::{InstallmentPayment, RecordOutcome};
use crate::order::{ensure_cent_range, validate_discount, GatewayInfo, Order, OrderStatus, PaymentMethod};
use crate::product::ProductCatalog;
use crate::schedule::{first_pending_due_date, frozen_count, regenerate_pending};

impl Order {
    /// Fails for orders sitting in the trash
    pub fn ensure_editable(&self) -> Result<(), SalesError> {
        if self.is_trashed() {
            return Err(SalesError::invalid_transition(self.status, "edit"));
        }
        Ok(())
    }

    /// Fails unless the order is paid through crediário
    fn ensure_installment_plan(&self) -> Result<(), SalesError> {
        if !self.payment_method.is_installment_plan() {
            return Err(SalesError::validation(format!(
                "Orders paid with {} have no installment schedule",
                self.payment_method
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Financial fields
    // ------------------------------------------------------------------

    /// Sets a new discount and recomputes the total
    ///
    /// The schedule is not touched; use [`Order::regenerate_schedule`] to
    /// bring it back in line with the new total.
    pub fn change_discount(&mut self, discount: Decimal) -> Result<(), SalesError> {
        self.ensure_editable()?;
        validate_discount(discount, self.subtotal)?;
        self.discount = discount;
        self.total = self.subtotal - discount;
        Ok(())
    }

    /// Registers an upfront payment subtracted before financing
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` unless `0 < amount <= total`
    pub fn register_down_payment(&mut self, amount: Decimal) -> Result<(), SalesError> {
        self.ensure_editable()?;
        if amount <= Decimal::ZERO || amount > self.total {
            return Err(SalesError::invalid_amount(format!(
                "Down payment must be greater than 0 and at most {}, got {}",
                self.total, amount
            )));
        }
        self.down_payment = amount;
        Ok(())
    }

    pub fn reset_down_payment(&mut self) -> Result<(), SalesError> {
        self.ensure_editable()?;
        self.down_payment = Decimal::ZERO;
        Ok(())
    }

    /// Re-splits the unpaid balance over `new_count` pending installments
    ///
    /// Installments that carry payments stay as they are and are numbered
    /// first. `new_count` counts the regenerated dues only, and is capped by
    /// the smallest product limit among the line items.
    ///
    /// # Errors
    ///
    /// - `Validation` if the order is not a crediário sale
    /// - `InvalidAmount` if `new_count` is zero or the frozen installments
    ///   already cover the financed total
    /// - `InstallmentLimitExceeded` if `new_count` exceeds the cap
    pub fn change_installment_count(
        &mut self,
        new_count: u32,
        catalog: &ProductCatalog,
        settings: &StoreSettings,
        today: NaiveDate,
    ) -> Result<(), SalesError> {
        self.ensure_editable()?;
        self.ensure_installment_plan()?;
        if new_count == 0 {
            return Err(SalesError::invalid_amount("Installment count must be at least 1"));
        }
        let cap = catalog.installment_cap(&self.items, settings.max_installments);
        if new_count > cap {
            return Err(SalesError::InstallmentLimitExceeded {
                requested: new_count,
                max: cap,
            });
        }

        self.rebuild_pending(new_count, today)
    }

    /// Rebuilds pending installments so the schedule sums to the financed
    /// total again, keeping the current number of pending dues (at least one)
    pub fn regenerate_schedule(&mut self, today: NaiveDate) -> Result<(), SalesError> {
        self.ensure_editable()?;
        self.ensure_installment_plan()?;
        let pending = self.installment_details.len() as u32 - frozen_count(&self.installment_details);
        self.rebuild_pending(pending.max(1), today)
    }

    fn rebuild_pending(&mut self, pending_count: u32, today: NaiveDate) -> Result<(), SalesError> {
        let first_due = first_pending_due_date(&self.installment_details, today)?;
        let frozen = frozen_count(&self.installment_details) as usize;
        let schedule = regenerate_pending(
            &self.installment_details,
            self.financed_total(),
            pending_count,
            first_due,
        )?;

        self.installment_value = schedule
            .get(frozen)
            .map(|i| i.amount)
            .unwrap_or(self.installment_value);
        self.installments = schedule.len() as u32;
        self.installment_details = schedule;
        Ok(())
    }

    /// Overrides one installment's amount; the order sum is not re-checked
    pub fn set_installment_amount(&mut self, number: u32, amount: Decimal) -> Result<(), SalesError> {
        self.ensure_editable()?;
        self.installment_mut(number)?.set_amount(amount)
    }

    /// Moves one installment's due date
    pub fn set_installment_due_date(&mut self, number: u32, due_date: NaiveDate) -> Result<(), SalesError> {
        self.ensure_editable()?;
        self.installment_mut(number)?.due_date = due_date;
        Ok(())
    }

    /// Changes the payment method label; the schedule is left as is
    pub fn update_payment_method(&mut self, method: PaymentMethod) -> Result<(), SalesError> {
        self.ensure_editable()?;
        self.payment_method = method;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Payment ledger
    // ------------------------------------------------------------------

    /// Appends a payment to installment `number`
    ///
    /// A payment id already present on any installment of the order is a
    /// retry and yields `Duplicate` without touching the ledger.
    pub fn record_payment(
        &mut self,
        number: u32,
        payment: InstallmentPayment,
    ) -> Result<RecordOutcome, SalesError> {
        self.ensure_editable()?;
        self.installment(number)?;
        if self.installment_details.iter().any(|i| i.has_payment(payment.id)) {
            return Ok(RecordOutcome::Duplicate);
        }
        self.installment_mut(number)?.record_payment(payment)
    }

    pub fn reverse_payment(
        &mut self,
        number: u32,
        payment_id: PaymentId,
    ) -> Result<InstallmentPayment, SalesError> {
        self.ensure_editable()?;
        self.installment_mut(number)?.reverse_payment(payment_id)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Moves the order among Processing, Shipped, Delivered and Canceled
    ///
    /// The first move to Delivered computes the commission unless it was set
    /// manually.
    pub fn update_status(
        &mut self,
        status: OrderStatus,
        catalog: &ProductCatalog,
        now: DateTime<Utc>,
    ) -> Result<(), SalesError> {
        if self.is_trashed() || status == OrderStatus::Deleted {
            return Err(SalesError::invalid_transition(self.status, status));
        }

        if status == OrderStatus::Delivered && self.delivered_at.is_none() {
            self.commission = calculate_commission(self, catalog)?;
            self.delivered_at = Some(now);
        }
        self.status = status;
        Ok(())
    }

    /// Soft delete; installment data is kept
    pub fn trash(&mut self) -> Result<(), SalesError> {
        if self.is_trashed() {
            return Err(SalesError::invalid_transition(self.status, OrderStatus::Deleted));
        }
        self.status = OrderStatus::Deleted;
        Ok(())
    }

    /// Brings a trashed or canceled order back to Processing
    pub fn restore(&mut self) -> Result<(), SalesError> {
        match self.status {
            OrderStatus::Deleted | OrderStatus::Canceled => {
                self.status = OrderStatus::Processing;
                Ok(())
            }
            other => Err(SalesError::invalid_transition(other, OrderStatus::Processing)),
        }
    }

    /// Permanent deletion is only allowed from the trash
    pub fn ensure_hard_deletable(&self) -> Result<(), SalesError> {
        if !self.is_trashed() {
            return Err(SalesError::invalid_transition(self.status, "purged"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Commission
    // ------------------------------------------------------------------

    pub fn recalculate_commission(&mut self, catalog: &ProductCatalog) -> Result<Decimal, SalesError> {
        self.ensure_editable()?;
        self.commission = calculate_commission(self, catalog)?;
        Ok(self.commission)
    }

    pub fn set_manual_commission(&mut self, amount: Decimal) -> Result<(), SalesError> {
        self.ensure_editable()?;
        if amount < Decimal::ZERO {
            return Err(SalesError::invalid_amount(format!(
                "Commission cannot be negative, got {}",
                amount
            )));
        }
        ensure_cent_range(amount)?;
        self.commission = amount;
        self.is_commission_manual = true;
        Ok(())
    }

    pub fn clear_manual_commission(&mut self, catalog: &ProductCatalog) -> Result<Decimal, SalesError> {
        self.ensure_editable()?;
        self.is_commission_manual = false;
        self.commission = calculate_commission(self, catalog)?;
        Ok(self.commission)
    }

    // ------------------------------------------------------------------
    // Payment gateway
    // ------------------------------------------------------------------

    /// Links the order to a payment created on the external gateway
    ///
    /// Trashed and canceled orders cannot take new payments.
    pub fn attach_gateway_payment(
        &mut self,
        external_payment_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), SalesError> {
        self.ensure_editable()?;
        if self.status == OrderStatus::Canceled {
            return Err(SalesError::invalid_transition(self.status, "gateway payment"));
        }
        self.gateway = Some(GatewayInfo {
            external_payment_id: external_payment_id.into(),
            status: None,
            metadata: serde_json::Value::Null,
            updated_at: now,
        });
        Ok(())
    }

    /// Stores a status reported by the gateway, verbatim
    pub fn apply_gateway_status(
        &mut self,
        status: impl Into<String>,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<(), SalesError> {
        let order_id = self.id;
        let gateway = self
            .gateway
            .as_mut()
            .ok_or_else(|| SalesError::not_found("Gateway payment for order", order_id))?;
        gateway.status = Some(status.into());
        gateway.metadata = metadata;
        gateway.updated_at = now;
        Ok(())
    }
}
