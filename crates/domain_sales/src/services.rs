//! Order application service
//!
//! Runs each admin action as a versioned read-modify-write: load the order,
//! apply the pure domain transition, save with the version that was read.
//! A concurrent change makes the save fail with `TransactionFailed` and
//! nothing is applied; the caller retries from scratch.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use core_kernel::{OrderId, PaymentId, RequestContext, StoreSettings};

use crate::error::SalesError;
use crate::installment::{Installment, InstallmentPayment, RecordOutcome};
use crate::order::{NewOrder, Order, OrderStatus, PaymentMethod};
use crate::ports::{CatalogPort, OrderPort};
use crate::product::ProductCatalog;

/// Payment details supplied by the recording UI
#[derive(Debug, Clone)]
pub struct PaymentInput {
    /// Client-supplied id makes retries idempotent; generated when absent
    pub id: Option<PaymentId>,
    pub amount: Decimal,
    pub date: Option<DateTime<Utc>>,
    pub method: PaymentMethod,
}

/// Proof-of-payment handed to receipt and messaging collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub installment: Installment,
    pub outstanding_balance: Decimal,
    /// False when the payment id was already recorded
    pub applied: bool,
}

/// Service orchestrating order creation and every order mutation
pub struct OrderService {
    orders: Arc<dyn OrderPort>,
    catalog: Arc<dyn CatalogPort>,
    settings: StoreSettings,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderPort>, catalog: Arc<dyn CatalogPort>, settings: StoreSettings) -> Self {
        Self {
            orders,
            catalog,
            settings,
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    fn today(&self) -> NaiveDate {
        self.settings.timezone.today()
    }

    async fn load_catalog(&self, order: &Order) -> Result<ProductCatalog, SalesError> {
        let products = self.catalog.get_products(&order.product_ids()).await?;
        Ok(ProductCatalog::new(products))
    }

    /// Loads, applies `apply`, and saves with the version that was read
    async fn mutate<T, F>(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        action: &'static str,
        apply: F,
    ) -> Result<(Order, T), SalesError>
    where
        F: FnOnce(&mut Order, &ProductCatalog) -> Result<T, SalesError>,
    {
        let mut order = self.orders.get_order(order_id).await?;
        let catalog = self.load_catalog(&order).await?;
        let expected_version = order.version;

        let output = apply(&mut order, &catalog).map_err(|e| {
            warn!(%order_id, action, actor = %ctx.actor.label(), error = %e, "Order change rejected");
            e
        })?;

        order.updated_at = Utc::now();
        let saved = self.save(ctx, &order, expected_version, action).await?;
        info!(%order_id, action, actor = %ctx.actor.label(), version = saved.version, "Order updated");
        Ok((saved, output))
    }

    async fn save(
        &self,
        ctx: &RequestContext,
        order: &Order,
        expected_version: i64,
        action: &'static str,
    ) -> Result<Order, SalesError> {
        self.orders.save_order(order, expected_version).await.map_err(|e| {
            warn!(
                order_id = %order.id,
                action,
                actor = %ctx.actor.label(),
                expected_version,
                error = %e,
                "Order save failed"
            );
            SalesError::from(e)
        })
    }

    // ------------------------------------------------------------------
    // Creation and reads
    // ------------------------------------------------------------------

    /// Creates an order, building its crediário schedule when applicable
    pub async fn create_order(&self, ctx: &RequestContext, new: NewOrder) -> Result<Order, SalesError> {
        let mut ids: Vec<_> = new.items.iter().map(|i| i.product_id).collect();
        ids.sort();
        ids.dedup();
        let catalog = ProductCatalog::new(self.catalog.get_products(&ids).await?);

        let order = Order::create(new, &catalog, &self.settings, Utc::now()).map_err(|e| {
            warn!(actor = %ctx.actor.label(), error = %e, "Order creation rejected");
            e
        })?;

        let stored = self.orders.insert_order(&order).await?;
        info!(
            order_id = %stored.id,
            actor = %ctx.actor.label(),
            total = %stored.total,
            installments = stored.installments,
            "Order created"
        );
        Ok(stored)
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, SalesError> {
        Ok(self.orders.get_order(order_id).await?)
    }

    // ------------------------------------------------------------------
    // Payment ledger
    // ------------------------------------------------------------------

    /// Records a payment against one installment
    ///
    /// Re-sending a payment id that is already on any installment of the
    /// order changes nothing and returns a receipt with `applied == false`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order or installment does not exist
    /// - `InvalidAmount` if the amount is not positive
    /// - `TransactionFailed` if the order changed concurrently
    pub async fn record_payment(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        installment_number: u32,
        input: PaymentInput,
    ) -> Result<PaymentReceipt, SalesError> {
        let mut payment = InstallmentPayment::new(
            input.amount,
            input.date.unwrap_or_else(Utc::now),
            input.method,
        )
        .received_by(ctx.actor.label());
        if let Some(id) = input.id {
            payment = payment.with_id(id);
        }
        let payment_id = payment.id;
        let amount = payment.amount;

        let mut order = self.orders.get_order(order_id).await?;
        let expected_version = order.version;
        let outcome = order.record_payment(installment_number, payment).map_err(|e| {
            warn!(%order_id, installment_number, %amount, error = %e, "Payment rejected");
            e
        })?;

        let order = match outcome {
            RecordOutcome::Duplicate => {
                info!(%order_id, installment_number, %payment_id, "Payment already recorded");
                order
            }
            RecordOutcome::Applied => {
                order.updated_at = Utc::now();
                let saved = self.save(ctx, &order, expected_version, "record_payment").await?;
                info!(
                    %order_id,
                    installment_number,
                    %amount,
                    %payment_id,
                    actor = %ctx.actor.label(),
                    "Payment recorded"
                );
                saved
            }
        };

        Ok(PaymentReceipt {
            order_id,
            payment_id,
            installment: order.installment(installment_number)?.clone(),
            outstanding_balance: order.outstanding_balance(),
            applied: outcome == RecordOutcome::Applied,
        })
    }

    /// Removes a payment from an installment's ledger
    pub async fn reverse_payment(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        installment_number: u32,
        payment_id: PaymentId,
    ) -> Result<Order, SalesError> {
        let (order, removed) = self
            .mutate(ctx, order_id, "reverse_payment", |order, _| {
                order.reverse_payment(installment_number, payment_id)
            })
            .await?;
        info!(%order_id, installment_number, %payment_id, amount = %removed.amount, "Payment reversed");
        Ok(order)
    }

    // ------------------------------------------------------------------
    // Financial mutator
    // ------------------------------------------------------------------

    pub async fn change_discount(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        discount: Decimal,
    ) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "change_discount", |order, _| order.change_discount(discount))
            .await
            .map(|(order, _)| order)
    }

    pub async fn register_down_payment(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        amount: Decimal,
    ) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "register_down_payment", |order, _| {
            order.register_down_payment(amount)
        })
        .await
        .map(|(order, _)| order)
    }

    pub async fn reset_down_payment(&self, ctx: &RequestContext, order_id: OrderId) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "reset_down_payment", |order, _| order.reset_down_payment())
            .await
            .map(|(order, _)| order)
    }

    pub async fn change_installment_count(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        new_count: u32,
    ) -> Result<Order, SalesError> {
        let today = self.today();
        let settings = &self.settings;
        self.mutate(ctx, order_id, "change_installment_count", |order, catalog| {
            order.change_installment_count(new_count, catalog, settings, today)
        })
        .await
        .map(|(order, _)| order)
    }

    pub async fn regenerate_schedule(&self, ctx: &RequestContext, order_id: OrderId) -> Result<Order, SalesError> {
        let today = self.today();
        self.mutate(ctx, order_id, "regenerate_schedule", |order, _| order.regenerate_schedule(today))
            .await
            .map(|(order, _)| order)
    }

    pub async fn set_installment_amount(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        installment_number: u32,
        amount: Decimal,
    ) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "set_installment_amount", |order, _| {
            order.set_installment_amount(installment_number, amount)
        })
        .await
        .map(|(order, _)| order)
    }

    pub async fn set_installment_due_date(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        installment_number: u32,
        due_date: NaiveDate,
    ) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "set_installment_due_date", |order, _| {
            order.set_installment_due_date(installment_number, due_date)
        })
        .await
        .map(|(order, _)| order)
    }

    pub async fn update_payment_method(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        method: PaymentMethod,
    ) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "update_payment_method", |order, _| {
            order.update_payment_method(method)
        })
        .await
        .map(|(order, _)| order)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, SalesError> {
        let now = Utc::now();
        self.mutate(ctx, order_id, "update_status", |order, catalog| {
            order.update_status(status, catalog, now)
        })
        .await
        .map(|(order, _)| order)
    }

    pub async fn trash(&self, ctx: &RequestContext, order_id: OrderId) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "trash", |order, _| order.trash())
            .await
            .map(|(order, _)| order)
    }

    pub async fn restore(&self, ctx: &RequestContext, order_id: OrderId) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "restore", |order, _| order.restore())
            .await
            .map(|(order, _)| order)
    }

    /// Permanently deletes a trashed order
    ///
    /// The delete is guarded by the version that was checked, so a restore
    /// or payment landing in between fails it with `TransactionFailed`.
    pub async fn hard_delete(&self, ctx: &RequestContext, order_id: OrderId) -> Result<(), SalesError> {
        let order = self.orders.get_order(order_id).await?;
        order.ensure_hard_deletable()?;
        self.orders
            .delete_order(order_id, order.version)
            .await
            .map_err(|e| {
                warn!(
                    %order_id,
                    actor = %ctx.actor.label(),
                    expected_version = order.version,
                    error = %e,
                    "Order delete failed"
                );
                SalesError::from(e)
            })?;
        info!(%order_id, actor = %ctx.actor.label(), "Order permanently deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Commission
    // ------------------------------------------------------------------

    pub async fn recalculate_commission(&self, ctx: &RequestContext, order_id: OrderId) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "recalculate_commission", |order, catalog| {
            order.recalculate_commission(catalog)
        })
        .await
        .map(|(order, _)| order)
    }

    pub async fn set_manual_commission(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        amount: Decimal,
    ) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "set_manual_commission", |order, _| {
            order.set_manual_commission(amount)
        })
        .await
        .map(|(order, _)| order)
    }

    pub async fn clear_manual_commission(&self, ctx: &RequestContext, order_id: OrderId) -> Result<Order, SalesError> {
        self.mutate(ctx, order_id, "clear_manual_commission", |order, catalog| {
            order.clear_manual_commission(catalog)
        })
        .await
        .map(|(order, _)| order)
    }

    // ------------------------------------------------------------------
    // Payment gateway
    // ------------------------------------------------------------------

    pub async fn attach_gateway_payment(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        external_payment_id: String,
    ) -> Result<Order, SalesError> {
        let now = Utc::now();
        self.mutate(ctx, order_id, "attach_gateway_payment", |order, _| {
            order.attach_gateway_payment(external_payment_id, now)
        })
        .await
        .map(|(order, _)| order)
    }

    /// Applies a status event delivered by the gateway webhook
    pub async fn apply_gateway_status(
        &self,
        ctx: &RequestContext,
        external_payment_id: &str,
        status: String,
        metadata: serde_json::Value,
    ) -> Result<Order, SalesError> {
        let order = self.orders.find_by_gateway_payment_id(external_payment_id).await?;
        let now = Utc::now();
        self.mutate(ctx, order.id, "apply_gateway_status", |order, _| {
            order.apply_gateway_status(status, metadata, now)
        })
        .await
        .map(|(order, _)| order)
    }
}
