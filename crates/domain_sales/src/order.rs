//! Order aggregate
//!
//! An order owns its line items, its financial fields, and its crediário
//! schedule. Installments and payments are nested inside the order and are
//! always persisted together with it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::money::to_cents;
use core_kernel::{CustomerId, OrderId, ProductId, SellerId, StoreSettings};

use crate::commission::calculate_commission;
use crate::error::SalesError;
use crate::installment::Installment;
use crate::product::{Product, ProductCatalog};
use crate::schedule::build_schedule;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Canceled,
    /// In the trash; restorable
    Deleted,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Deleted => "deleted",
        };
        f.write_str(label)
    }
}

/// Payment method label
///
/// Known methods get their own variant; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    /// Store-financed installment plan
    Crediario,
    Pix,
    Cash,
    CreditCard,
    DebitCard,
    Other(String),
}

impl PaymentMethod {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Crediario => "crediario",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Cash => "dinheiro",
            PaymentMethod::CreditCard => "cartao_credito",
            PaymentMethod::DebitCard => "cartao_debito",
            PaymentMethod::Other(label) => label,
        }
    }

    /// True for the method that finances the order over a schedule
    pub fn is_installment_plan(&self) -> bool {
        matches!(self, PaymentMethod::Crediario)
    }
}

impl From<String> for PaymentMethod {
    fn from(label: String) -> Self {
        match label.trim().to_lowercase().as_str() {
            "crediario" | "crediário" => PaymentMethod::Crediario,
            "pix" => PaymentMethod::Pix,
            "dinheiro" | "cash" => PaymentMethod::Cash,
            "cartao_credito" | "credit_card" => PaymentMethod::CreditCard,
            "cartao_debito" | "debit_card" => PaymentMethod::DebitCard,
            _ => PaymentMethod::Other(label),
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.as_str().to_string()
    }
}

impl FromStr for PaymentMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PaymentMethod::from(s.to_string()))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price at the time of sale
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(product_id: ProductId, name: impl Into<String>, price: Decimal, quantity: u32) -> Self {
        Self {
            product_id,
            name: name.into(),
            price,
            quantity,
        }
    }

    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self::new(product.id, product.name.clone(), product.price, quantity)
    }

    /// `price * quantity`, failing instead of overflowing
    pub fn line_total(&self) -> Result<Decimal, SalesError> {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| SalesError::invalid_amount(format!("Line total of '{}' is out of range", self.name)))
    }
}

/// Payment-gateway status stashed on the order
///
/// The core stores whatever the gateway reports and never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayInfo {
    pub external_payment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an order at checkout or from the admin form
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub seller_id: Option<SellerId>,
    pub seller_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub discount: Decimal,
    pub down_payment: Decimal,
    pub payment_method: PaymentMethod,
    /// Requested installment count; ignored unless the method is crediário
    pub installments: u32,
    pub first_due_date: Option<NaiveDate>,
}

/// One purchase transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<SellerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    pub items: Vec<OrderItem>,
    /// Sum of line items before discount
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub down_payment: Decimal,
    /// Order total after discount
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    /// Count of financed dues, 0 when not a credit sale
    pub installments: u32,
    /// Nominal per-due amount; informational only
    pub installment_value: Decimal,
    #[serde(default)]
    pub installment_details: Vec<Installment>,
    pub status: OrderStatus,
    pub commission: Decimal,
    pub commission_paid: bool,
    pub is_commission_manual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the store on every save
    pub version: i64,
}

impl Order {
    /// Creates an order and, for crediário sales, its initial schedule
    ///
    /// # Arguments
    ///
    /// * `new` - Checkout or admin form input
    /// * `catalog` - Products referenced by the line items
    /// * `settings` - Store settings supplying the global installment cap
    /// * `now` - Creation timestamp
    ///
    /// # Errors
    ///
    /// - `Validation` for empty orders, zero quantities, or a crediário sale
    ///   without a first due date
    /// - `InvalidAmount` for negative prices, an out-of-range discount or
    ///   down payment, or nothing left to finance
    /// - `InstallmentLimitExceeded` when the count exceeds the product cap
    pub fn create(
        new: NewOrder,
        catalog: &ProductCatalog,
        settings: &StoreSettings,
        now: DateTime<Utc>,
    ) -> Result<Self, SalesError> {
        if new.items.is_empty() {
            return Err(SalesError::validation("Order must have at least one item"));
        }
        for item in &new.items {
            if item.quantity == 0 {
                return Err(SalesError::validation(format!(
                    "Item '{}' must have a positive quantity",
                    item.name
                )));
            }
            if item.price < Decimal::ZERO {
                return Err(SalesError::invalid_amount(format!(
                    "Item '{}' has a negative price",
                    item.name
                )));
            }
        }

        let subtotal = new.items.iter().try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(item.line_total()?)
                .ok_or_else(|| SalesError::invalid_amount("Order subtotal is out of range"))
        })?;
        ensure_cent_range(subtotal)?;
        validate_discount(new.discount, subtotal)?;
        let total = subtotal - new.discount;

        if new.down_payment < Decimal::ZERO || new.down_payment > total {
            return Err(SalesError::invalid_amount(format!(
                "Down payment must be between 0 and {}, got {}",
                total, new.down_payment
            )));
        }

        let mut order = Self {
            id: OrderId::new_v7(),
            customer_id: new.customer_id,
            seller_id: new.seller_id,
            seller_name: new.seller_name,
            items: new.items,
            subtotal,
            discount: new.discount,
            down_payment: new.down_payment,
            total,
            payment_method: new.payment_method,
            installments: 0,
            installment_value: Decimal::ZERO,
            installment_details: Vec::new(),
            status: OrderStatus::Processing,
            commission: Decimal::ZERO,
            commission_paid: false,
            is_commission_manual: false,
            commission_date: None,
            gateway: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
        };

        if order.payment_method.is_installment_plan() {
            let count = new.installments;
            if count == 0 {
                return Err(SalesError::invalid_amount(
                    "Crediário sales need at least one installment",
                ));
            }
            let cap = catalog.installment_cap(&order.items, settings.max_installments);
            if count > cap {
                return Err(SalesError::InstallmentLimitExceeded { requested: count, max: cap });
            }
            let first_due_date = new.first_due_date.ok_or_else(|| {
                SalesError::validation("Crediário sales need a first due date")
            })?;

            let financed = order.financed_total();
            if financed <= Decimal::ZERO {
                return Err(SalesError::invalid_amount(format!(
                    "Nothing to finance: total {} with down payment {}",
                    order.total, order.down_payment
                )));
            }

            order.installment_details = build_schedule(financed, count, first_due_date)?;
            order.installments = count;
            order.installment_value = order
                .installment_details
                .first()
                .map(|i| i.amount)
                .unwrap_or_default();
        }

        order.commission = calculate_commission(&order, catalog)?;
        Ok(order)
    }

    /// Amount the schedule must cover: `total - downPayment`
    pub fn financed_total(&self) -> Decimal {
        self.total - self.down_payment
    }

    /// Sum of every installment amount currently scheduled
    pub fn scheduled_total(&self) -> Decimal {
        self.installment_details.iter().map(|i| i.amount).sum()
    }

    /// Sum of what is still owed across the schedule
    pub fn outstanding_balance(&self) -> Decimal {
        self.installment_details.iter().map(Installment::remaining).sum()
    }

    /// Earliest installment that is not yet paid
    pub fn next_due(&self) -> Option<&Installment> {
        self.installment_details
            .iter()
            .filter(|i| !i.is_paid())
            .min_by_key(|i| (i.due_date, i.installment_number))
    }

    pub fn installment(&self, number: u32) -> Result<&Installment, SalesError> {
        self.installment_details
            .iter()
            .find(|i| i.installment_number == number)
            .ok_or_else(|| SalesError::not_found("Installment", format!("#{} of {}", number, self.id)))
    }

    pub fn installment_mut(&mut self, number: u32) -> Result<&mut Installment, SalesError> {
        let order_id = self.id;
        self.installment_details
            .iter_mut()
            .find(|i| i.installment_number == number)
            .ok_or_else(|| SalesError::not_found("Installment", format!("#{} of {}", number, order_id)))
    }

    pub fn is_trashed(&self) -> bool {
        self.status == OrderStatus::Deleted
    }

    /// Product ids referenced by the line items, without duplicates
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.items.iter().map(|i| i.product_id).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Every stored amount must be expressible in whole `i64` cents
pub(crate) fn ensure_cent_range(amount: Decimal) -> Result<(), SalesError> {
    to_cents(amount)
        .map(|_| ())
        .map_err(|_| SalesError::invalid_amount(format!("Amount {} is out of range", amount)))
}

pub(crate) fn validate_discount(discount: Decimal, subtotal: Decimal) -> Result<(), SalesError> {
    if discount < Decimal::ZERO || discount > subtotal {
        return Err(SalesError::invalid_amount(format!(
            "Discount must be between 0 and {}, got {}",
            subtotal, discount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn crediario(items: Vec<OrderItem>, installments: u32) -> NewOrder {
        NewOrder {
            customer_id: Some(CustomerId::new()),
            seller_id: Some(SellerId::new()),
            seller_name: Some("Joana".to_string()),
            items,
            discount: Decimal::ZERO,
            down_payment: Decimal::ZERO,
            payment_method: PaymentMethod::Crediario,
            installments,
            first_due_date: Some(date(2024, 3, 15)),
        }
    }

    #[test]
    fn test_create_crediario_order_builds_schedule() {
        let fridge = Product::new("Geladeira", dec!(1000.00));
        let catalog = ProductCatalog::new(vec![fridge.clone()]);
        let order = Order::create(
            crediario(vec![OrderItem::from_product(&fridge, 1)], 10),
            &catalog,
            &StoreSettings::default(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(order.total, dec!(1000.00));
        assert_eq!(order.installments, 10);
        assert_eq!(order.installment_value, dec!(100.00));
        assert_eq!(order.installment_details.len(), 10);
        assert_eq!(order.scheduled_total(), order.financed_total());
        assert_eq!(order.installment_details[9].due_date, date(2024, 12, 15));
        assert_eq!(order.commission, dec!(50.00));
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.version, 1);
    }

    #[test]
    fn test_create_with_discount_and_down_payment() {
        let item = OrderItem::new(ProductId::new(), "Sofá", dec!(550.00), 2);
        let mut new = crediario(vec![item], 3);
        new.discount = dec!(100.00);
        new.down_payment = dec!(200.00);

        let order = Order::create(new, &ProductCatalog::default(), &StoreSettings::default(), Utc::now())
            .unwrap();

        assert_eq!(order.subtotal, dec!(1100.00));
        assert_eq!(order.total, dec!(1000.00));
        assert_eq!(order.scheduled_total(), dec!(800.00));
        let amounts: Vec<Decimal> = order.installment_details.iter().map(|i| i.amount).collect();
        assert_eq!(amounts, vec![dec!(266.67), dec!(266.67), dec!(266.66)]);
    }

    #[test]
    fn test_create_rejects_totals_beyond_cent_range() {
        let huge = OrderItem::new(ProductId::new(), "Lote", Decimal::MAX, 2);
        let result = Order::create(
            crediario(vec![huge], 3),
            &ProductCatalog::default(),
            &StoreSettings::default(),
            Utc::now(),
        );
        assert!(matches!(result, Err(SalesError::InvalidAmount(_))));

        // each line fits but the subtotal cannot be expressed in cents
        let lines = vec![
            OrderItem::new(ProductId::new(), "Lote A", Decimal::from(i64::MAX), 1),
            OrderItem::new(ProductId::new(), "Lote B", Decimal::from(i64::MAX), 1),
        ];
        let result = Order::create(
            crediario(lines, 3),
            &ProductCatalog::default(),
            &StoreSettings::default(),
            Utc::now(),
        );
        assert!(matches!(result, Err(SalesError::InvalidAmount(_))));
    }

    #[test]
    fn test_create_cash_order_has_no_schedule() {
        let item = OrderItem::new(ProductId::new(), "Mesa", dec!(300), 1);
        let mut new = crediario(vec![item], 6);
        new.payment_method = PaymentMethod::Cash;

        let order = Order::create(new, &ProductCatalog::default(), &StoreSettings::default(), Utc::now())
            .unwrap();

        assert!(order.installment_details.is_empty());
        assert_eq!(order.installments, 0);
    }

    #[test]
    fn test_create_enforces_product_cap() {
        let phone = Product::new("Celular", dec!(1200)).with_max_installments(6);
        let catalog = ProductCatalog::new(vec![phone.clone()]);

        let result = Order::create(
            crediario(vec![OrderItem::from_product(&phone, 1)], 10),
            &catalog,
            &StoreSettings::default(),
            Utc::now(),
        );

        assert!(matches!(
            result,
            Err(SalesError::InstallmentLimitExceeded { requested: 10, max: 6 })
        ));
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let settings = StoreSettings::default();
        let catalog = ProductCatalog::default();

        assert!(matches!(
            Order::create(crediario(vec![], 1), &catalog, &settings, Utc::now()),
            Err(SalesError::Validation(_))
        ));

        let item = OrderItem::new(ProductId::new(), "Cadeira", dec!(100), 1);
        let mut over_discount = crediario(vec![item.clone()], 1);
        over_discount.discount = dec!(150);
        assert!(matches!(
            Order::create(over_discount, &catalog, &settings, Utc::now()),
            Err(SalesError::InvalidAmount(_))
        ));

        let mut fully_paid = crediario(vec![item.clone()], 1);
        fully_paid.down_payment = dec!(100);
        assert!(matches!(
            Order::create(fully_paid, &catalog, &settings, Utc::now()),
            Err(SalesError::InvalidAmount(_))
        ));

        let mut no_due_date = crediario(vec![item], 2);
        no_due_date.first_due_date = None;
        assert!(matches!(
            Order::create(no_due_date, &catalog, &settings, Utc::now()),
            Err(SalesError::Validation(_))
        ));
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::from("Crediário".to_string()), PaymentMethod::Crediario);
        assert_eq!(PaymentMethod::from("dinheiro".to_string()), PaymentMethod::Cash);
        assert_eq!(
            PaymentMethod::from("boleto".to_string()),
            PaymentMethod::Other("boleto".to_string())
        );
        assert_eq!(serde_json::to_string(&PaymentMethod::CreditCard).unwrap(), "\"cartao_credito\"");
    }

    #[test]
    fn test_next_due_skips_paid() {
        let item = OrderItem::new(ProductId::new(), "TV", dec!(300), 1);
        let mut order = Order::create(
            crediario(vec![item], 3),
            &ProductCatalog::default(),
            &StoreSettings::default(),
            Utc::now(),
        )
        .unwrap();

        order.installment_details[0].set_amount(Decimal::ZERO).unwrap();
        assert_eq!(order.next_due().unwrap().installment_number, 2);
        assert_eq!(order.outstanding_balance(), dec!(200.00));
    }
}
