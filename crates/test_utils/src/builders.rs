//! Test Data Builders
//!
//! Builders with sensible defaults, so tests specify only the fields that
//! matter to them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use core_kernel::{CustomerId, SellerId, StoreSettings};
use domain_commission::PayCommissions;
use domain_sales::{NewOrder, Order, OrderItem, PaymentMethod, Product, ProductCatalog};

use crate::fixtures::{DateFixtures, ProductFixtures};

/// Builder for crediário orders
///
/// Defaults to one TV financed over 10 installments, no discount and no
/// down payment, sold by an anonymous seller.
pub struct OrderBuilder {
    products: Vec<(Product, u32)>,
    customer_id: Option<CustomerId>,
    seller_id: Option<SellerId>,
    seller_name: Option<String>,
    discount: Decimal,
    down_payment: Decimal,
    payment_method: PaymentMethod,
    installments: u32,
    first_due_date: Option<NaiveDate>,
    settings: StoreSettings,
    created_at: DateTime<Utc>,
}

impl Default for OrderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBuilder {
    pub fn new() -> Self {
        Self {
            products: vec![(ProductFixtures::tv(), 1)],
            customer_id: Some(CustomerId::new()),
            seller_id: None,
            seller_name: None,
            discount: Decimal::ZERO,
            down_payment: Decimal::ZERO,
            payment_method: PaymentMethod::Crediario,
            installments: 10,
            first_due_date: Some(DateFixtures::first_due()),
            settings: StoreSettings::default(),
            created_at: DateFixtures::sale_time(),
        }
    }

    /// Replaces the line items with a single product
    pub fn with_product(mut self, product: Product, quantity: u32) -> Self {
        self.products = vec![(product, quantity)];
        self
    }

    /// Adds another line item
    pub fn add_product(mut self, product: Product, quantity: u32) -> Self {
        self.products.push((product, quantity));
        self
    }

    pub fn with_seller(mut self, seller_id: SellerId, name: impl Into<String>) -> Self {
        self.seller_id = Some(seller_id);
        self.seller_name = Some(name.into());
        self
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_down_payment(mut self, down_payment: Decimal) -> Self {
        self.down_payment = down_payment;
        self
    }

    pub fn with_installments(mut self, installments: u32) -> Self {
        self.installments = installments;
        self
    }

    pub fn with_first_due_date(mut self, date: NaiveDate) -> Self {
        self.first_due_date = Some(date);
        self
    }

    /// Paid in full at the till; no schedule is built
    pub fn paid_with(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self.installments = 0;
        self.first_due_date = None;
        self
    }

    pub fn with_settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The catalog covering every product on the order
    pub fn catalog(&self) -> ProductCatalog {
        ProductCatalog::new(self.products.iter().map(|(p, _)| p.clone()))
    }

    /// The creation request, for service-level tests
    pub fn new_order(&self) -> NewOrder {
        NewOrder {
            customer_id: self.customer_id,
            seller_id: self.seller_id,
            seller_name: self.seller_name.clone(),
            items: self
                .products
                .iter()
                .map(|(product, quantity)| OrderItem::from_product(product, *quantity))
                .collect(),
            discount: self.discount,
            down_payment: self.down_payment,
            payment_method: self.payment_method.clone(),
            installments: self.installments,
            first_due_date: self.first_due_date,
        }
    }

    /// Builds the order through `Order::create`
    ///
    /// # Panics
    ///
    /// Panics if the configured order is invalid
    pub fn build(self) -> Order {
        let catalog = self.catalog();
        Order::create(self.new_order(), &catalog, &self.settings, self.created_at)
            .unwrap_or_else(|e| panic!("OrderBuilder produced an invalid order: {}", e))
    }
}

/// Builds a settlement request covering `orders`, with the exact total
pub fn pay_commissions_for(seller_id: SellerId, orders: &[Order], period: &str) -> PayCommissions {
    PayCommissions {
        seller_id,
        seller_name: orders
            .iter()
            .find_map(|o| o.seller_name.clone())
            .unwrap_or_default(),
        amount: orders.iter().map(|o| o.commission).sum(),
        order_ids: orders.iter().map(|o| o.id).collect(),
        period: period.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_builder_finances_ten_installments() {
        let order = OrderBuilder::new().build();
        assert_eq!(order.installment_details.len(), 10);
        assert_eq!(order.total, dec!(1000.00));
        assert_eq!(order.installment_value, dec!(100.00));
    }

    #[test]
    fn test_cash_sale_has_no_schedule() {
        let order = OrderBuilder::new().paid_with(PaymentMethod::Pix).build();
        assert!(order.installment_details.is_empty());
        assert_eq!(order.installments, 0);
    }
}
