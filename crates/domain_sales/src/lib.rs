//! Sales Domain - Orders and crediário installment plans
//!
//! This crate owns the order aggregate and everything financed through it:
//!
//! - **Schedule builder**: splits a financed total into monthly dues
//! - **Payment ledger**: append-only payments per installment, with derived
//!   paid amount, status, and payment date
//! - **Financial mutator**: discount, down payment, installment count,
//!   per-installment overrides, lifecycle transitions
//! - **Commission calculator**: per-item product rules with a default rate
//! - **Ports and service**: storage traits and the versioned
//!   read-modify-write service used by the HTTP layer
//!
//! # Example
//!
//! ```rust
//! use chrono::{NaiveDate, Utc};
//! use core_kernel::{ProductId, StoreSettings};
//! use domain_sales::{NewOrder, Order, OrderItem, PaymentMethod, ProductCatalog};
//! use rust_decimal_macros::dec;
//!
//! let order = Order::create(
//!     NewOrder {
//!         customer_id: None,
//!         seller_id: None,
//!         seller_name: None,
//!         items: vec![OrderItem::new(ProductId::new(), "Fogão", dec!(1000.00), 1)],
//!         discount: dec!(0),
//!         down_payment: dec!(0),
//!         payment_method: PaymentMethod::Crediario,
//!         installments: 10,
//!         first_due_date: NaiveDate::from_ymd_opt(2024, 3, 15),
//!     },
//!     &ProductCatalog::default(),
//!     &StoreSettings::default(),
//!     Utc::now(),
//! )
//! .unwrap();
//!
//! assert_eq!(order.installment_details.len(), 10);
//! assert_eq!(order.scheduled_total(), dec!(1000.00));
//! ```

pub mod commission;
pub mod error;
pub mod financials;
pub mod installment;
pub mod order;
pub mod ports;
pub mod product;
pub mod schedule;
pub mod services;

pub use commission::calculate_commission;
pub use error::SalesError;
pub use installment::{Installment, InstallmentPayment, InstallmentStatus, RecordOutcome};
pub use order::{GatewayInfo, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod};
pub use ports::{CatalogPort, OrderPort};
pub use product::{CommissionRule, CommissionType, Product, ProductCatalog};
pub use schedule::build_schedule;
pub use services::{OrderService, PaymentInput, PaymentReceipt};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockCatalogPort, MockOrderPort};
