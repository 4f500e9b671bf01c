//! Core Kernel - Foundational types and utilities for the ADC PRO retail core
//!
//! This crate provides the building blocks shared by every domain crate:
//! - Cent conversion, the cent-exact splitter, and commission rates
//! - Calendar month arithmetic and the store timezone
//! - Strongly-typed identifiers
//! - Port error and marker types for the hexagonal architecture
//! - Explicit request context and store settings

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod context;

pub use money::{MoneyError, Rate, split_cents};
pub use temporal::{Timezone, TemporalError, add_months};
pub use identifiers::{
    OrderId, ProductId, CustomerId, PaymentId, SellerId, StaffId, CommissionPaymentId,
};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use context::{Actor, RequestContext, StoreSettings, DEFAULT_COMMISSION_PERCENTAGE};
