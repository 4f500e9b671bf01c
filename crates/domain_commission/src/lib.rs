//! Commission Domain - Seller commission settlement
//!
//! Commissions are computed per order by `domain_sales`; this crate groups
//! them per seller and settles them in batches:
//!
//! - [`CommissionStatement`]: what a seller is owed and not yet paid
//! - [`CommissionPayment`]: one settlement batch, created atomically with
//!   the paid flags on its orders and reversible the same way
//! - [`CommissionService`]: application service over the storage ports

pub mod error;
pub mod payment;
pub mod ports;
pub mod services;
pub mod statement;

pub use error::CommissionError;
pub use payment::{CommissionPayment, PayCommissions};
pub use ports::CommissionPort;
pub use services::CommissionService;
pub use statement::{CommissionLine, CommissionStatement};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockCommissionPort;
