//! Repository implementations for the stored aggregates
//!
//! Repositories own the SQL and the mapping between rows and domain types.
//! All queries are built at runtime with `sqlx::query`/`query_as`, so the
//! crate compiles without a live database.
//!
//! - Orders are updated under optimistic concurrency on `version`
//! - Commission batches settle and reverse inside a single transaction

pub mod orders;
pub mod products;
pub mod commissions;

pub use orders::{OrderRepository, OrderRow};
pub use products::{ProductRepository, ProductRow};
pub use commissions::{CommissionPaymentRow, CommissionRepository};
