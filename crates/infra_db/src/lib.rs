//! Infrastructure Database Layer
//!
//! Storage for the crediário core: PostgreSQL repositories built on SQLx,
//! adapters binding them to the domain ports, and an in-memory store with
//! the same semantics.
//!
//! # Layout
//!
//! - [`repositories`] own the SQL and row mapping
//! - [`adapters`] implement `OrderPort`, `CatalogPort` and `CommissionPort`,
//!   translating [`DatabaseError`] into `PortError` and bounding every call
//!   with a timeout
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresOrderAdapter};
//!
//! let config = DatabaseConfig::new("postgres://localhost/adc_pro");
//! let pool = create_pool(&config).await?;
//! run_migrations(&pool).await?;
//! let orders = PostgresOrderAdapter::new(pool, config.query_timeout);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{
    InMemoryStore, PostgresCatalogAdapter, PostgresCommissionAdapter, PostgresOrderAdapter, WriteOp,
};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
