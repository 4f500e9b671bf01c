//! Port adapters
//!
//! - [`postgres`] binds the sales and commission ports to PostgreSQL
//! - [`memory`] keeps everything in process, for tests and local runs
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use infra_db::InMemoryStore;
//! use domain_sales::{OrderPort, CatalogPort};
//!
//! let store = Arc::new(InMemoryStore::default());
//! let orders: Arc<dyn OrderPort> = store.clone();
//! let catalog: Arc<dyn CatalogPort> = store;
//! ```

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryStore, WriteOp};
pub use postgres::{PostgresCatalogAdapter, PostgresCommissionAdapter, PostgresOrderAdapter};
