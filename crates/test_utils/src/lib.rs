//! Test Utilities Crate
//!
//! Shared test infrastructure for the crediário core test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built products, actors and dates
//! - `builders`: Builder for orders with sensible defaults
//! - `assertions`: Assertion helpers for schedules and ledgers
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
