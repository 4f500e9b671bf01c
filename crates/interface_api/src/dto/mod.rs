//! Request and response bodies
//!
//! Domain types already serialize in the storage shape (camelCase), so
//! responses mostly return them as-is. Requests get their own types with
//! `validator` rules for what can be checked before the domain sees them.

pub mod commissions;
pub mod gateway;
pub mod orders;
