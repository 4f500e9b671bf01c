//! Request handlers, one module per resource

pub mod commissions;
pub mod gateway;
pub mod health;
pub mod orders;
pub mod products;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path identifier, accepting it with or without its prefix
pub(crate) fn parse_id<T: FromStr>(kind: &str, raw: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} id: {}", kind, raw)))
}
