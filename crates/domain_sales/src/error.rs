//! Sales domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError, TemporalError};

/// Errors that can occur in the sales domain
///
/// Validation failures and missing records are expected outcomes and are
/// always returned as values. Storage failures surface as
/// `TransactionFailed` with the adapter error attached as the source.
#[derive(Debug, Error)]
pub enum SalesError {
    /// Referenced order, installment, payment, or product does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A discount, down payment, or installment amount failed its range check
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Requested installment count exceeds the cap imposed by the line items
    #[error("Installment limit exceeded: requested {requested}, maximum {max}")]
    InstallmentLimitExceeded { requested: u32, max: u32 },

    /// Lifecycle rule violated
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The mutation could not be applied in full; nothing was applied
    #[error("Transaction failed: {message}")]
    TransactionFailed {
        message: String,
        #[source]
        source: Option<PortError>,
    },
}

impl SalesError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        SalesError::NotFound(format!("{} {}", entity, id))
    }

    pub fn invalid_amount(message: impl Into<String>) -> Self {
        SalesError::InvalidAmount(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        SalesError::Validation(message.into())
    }

    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        SalesError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns true if the caller may retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, SalesError::TransactionFailed { .. })
    }
}

impl From<PortError> for SalesError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => {
                SalesError::NotFound(format!("{} {}", entity_type, id))
            }
            PortError::Validation { message } => SalesError::Validation(message),
            other => SalesError::TransactionFailed {
                message: other.to_string(),
                source: Some(other),
            },
        }
    }
}

impl From<MoneyError> for SalesError {
    fn from(error: MoneyError) -> Self {
        SalesError::InvalidAmount(error.to_string())
    }
}

impl From<TemporalError> for SalesError {
    fn from(error: TemporalError) -> Self {
        SalesError::Validation(error.to_string())
    }
}
