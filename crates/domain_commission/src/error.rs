//! Commission domain errors

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur while settling or reversing commissions
#[derive(Debug, Error)]
pub enum CommissionError {
    /// Referenced commission payment or order does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Settlement amount or order selection is not acceptable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Settlement or reversal could not complete in full; nothing was applied
    #[error("Transaction failed: {message}")]
    TransactionFailed {
        message: String,
        #[source]
        source: Option<PortError>,
    },
}

impl CommissionError {
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        CommissionError::InvalidAmount(message.into())
    }

    /// Rejection that leaves the store untouched
    pub fn rejected(message: impl Into<String>) -> Self {
        CommissionError::TransactionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// True only for storage failures that may pass on a second attempt
    ///
    /// Settlement runs under row locks, so a conflict means some order in
    /// the batch cannot be settled and the same request fails again.
    pub fn is_retryable(&self) -> bool {
        match self {
            CommissionError::TransactionFailed { source: Some(source), .. } => {
                !matches!(source, PortError::Conflict { .. })
            }
            _ => false,
        }
    }
}

impl From<PortError> for CommissionError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => {
                CommissionError::NotFound(format!("{} {}", entity_type, id))
            }
            PortError::Validation { message } => CommissionError::Validation(message),
            other => CommissionError::TransactionFailed {
                message: other.to_string(),
                source: Some(other),
            },
        }
    }
}
