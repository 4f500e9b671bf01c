//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_commission::CommissionError;
use domain_sales::SalesError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Amounts or counts the domain rejected
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Conflict: {message}")]
    Conflict { message: String, retryable: bool },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {message}")]
    Validation { message: String, details: Vec<String> },
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// The same request may succeed if sent again
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, retryable, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, false, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, false, None),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_amount", msg, false, None),
            ApiError::Conflict { message, retryable } => (StatusCode::CONFLICT, "conflict", message, retryable, None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, false, None)
            }
            ApiError::Validation { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                message,
                false,
                Some(details).filter(|d| !d.is_empty()),
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            retryable,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<SalesError> for ApiError {
    fn from(err: SalesError) -> Self {
        match err {
            SalesError::NotFound(msg) => ApiError::NotFound(msg),
            SalesError::InvalidAmount(_) | SalesError::InstallmentLimitExceeded { .. } => {
                ApiError::Unprocessable(err.to_string())
            }
            SalesError::Validation(message) => ApiError::Validation {
                message,
                details: Vec::new(),
            },
            SalesError::InvalidStateTransition { .. } => ApiError::Conflict {
                message: err.to_string(),
                retryable: false,
            },
            SalesError::TransactionFailed { .. } => ApiError::Conflict {
                message: err.to_string(),
                retryable: true,
            },
        }
    }
}

impl From<CommissionError> for ApiError {
    fn from(err: CommissionError) -> Self {
        match err {
            CommissionError::NotFound(msg) => ApiError::NotFound(msg),
            CommissionError::InvalidAmount(_) => ApiError::Unprocessable(err.to_string()),
            CommissionError::Validation(message) => ApiError::Validation {
                message,
                details: Vec::new(),
            },
            CommissionError::TransactionFailed { .. } => ApiError::Conflict {
                retryable: err.is_retryable(),
                message: err.to_string(),
            },
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        ApiError::Validation {
            message: "Request body failed validation".to_string(),
            details,
        }
    }
}
