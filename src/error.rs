//! Error handling module
//!
//! Maps every operation error to a stable status code, error code and fixed
//! message. Store failures are logged here and never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{AuthError, PurchaseError, SummaryError, TransferError};

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Request-level failures
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing or malformed authorization header")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Too many requests")]
    RateLimitExceeded,

    // Core operation errors
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Purchase(#[from] PurchaseError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Summary(#[from] SummaryError),

    // Server errors (5xx)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: String,
    pub error_code: String,
}

const INTERNAL_MESSAGE: &str = "internal server error";

impl AppError {
    /// Status, stable error code and client-facing message.
    pub fn classify(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AppError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request", "invalid request")
            }
            AppError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "missing or malformed authorization header",
            ),
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "invalid_token", "invalid or expired token")
            }
            AppError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded", "too many requests")
            }

            AppError::Auth(err) => match err {
                AuthError::InvalidCredentials => (
                    StatusCode::BAD_REQUEST,
                    "invalid_credentials",
                    "empty login or password",
                ),
                AuthError::AuthenticationFailed => (
                    StatusCode::UNAUTHORIZED,
                    "authentication_failed",
                    "bad login or password",
                ),
                AuthError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
                }
            },

            AppError::Purchase(err) => match err {
                PurchaseError::ItemNotFound(_) => {
                    (StatusCode::BAD_REQUEST, "item_not_found", "item not found")
                }
                PurchaseError::AccountNotFound(_) => {
                    (StatusCode::BAD_REQUEST, "account_not_found", "account not found")
                }
                PurchaseError::InsufficientFunds { .. } => {
                    (StatusCode::BAD_REQUEST, "insufficient_funds", "insufficient funds")
                }
                PurchaseError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
                }
            },

            AppError::Transfer(err) => match err {
                TransferError::InvalidAmount(_) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_amount",
                    "amount must be a positive integer",
                ),
                TransferError::RecipientNotFound(_) => {
                    (StatusCode::BAD_REQUEST, "recipient_not_found", "recipient not found")
                }
                TransferError::SenderNotFound(_) => {
                    (StatusCode::BAD_REQUEST, "sender_not_found", "sender not found")
                }
                TransferError::SelfTransfer => (
                    StatusCode::BAD_REQUEST,
                    "self_transfer",
                    "sender and recipient are the same",
                ),
                TransferError::InsufficientFunds { .. } => {
                    (StatusCode::BAD_REQUEST, "insufficient_funds", "insufficient funds")
                }
                TransferError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
                }
            },

            AppError::Summary(err) => match err {
                SummaryError::AccountNotFound(_) => {
                    (StatusCode::BAD_REQUEST, "account_not_found", "account not found")
                }
                SummaryError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
                }
            },

            AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.classify();

        if status.is_server_error() {
            tracing::error!(error = ?self, error_code, "Request failed");
        } else {
            tracing::info!(error = %self, error_code, "Request rejected");
        }

        let body = ErrorResponse {
            errors: message.to_string(),
            error_code: error_code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AmountError, StoreError};
    use uuid::Uuid;

    #[test]
    fn test_client_errors_are_bad_request() {
        let cases: Vec<AppError> = vec![
            PurchaseError::ItemNotFound("nonexistent-item".into()).into(),
            PurchaseError::InsufficientFunds { required: 10, available: 5 }.into(),
            TransferError::SelfTransfer.into(),
            TransferError::RecipientNotFound("ghost".into()).into(),
            TransferError::SenderNotFound(Uuid::nil()).into(),
            TransferError::InvalidAmount(AmountError::NotPositive(0)).into(),
            SummaryError::AccountNotFound(Uuid::nil()).into(),
        ];

        for err in cases {
            assert_eq!(err.classify().0, StatusCode::BAD_REQUEST, "{err:?}");
        }
    }

    #[test]
    fn test_authentication_failure_is_generic() {
        let (status, code, message) = AppError::from(AuthError::AuthenticationFailed).classify();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, "authentication_failed");
        assert_eq!(message, "bad login or password");
    }

    #[test]
    fn test_internal_details_do_not_leak() {
        let err = AppError::from(TransferError::Internal(StoreError::Database(
            sqlx::Error::Protocol("connection reset by peer at 10.0.0.7".into()),
        )));

        let (status, code, message) = err.classify();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "internal_error");
        assert!(!message.contains("10.0.0.7"));
    }

    #[test]
    fn test_deadline_is_internal() {
        let err = AppError::from(PurchaseError::Internal(StoreError::DeadlineExceeded));
        assert_eq!(err.classify().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_response_status() {
        let response = AppError::RateLimitExceeded.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = AppError::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
