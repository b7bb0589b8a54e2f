//! Domain Error Types
//!
//! One closed error enum per core operation. Each enum names exactly the
//! failures that operation can produce, plus an `Internal` variant for
//! store-level faults. Nothing here depends on the web layer.

use thiserror::Error;
use uuid::Uuid;

use super::amount::AmountError;

/// SQLSTATE raised when a serializable transaction cannot be ordered.
const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE raised when Postgres breaks a lock cycle.
const DEADLOCK_DETECTED: &str = "40P01";

/// SQLSTATE for a violated CHECK constraint.
const CHECK_VIOLATION: &str = "23514";

/// Failures of the backing store itself.
///
/// These are never shown to clients verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    #[error("Catalog item {item} has invalid price {price}")]
    InvalidCatalogPrice { item: String, price: i64 },
}

impl StoreError {
    /// True for aborts caused purely by concurrent writers (serialization
    /// failure or deadlock). Only these may be retried.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self.sqlstate().as_deref(),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
        )
    }

    /// True when the store rejected a row because of the named CHECK constraint.
    pub fn is_check_violation(&self, constraint: &str) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some(CHECK_VIOLATION)
                    && db_err.constraint() == Some(constraint)
            }
            _ => false,
        }
    }

    fn sqlstate(&self) -> Option<String> {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().map(|code| code.into_owned())
            }
            _ => None,
        }
    }
}

/// Errors returned by `Purchase(account_id, item_name)`.
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error(transparent)]
    Internal(#[from] StoreError),
}

impl From<sqlx::Error> for PurchaseError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(StoreError::Database(err))
    }
}

/// Errors returned by `Transfer(from_account_id, to_user_login, amount)`.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("Sender not found: {0}")]
    SenderNotFound(Uuid),

    #[error("Cannot transfer coins to yourself")]
    SelfTransfer,

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error(transparent)]
    Internal(#[from] StoreError),
}

impl From<sqlx::Error> for TransferError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(StoreError::Database(err))
    }
}

/// Errors returned by `AccountSummary(account_id)`.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error(transparent)]
    Internal(#[from] StoreError),
}

impl From<sqlx::Error> for SummaryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(StoreError::Database(err))
    }
}

/// Errors returned by `ResolveOrCreateAccount(login, credential)`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Login and password must not be empty")]
    InvalidCredentials,

    #[error("Bad login or password")]
    AuthenticationFailed,

    #[error(transparent)]
    Internal(#[from] StoreError),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(StoreError::Database(err))
    }
}

impl PurchaseError {
    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal(err) if err.is_conflict())
    }
}

impl TransferError {
    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    /// Conflict-only aborts are the one failure worth another attempt.
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal(err) if err.is_conflict())
    }
}
