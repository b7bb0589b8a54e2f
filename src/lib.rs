//! Merch store library
//!
//! Coin ledger for the internal merch store: identities, catalog, ledger
//! engine and history. Re-exported for the server binary, the load test and
//! integration tests.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod history;
pub mod identity;
pub mod ledger;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{AmountError, Coins, OperationContext};
pub use domain::{AuthError, PurchaseError, StoreError, SummaryError, TransferError};
