//! Domain module
//!
//! Core domain types shared by the identity store, ledger and history.

pub mod amount;
pub mod context;
pub mod error;
pub mod summary;

pub use amount::{AmountError, Coins, STARTING_BALANCE};
pub use context::OperationContext;
pub use error::{AuthError, PurchaseError, StoreError, SummaryError, TransferError};
pub use summary::{AccountSummary, CoinHistory, Direction, InventoryItem, Received, Sent};
