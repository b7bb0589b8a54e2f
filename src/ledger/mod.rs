//! Ledger Engine
//!
//! The balance/transaction core. Every mutation runs as one store-level
//! transaction and debits with a guarded conditional update, so concurrent
//! callers can neither overdraw an account nor observe a half-applied
//! transfer or purchase.

mod engine;
mod receipt;

pub use engine::LedgerEngine;
pub use receipt::{PurchaseReceipt, TransferReceipt};
