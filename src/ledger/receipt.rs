//! Results of successful ledger operations

use uuid::Uuid;

use crate::domain::Coins;

/// Result of a successful purchase
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub purchase_id: Uuid,
    pub account_id: Uuid,
    pub item: String,
    pub price: Coins,
    pub balance_after: i64,
}

/// Result of a successful transfer
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub transfer_id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Coins,
    pub sender_balance_after: i64,
}
