//! Ledger engine: purchases, transfers and balance reads.

use std::future::Future;
use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::catalog::{CatalogItem, CatalogRepository};
use crate::domain::{Coins, PurchaseError, StoreError, SummaryError, TransferError};
use crate::identity::IdentityStore;

use super::{PurchaseReceipt, TransferReceipt};

/// Attempts per operation when the store aborts on a write conflict.
const MAX_ATTEMPTS: u32 = 3;

/// CHECK constraint guarding `accounts.balance >= 0`.
const BALANCE_CHECK: &str = "accounts_balance_non_negative";

/// Ledger engine over the shared connection pool
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    pool: PgPool,
    catalog: CatalogRepository,
    identity: IdentityStore,
    deadline: Option<Duration>,
}

impl LedgerEngine {
    pub fn new(pool: PgPool) -> Self {
        Self {
            catalog: CatalogRepository::new(pool.clone()),
            identity: IdentityStore::new(pool.clone()),
            pool,
            deadline: None,
        }
    }

    /// Abort (and roll back) any operation that runs longer than `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    // =========================================================================
    // Purchase
    // =========================================================================

    /// Buy one unit of `item_name` for `account_id`.
    ///
    /// The balance decrement and the purchase row commit together or not at
    /// all. A decrement that would overdraw the account, including one lost to
    /// a concurrent writer, fails with `InsufficientFunds`.
    pub async fn purchase(
        &self,
        account_id: Uuid,
        item_name: &str,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let result = self
            .within_deadline(self.purchase_with_retry(account_id, item_name))
            .await;

        match &result {
            Ok(receipt) => tracing::info!(
                account_id = %account_id,
                item = %receipt.item,
                price = %receipt.price,
                balance = receipt.balance_after,
                "Purchase completed"
            ),
            Err(e) if e.is_client_error() => {
                tracing::debug!(account_id = %account_id, item = %item_name, error = %e, "Purchase rejected")
            }
            Err(e) => {
                tracing::error!(account_id = %account_id, item = %item_name, error = ?e, "Purchase failed")
            }
        }

        result
    }

    async fn purchase_with_retry(
        &self,
        account_id: Uuid,
        item_name: &str,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let item = self.catalog.find_item(item_name).await?;

        retry_on_conflict("purchase", PurchaseError::is_retryable, || {
            self.try_purchase(account_id, &item)
        })
        .await
    }

    async fn try_purchase(
        &self,
        account_id: Uuid,
        item: &CatalogItem,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let mut tx = begin_read_committed(&self.pool).await?;
        let receipt = Self::purchase_in_tx(&mut tx, account_id, item).await?;
        tx.commit().await?;
        Ok(receipt)
    }

    /// The purchase unit of work inside a caller-owned transaction.
    ///
    /// Nothing is visible to other sessions until the caller commits; dropping
    /// the transaction instead discards both the debit and the purchase row.
    pub async fn purchase_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        account_id: Uuid,
        item: &CatalogItem,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let available = current_balance(tx, account_id)
            .await?
            .ok_or(PurchaseError::AccountNotFound(account_id))?;

        if !item.price.is_covered_by(available) {
            return Err(PurchaseError::InsufficientFunds {
                required: item.price.value(),
                available,
            });
        }

        let balance_after = match debit(tx, account_id, item.price).await {
            Ok(Some(balance)) => balance,
            Ok(None) => {
                // Funds were consumed between the read and the guarded update.
                let available = current_balance(tx, account_id).await?.unwrap_or(0);
                return Err(PurchaseError::InsufficientFunds {
                    required: item.price.value(),
                    available,
                });
            }
            Err(e) if e.is_check_violation(BALANCE_CHECK) => {
                return Err(PurchaseError::InsufficientFunds {
                    required: item.price.value(),
                    available,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let purchase_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO purchases (user_id, merch_id, price)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(item.id)
        .bind(item.price.value())
        .fetch_one(&mut **tx)
        .await?;

        Ok(PurchaseReceipt {
            purchase_id,
            account_id,
            item: item.name.clone(),
            price: item.price,
            balance_after,
        })
    }

    // =========================================================================
    // Transfer
    // =========================================================================

    /// Move `amount` coins from `from_account_id` to the account of `to_login`.
    ///
    /// Debit, credit and the transfer row commit as one unit. Of two
    /// concurrent transfers that together exceed the sender's balance, exactly
    /// one succeeds and the other fails with `InsufficientFunds`.
    pub async fn transfer(
        &self,
        from_account_id: Uuid,
        to_login: &str,
        amount: i64,
    ) -> Result<TransferReceipt, TransferError> {
        let result = match Coins::new(amount) {
            Ok(amount) => {
                self.within_deadline(self.transfer_with_retry(from_account_id, to_login, amount))
                    .await
            }
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(receipt) => tracing::info!(
                from_account_id = %receipt.from_account_id,
                to_account_id = %receipt.to_account_id,
                amount = %receipt.amount,
                transfer_id = %receipt.transfer_id,
                "Transfer completed"
            ),
            Err(e) if e.is_client_error() => tracing::debug!(
                from_account_id = %from_account_id,
                to_login = %to_login,
                amount,
                error = %e,
                "Transfer rejected"
            ),
            Err(e) => tracing::error!(
                from_account_id = %from_account_id,
                to_login = %to_login,
                amount,
                error = ?e,
                "Transfer failed"
            ),
        }

        result
    }

    async fn transfer_with_retry(
        &self,
        from_account_id: Uuid,
        to_login: &str,
        amount: Coins,
    ) -> Result<TransferReceipt, TransferError> {
        let to_account_id = self
            .identity
            .find_account_id(to_login)
            .await?
            .ok_or_else(|| TransferError::RecipientNotFound(to_login.to_string()))?;

        if from_account_id == to_account_id {
            return Err(TransferError::SelfTransfer);
        }

        retry_on_conflict("transfer", TransferError::is_retryable, || {
            self.try_transfer(from_account_id, to_account_id, amount)
        })
        .await
    }

    async fn try_transfer(
        &self,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Coins,
    ) -> Result<TransferReceipt, TransferError> {
        let mut tx = begin_read_committed(&self.pool).await?;
        let receipt = Self::transfer_in_tx(&mut tx, from_account_id, to_account_id, amount).await?;
        tx.commit().await?;
        Ok(receipt)
    }

    /// The transfer unit of work inside a caller-owned transaction.
    ///
    /// Both account rows are locked in key order first, so opposing transfers
    /// between the same pair of accounts queue instead of deadlocking.
    pub async fn transfer_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Coins,
    ) -> Result<TransferReceipt, TransferError> {
        if from_account_id == to_account_id {
            return Err(TransferError::SelfTransfer);
        }

        let locked: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT user_id, balance
            FROM accounts
            WHERE user_id = ANY($1)
            ORDER BY user_id
            FOR UPDATE
            "#,
        )
        .bind(vec![from_account_id, to_account_id])
        .fetch_all(&mut **tx)
        .await?;

        let balance_of = |account_id: Uuid| {
            locked
                .iter()
                .find(|(id, _)| *id == account_id)
                .map(|(_, balance)| *balance)
        };

        let available = balance_of(from_account_id)
            .ok_or(TransferError::SenderNotFound(from_account_id))?;

        if balance_of(to_account_id).is_none() {
            return Err(TransferError::RecipientNotFound(to_account_id.to_string()));
        }

        if !amount.is_covered_by(available) {
            return Err(TransferError::InsufficientFunds {
                required: amount.value(),
                available,
            });
        }

        let sender_balance_after = match debit(tx, from_account_id, amount).await {
            Ok(Some(balance)) => balance,
            Ok(None) => {
                let available = current_balance(tx, from_account_id).await?.unwrap_or(0);
                return Err(TransferError::InsufficientFunds {
                    required: amount.value(),
                    available,
                });
            }
            Err(e) if e.is_check_violation(BALANCE_CHECK) => {
                return Err(TransferError::InsufficientFunds {
                    required: amount.value(),
                    available,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let credited = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance + $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(to_account_id)
        .bind(amount.value())
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if credited == 0 {
            return Err(TransferError::RecipientNotFound(to_account_id.to_string()));
        }

        let transfer_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO transfers (from_user_id, to_user_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(from_account_id)
        .bind(to_account_id)
        .bind(amount.value())
        .fetch_one(&mut **tx)
        .await?;

        Ok(TransferReceipt {
            transfer_id,
            from_account_id,
            to_account_id,
            amount,
            sender_balance_after,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current committed balance of `account_id`.
    pub async fn balance(&self, account_id: Uuid) -> Result<i64, SummaryError> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM accounts WHERE user_id = $1")
                .bind(account_id)
                .fetch_optional(&self.pool)
                .await?;

        balance.ok_or(SummaryError::AccountNotFound(account_id))
    }

    async fn within_deadline<T, E, Fut>(&self, operation: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: From<StoreError>,
    {
        let Some(limit) = self.deadline else {
            return operation.await;
        };

        match tokio::time::timeout(limit, operation).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(deadline_ms = limit.as_millis() as u64, "Ledger operation timed out");
                Err(StoreError::DeadlineExceeded.into())
            }
        }
    }
}

/// Start a transaction pinned to READ COMMITTED regardless of server defaults.
async fn begin_read_committed(pool: &PgPool) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

async fn current_balance(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE user_id = $1")
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await
}

/// Guarded decrement. Returns the new balance, or `None` when the row no
/// longer covers `amount` at the moment the update takes the row lock.
async fn debit(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    amount: Coins,
) -> Result<Option<i64>, StoreError> {
    let balance: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE accounts
        SET balance = balance - $2, updated_at = NOW()
        WHERE user_id = $1 AND balance >= $2
        RETURNING balance
        "#,
    )
    .bind(account_id)
    .bind(amount.value())
    .fetch_optional(&mut **tx)
    .await?;

    Ok(balance)
}

/// Re-run `attempt` while it fails with a conflict-only abort, up to
/// [`MAX_ATTEMPTS`] times with linear backoff.
async fn retry_on_conflict<T, E, F, Fut>(
    operation: &'static str,
    is_retryable: fn(&E) -> bool,
    mut attempt: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut tries = 1;

    loop {
        match attempt().await {
            Err(e) if is_retryable(&e) && tries < MAX_ATTEMPTS => {
                tracing::warn!(
                    operation,
                    attempt = tries,
                    max_attempts = MAX_ATTEMPTS,
                    "Transaction conflict, retrying"
                );
                tokio::time::sleep(Duration::from_millis(50 * u64::from(tries))).await;
                tries += 1;
            }
            result => return result,
        }
    }
}
