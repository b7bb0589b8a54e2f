//! History service

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{AccountSummary, CoinHistory, Direction, InventoryItem, StoreError, SummaryError};

/// Read-only aggregation over accounts, purchases and transfers
#[derive(Debug, Clone)]
pub struct HistoryService {
    pool: PgPool,
}

impl HistoryService {
    /// Create a new HistoryService
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Balance, inventory and grouped transfer history of `account_id`.
    ///
    /// All three reads share one REPEATABLE READ snapshot, so the balance
    /// always agrees with the purchases and transfers listed next to it.
    pub async fn account_summary(&self, account_id: Uuid) -> Result<AccountSummary, SummaryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let coins: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM accounts WHERE user_id = $1")
                .bind(account_id)
                .fetch_optional(&mut *tx)
                .await?;

        let coins = coins.ok_or(SummaryError::AccountNotFound(account_id))?;

        let inventory: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT m.name, COUNT(*)
            FROM purchases p
            JOIN merch m ON m.id = p.merch_id
            WHERE p.user_id = $1
            GROUP BY m.name
            HAVING COUNT(*) > 0
            ORDER BY m.name
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *tx)
        .await?;

        let transfers: Vec<(String, i64, String)> = sqlx::query_as(
            r#"
            SELECT u.login, SUM(t.amount)::BIGINT, 'received'::TEXT AS direction
            FROM transfers t
            JOIN users u ON u.id = t.from_user_id
            WHERE t.to_user_id = $1
            GROUP BY u.login
            UNION ALL
            SELECT u.login, SUM(t.amount)::BIGINT, 'sent'::TEXT AS direction
            FROM transfers t
            JOIN users u ON u.id = t.to_user_id
            WHERE t.from_user_id = $1
            GROUP BY u.login
            ORDER BY direction, 1
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let rows = transfers
            .into_iter()
            .map(|(login, amount, direction)| {
                let direction = direction.parse::<Direction>().map_err(|e| {
                    StoreError::Database(sqlx::Error::Decode(e.into()))
                })?;
                Ok((login, amount, direction))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        tracing::debug!(
            account_id = %account_id,
            coins,
            items = inventory.len(),
            counterparties = rows.len(),
            "Account summary built"
        );

        Ok(AccountSummary {
            coins,
            inventory: inventory
                .into_iter()
                .map(|(item, quantity)| InventoryItem { item, quantity })
                .collect(),
            coin_history: CoinHistory::from_grouped(rows),
        })
    }
}
