//! Account creation and login lookup.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{AuthError, STARTING_BALANCE};

use super::password::{hash_password, verify_password};

/// Identity store backed by the `users` and `accounts` tables
#[derive(Debug, Clone)]
pub struct IdentityStore {
    pool: PgPool,
}

impl IdentityStore {
    /// Create a new IdentityStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return the account for `login`, creating it on first use.
    ///
    /// An existing login must present the matching password. A new login gets
    /// a user row and a balance row of [`STARTING_BALANCE`] in one transaction.
    pub async fn resolve_or_create_account(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Uuid, AuthError> {
        if login.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        if let Some((account_id, stored)) = self.find_credentials(login).await? {
            return Self::check(account_id, login, password, &stored);
        }

        let password_hash = hash_password(password);
        let mut tx = self.pool.begin().await?;

        // Concurrent first logins race here; the loser inserts nothing.
        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO users (login, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (login) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(login)
        .bind(&password_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(account_id) = inserted else {
            tx.rollback().await?;
            let (account_id, stored) = self
                .find_credentials(login)
                .await?
                .ok_or(AuthError::AuthenticationFailed)?;
            return Self::check(account_id, login, password, &stored);
        };

        sqlx::query(
            r#"
            INSERT INTO accounts (user_id, balance)
            VALUES ($1, $2)
            "#,
        )
        .bind(account_id)
        .bind(STARTING_BALANCE)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            account_id = %account_id,
            login = %login,
            balance = STARTING_BALANCE,
            "Account created"
        );

        Ok(account_id)
    }

    /// Resolve a login to its account id without side effects.
    pub async fn find_account_id(&self, login: &str) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM users WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_credentials(&self, login: &str) -> Result<Option<(Uuid, String)>, sqlx::Error> {
        sqlx::query_as("SELECT id, password_hash FROM users WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await
    }

    fn check(
        account_id: Uuid,
        login: &str,
        password: &str,
        stored: &str,
    ) -> Result<Uuid, AuthError> {
        if verify_password(password, stored) {
            Ok(account_id)
        } else {
            tracing::info!(login = %login, "Authentication failed");
            Err(AuthError::AuthenticationFailed)
        }
    }
}
