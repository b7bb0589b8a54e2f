//! Common test utilities

#![allow(dead_code)]

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use merch_store::catalog::{CatalogItem, CatalogRepository};
use merch_store::db;
use merch_store::identity::IdentityStore;

pub const PASSWORD: &str = "correct horse battery staple";

/// Connect to the test database and apply migrations.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::migrate(&pool).await.expect("Failed to run migrations");

    pool
}

/// Login that no other test run will use
pub fn unique_login(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Create a fresh account with the starting balance.
pub async fn create_account(pool: &PgPool, prefix: &str) -> (Uuid, String) {
    let login = unique_login(prefix);
    let account_id = IdentityStore::new(pool.clone())
        .resolve_or_create_account(&login, PASSWORD)
        .await
        .expect("Failed to create account");
    (account_id, login)
}

/// Insert a catalog item private to the calling test.
pub async fn create_item(pool: &PgPool, price: i64) -> CatalogItem {
    let name = unique_login("item");

    sqlx::query("INSERT INTO merch (name, price) VALUES ($1, $2)")
        .bind(&name)
        .bind(price)
        .execute(pool)
        .await
        .expect("Failed to seed merch item");

    CatalogRepository::new(pool.clone())
        .find_item(&name)
        .await
        .expect("Seeded item not found")
}

pub async fn balance_of(pool: &PgPool, account_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE user_id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("Account row missing")
}

pub async fn transfers_from(pool: &PgPool, account_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM transfers WHERE from_user_id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count transfers")
}

pub async fn purchases_of(pool: &PgPool, account_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE user_id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count purchases")
}
