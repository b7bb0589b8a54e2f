//! Database module
//!
//! Pool construction, embedded migrations and schema checks.

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Migrations shipped inside the binary
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the process-wide pool. Call once at startup and pass it down.
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
}

/// Apply any pending migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::debug!("Database migrations applied");
    Ok(())
}

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let required_tables = ["users", "accounts", "merch", "purchases", "transfers"];

    for table in required_tables {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM merch")
        .fetch_one(pool)
        .await?;

    if items == 0 {
        tracing::warn!("Merch catalog is empty; every purchase will fail with item not found");
    } else {
        tracing::info!(items, "Merch catalog loaded");
    }

    Ok(true)
}
