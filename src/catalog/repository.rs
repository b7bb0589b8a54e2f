//! Catalog repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Coins, PurchaseError, StoreError};

/// One purchasable item and its unit price
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub price: Coins,
}

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an item by exact, case-sensitive name.
    pub async fn find_item(&self, name: &str) -> Result<CatalogItem, CatalogError> {
        let row: Option<(Uuid, i64)> =
            sqlx::query_as("SELECT id, price FROM merch WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        let (id, price) = row.ok_or_else(|| CatalogError::ItemNotFound(name.to_string()))?;
        let price = Coins::new(price).map_err(|_| CatalogError::InvalidPrice {
            name: name.to_string(),
            price,
        })?;

        Ok(CatalogItem {
            id,
            name: name.to_string(),
            price,
        })
    }
}

/// Catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Item {name} has invalid price {price}")]
    InvalidPrice { name: String, price: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<CatalogError> for PurchaseError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ItemNotFound(name) => PurchaseError::ItemNotFound(name),
            CatalogError::InvalidPrice { name, price } => {
                tracing::error!(item = %name, price, "Catalog row has an invalid price");
                PurchaseError::Internal(StoreError::InvalidCatalogPrice { item: name, price })
            }
            CatalogError::Database(e) => PurchaseError::from(e),
        }
    }
}
