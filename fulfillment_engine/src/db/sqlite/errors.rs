use thiserror::Error;

use crate::traits::{InventoryError, PaymentStoreError, SellerStoreError, TtlStoreError};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
}

// The query modules return the store-trait errors directly, so the driver error folds into the
// catch-all `DatabaseError` variant of each.

impl From<sqlx::Error> for PaymentStoreError {
    fn from(e: sqlx::Error) -> Self {
        PaymentStoreError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for PaymentStoreError {
    fn from(e: serde_json::Error) -> Self {
        PaymentStoreError::DatabaseError(format!("could not encode order ids: {e}"))
    }
}

impl From<sqlx::Error> for InventoryError {
    fn from(e: sqlx::Error) -> Self {
        InventoryError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::Error> for SellerStoreError {
    fn from(e: sqlx::Error) -> Self {
        SellerStoreError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for SellerStoreError {
    fn from(e: serde_json::Error) -> Self {
        SellerStoreError::DatabaseError(format!("could not encode line items: {e}"))
    }
}

impl From<sqlx::Error> for TtlStoreError {
    fn from(e: sqlx::Error) -> Self {
        TtlStoreError::DatabaseError(e.to_string())
    }
}
