use thiserror::Error;

use crate::db_types::{InventoryRecord, LineItem, OrderId};

#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: String, requested: i64, available: i64 },
    #[error("Product {0} is not in the inventory ledger")]
    ProductNotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Persistence behaviour for the inventory ledger. All mutations preserve the conservation
/// invariant `available + reserved + sold = const` for each product.
#[allow(async_fn_in_trait)]
pub trait InventoryStore: Clone {
    /// Lazily create a ledger row for a product. Idempotent; an existing row is returned
    /// untouched.
    async fn ensure_product(
        &self,
        product_id: &str,
        product_name: &str,
        initial_stock: i64,
    ) -> Result<InventoryRecord, InventoryError>;

    async fn fetch_product(&self, product_id: &str) -> Result<Option<InventoryRecord>, InventoryError>;

    /// Move each line item's quantity from available to reserved, in one transaction. If any
    /// line cannot be covered the whole reservation rolls back. Replays for an order that
    /// already holds reservations are no-ops.
    async fn reserve(&self, order_id: &OrderId, items: &[LineItem]) -> Result<(), InventoryError>;

    /// Convert this order's reservations into sold stock. Returns `false` when the order holds
    /// no reservations in the `RESERVED` state (i.e. a replay or an unknown order).
    async fn confirm(&self, order_id: &OrderId) -> Result<bool, InventoryError>;

    /// Return this order's reservations to available stock. Same replay semantics as
    /// [`InventoryStore::confirm`].
    async fn release(&self, order_id: &OrderId) -> Result<bool, InventoryError>;
}
