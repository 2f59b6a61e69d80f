use chrono::NaiveDate;
use fulfillment_common::Vnd;
use thiserror::Error;

use crate::db_types::{DailyRevenue, LineItem, OrderId, OrderSnapshot, ProductAnalytics, SnapshotStatus};

#[derive(Debug, Clone, Error)]
pub enum SellerStoreError {
    #[error("Order {0} has no snapshot")]
    SnapshotNotFound(OrderId),
    #[error("Order {order_id} is {actual}, expected {expected}")]
    InvalidStatus { order_id: OrderId, expected: SnapshotStatus, actual: SnapshotStatus },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Persistence behaviour for the seller order snapshot and the revenue/product aggregates.
#[allow(async_fn_in_trait)]
pub trait SellerStore: Clone {
    /// Full-overwrite upsert of a snapshot, always resetting the status to `PENDING`. Safe to
    /// replay because nothing is incremented.
    async fn upsert_snapshot(
        &self,
        order_id: &OrderId,
        seller_id: &str,
        items: &[LineItem],
        total: Vnd,
    ) -> Result<OrderSnapshot, SellerStoreError>;

    async fn fetch_snapshot(&self, order_id: &OrderId) -> Result<Option<OrderSnapshot>, SellerStoreError>;

    /// Advance a `PENDING` snapshot to the given status. The guard is part of the UPDATE, so a
    /// lost race or a replay surfaces as `InvalidStatus`/`SnapshotNotFound` instead of a silent
    /// double transition.
    async fn advance_snapshot_status(
        &self,
        order_id: &OrderId,
        to: SnapshotStatus,
    ) -> Result<OrderSnapshot, SellerStoreError>;

    /// Apply one sale event to the aggregates: claim the idempotency key, upsert-increment the
    /// day's revenue row and each item's product row, all in one transaction. Returns `false`
    /// when the key was already claimed (duplicate delivery) and nothing was written.
    async fn record_sale(
        &self,
        event_type: &str,
        dedupe_key: &str,
        seller_id: &str,
        day: NaiveDate,
        total: Vnd,
        items: &[LineItem],
    ) -> Result<bool, SellerStoreError>;

    /// The stored revenue rows for a seller over `[from, to]`, ascending. Missing days are a
    /// read-time concern for the caller.
    async fn fetch_revenue_range(
        &self,
        seller_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyRevenue>, SellerStoreError>;

    /// Lifetime per-product totals for a seller, best sellers first.
    async fn fetch_product_analytics(&self, seller_id: &str) -> Result<Vec<ProductAnalytics>, SellerStoreError>;
}
