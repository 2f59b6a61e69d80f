use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, Utc};
use fulfillment_common::Vnd;
use sqlx::SqlitePool;

use super::{inventory, new_pool, payments, seller, ttl, SqliteDatabaseError};
use crate::{
    api::PaymentQueryFilter,
    db_types::{
        DailyRevenue, InventoryRecord, LineItem, NewPayment, OrderCode, OrderId, OrderSnapshot, Payment,
        ProductAnalytics, SnapshotStatus,
    },
    traits::{
        InsertPaymentResult, InventoryError, InventoryStore, PaymentStore, PaymentStoreError, PaymentTransition,
        SellerStore, SellerStoreError, TtlStore, TtlStoreError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to (and if necessary creates and migrates) the database at `url`.
    pub async fn new(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl PaymentStore for SqliteDatabase {
    async fn insert_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, PaymentStoreError> {
        let mut conn = self.pool.acquire().await.map_err(PaymentStoreError::from)?;
        payments::idempotent_insert(payment, &mut conn).await
    }

    async fn fetch_payment(&self, id: &str) -> Result<Option<Payment>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await.map_err(PaymentStoreError::from)?;
        payments::fetch_payment(id, &mut conn).await
    }

    async fn fetch_active_banking_payment(&self, order_code: OrderCode) -> Result<Option<Payment>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await.map_err(PaymentStoreError::from)?;
        payments::fetch_active_banking_payment(order_code, &mut conn).await
    }

    async fn fetch_payment_by_link_id(&self, payment_link_id: &str) -> Result<Option<Payment>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await.map_err(PaymentStoreError::from)?;
        payments::fetch_payment_by_link_id(payment_link_id, &mut conn).await
    }

    async fn fetch_payment_for_user(
        &self,
        order_code: OrderCode,
        user_id: &str,
    ) -> Result<Option<Payment>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await.map_err(PaymentStoreError::from)?;
        payments::fetch_payment_for_user(order_code, user_id, &mut conn).await
    }

    async fn mark_paid(
        &self,
        id: &str,
        paid_amount: Vnd,
        paid_at: DateTime<Utc>,
    ) -> Result<PaymentTransition, PaymentStoreError> {
        let mut tx = self.pool.begin().await.map_err(PaymentStoreError::from)?;
        let outcome = payments::mark_paid(id, paid_amount, paid_at, &mut tx).await?;
        tx.commit().await.map_err(PaymentStoreError::from)?;
        Ok(outcome)
    }

    async fn mark_failed(&self, id: &str, reason: &str) -> Result<PaymentTransition, PaymentStoreError> {
        let mut tx = self.pool.begin().await.map_err(PaymentStoreError::from)?;
        let outcome = payments::mark_failed(id, reason, &mut tx).await?;
        tx.commit().await.map_err(PaymentStoreError::from)?;
        Ok(outcome)
    }

    async fn fetch_payments(&self, filter: PaymentQueryFilter) -> Result<Vec<Payment>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await.map_err(PaymentStoreError::from)?;
        payments::fetch_payments(filter, &mut conn).await
    }
}

impl InventoryStore for SqliteDatabase {
    async fn ensure_product(
        &self,
        product_id: &str,
        product_name: &str,
        initial_stock: i64,
    ) -> Result<InventoryRecord, InventoryError> {
        let mut conn = self.pool.acquire().await.map_err(InventoryError::from)?;
        inventory::ensure_product(product_id, product_name, initial_stock, &mut conn).await
    }

    async fn fetch_product(&self, product_id: &str) -> Result<Option<InventoryRecord>, InventoryError> {
        let mut conn = self.pool.acquire().await.map_err(InventoryError::from)?;
        inventory::fetch_product(product_id, &mut conn).await
    }

    async fn reserve(&self, order_id: &OrderId, items: &[LineItem]) -> Result<(), InventoryError> {
        let mut tx = self.pool.begin().await.map_err(InventoryError::from)?;
        inventory::reserve(order_id, items, &mut tx).await?;
        tx.commit().await.map_err(InventoryError::from)?;
        Ok(())
    }

    async fn confirm(&self, order_id: &OrderId) -> Result<bool, InventoryError> {
        let mut tx = self.pool.begin().await.map_err(InventoryError::from)?;
        let converted = inventory::confirm(order_id, &mut tx).await?;
        tx.commit().await.map_err(InventoryError::from)?;
        Ok(converted)
    }

    async fn release(&self, order_id: &OrderId) -> Result<bool, InventoryError> {
        let mut tx = self.pool.begin().await.map_err(InventoryError::from)?;
        let released = inventory::release(order_id, &mut tx).await?;
        tx.commit().await.map_err(InventoryError::from)?;
        Ok(released)
    }
}

impl SellerStore for SqliteDatabase {
    async fn upsert_snapshot(
        &self,
        order_id: &OrderId,
        seller_id: &str,
        items: &[LineItem],
        total: Vnd,
    ) -> Result<OrderSnapshot, SellerStoreError> {
        let mut conn = self.pool.acquire().await.map_err(SellerStoreError::from)?;
        seller::upsert_snapshot(order_id, seller_id, items, total, &mut conn).await
    }

    async fn fetch_snapshot(&self, order_id: &OrderId) -> Result<Option<OrderSnapshot>, SellerStoreError> {
        let mut conn = self.pool.acquire().await.map_err(SellerStoreError::from)?;
        seller::fetch_snapshot(order_id, &mut conn).await
    }

    async fn advance_snapshot_status(
        &self,
        order_id: &OrderId,
        to: SnapshotStatus,
    ) -> Result<OrderSnapshot, SellerStoreError> {
        let mut tx = self.pool.begin().await.map_err(SellerStoreError::from)?;
        let snapshot = seller::advance_snapshot_status(order_id, to, &mut tx).await?;
        tx.commit().await.map_err(SellerStoreError::from)?;
        Ok(snapshot)
    }

    async fn record_sale(
        &self,
        event_type: &str,
        dedupe_key: &str,
        seller_id: &str,
        day: NaiveDate,
        total: Vnd,
        items: &[LineItem],
    ) -> Result<bool, SellerStoreError> {
        let mut tx = self.pool.begin().await.map_err(SellerStoreError::from)?;
        let applied = seller::record_sale(event_type, dedupe_key, seller_id, day, total, items, &mut tx).await?;
        tx.commit().await.map_err(SellerStoreError::from)?;
        Ok(applied)
    }

    async fn fetch_revenue_range(
        &self,
        seller_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyRevenue>, SellerStoreError> {
        let mut conn = self.pool.acquire().await.map_err(SellerStoreError::from)?;
        seller::fetch_revenue_range(seller_id, from, to, &mut conn).await
    }

    async fn fetch_product_analytics(&self, seller_id: &str) -> Result<Vec<ProductAnalytics>, SellerStoreError> {
        let mut conn = self.pool.acquire().await.map_err(SellerStoreError::from)?;
        seller::fetch_product_analytics(seller_id, &mut conn).await
    }
}

impl TtlStore for SqliteDatabase {
    async fn set_marker(&self, key: &str, expires_at: DateTime<Utc>) -> Result<(), TtlStoreError> {
        let mut conn = self.pool.acquire().await.map_err(TtlStoreError::from)?;
        ttl::set_marker(key, expires_at, &mut conn).await
    }

    async fn remove_marker(&self, key: &str) -> Result<(), TtlStoreError> {
        let mut conn = self.pool.acquire().await.map_err(TtlStoreError::from)?;
        ttl::remove_marker(key, &mut conn).await
    }

    async fn claim_due_markers(&self, now: DateTime<Utc>) -> Result<Vec<String>, TtlStoreError> {
        let mut conn = self.pool.acquire().await.map_err(TtlStoreError::from)?;
        ttl::claim_due_markers(now, &mut conn).await
    }
}
