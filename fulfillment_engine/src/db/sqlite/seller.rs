use chrono::NaiveDate;
use fulfillment_common::Vnd;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::dedupe,
    db_types::{DailyRevenue, LineItem, OrderId, OrderSnapshot, ProductAnalytics, SnapshotStatus},
    traits::SellerStoreError,
};

/// Full-overwrite upsert of a snapshot. A replayed order-created event rewrites the same values
/// and resets the status to `PENDING`; nothing is incremented, so replays are harmless.
pub async fn upsert_snapshot(
    order_id: &OrderId,
    seller_id: &str,
    items: &[LineItem],
    total: Vnd,
    conn: &mut SqliteConnection,
) -> Result<OrderSnapshot, SellerStoreError> {
    let items = serde_json::to_string(items)?;
    sqlx::query(
        r#"
            INSERT INTO order_snapshots (order_id, seller_id, items, total, status)
            VALUES ($1, $2, $3, $4, 'PENDING')
            ON CONFLICT (order_id) DO UPDATE SET
                seller_id = excluded.seller_id,
                items = excluded.items,
                total = excluded.total,
                status = 'PENDING',
                updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(order_id)
    .bind(seller_id)
    .bind(items)
    .bind(total)
    .execute(&mut *conn)
    .await?;
    fetch_snapshot(order_id, conn).await?.ok_or_else(|| SellerStoreError::SnapshotNotFound(order_id.clone()))
}

pub async fn fetch_snapshot(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderSnapshot>, SellerStoreError> {
    let snapshot = sqlx::query_as::<_, OrderSnapshot>("SELECT * FROM order_snapshots WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(snapshot)
}

/// Advances a `PENDING` snapshot. The guard is part of the UPDATE, so a replay or a lost race
/// comes back as `InvalidStatus` rather than silently transitioning twice.
pub async fn advance_snapshot_status(
    order_id: &OrderId,
    to: SnapshotStatus,
    conn: &mut SqliteConnection,
) -> Result<OrderSnapshot, SellerStoreError> {
    let result = sqlx::query(
        r#"
            UPDATE order_snapshots SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $2 AND status = 'PENDING'
        "#,
    )
    .bind(to.to_string())
    .bind(order_id)
    .execute(&mut *conn)
    .await?;
    let snapshot =
        fetch_snapshot(order_id, conn).await?.ok_or_else(|| SellerStoreError::SnapshotNotFound(order_id.clone()))?;
    if result.rows_affected() == 0 {
        return Err(SellerStoreError::InvalidStatus {
            order_id: order_id.clone(),
            expected: SnapshotStatus::Pending,
            actual: snapshot.status,
        });
    }
    debug!("🗃️ Order {order_id} snapshot moved to {to}");
    Ok(snapshot)
}

/// Applies one sale to the aggregates. The idempotency claim and the increments share the
/// caller's transaction; a duplicate key means the event was already applied and `false` is
/// returned with nothing written.
pub async fn record_sale(
    event_type: &str,
    dedupe_key: &str,
    seller_id: &str,
    day: NaiveDate,
    total: Vnd,
    items: &[LineItem],
    conn: &mut SqliteConnection,
) -> Result<bool, SellerStoreError> {
    if !dedupe::try_claim(event_type, dedupe_key, conn).await? {
        debug!("🗃️ {event_type}:{dedupe_key} has already been applied to the aggregates. Skipping.");
        return Ok(false);
    }
    sqlx::query(
        r#"
            INSERT INTO daily_revenue (seller_id, day, total_revenue, total_orders)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (seller_id, day) DO UPDATE SET
                total_revenue = daily_revenue.total_revenue + excluded.total_revenue,
                total_orders = daily_revenue.total_orders + 1
        "#,
    )
    .bind(seller_id)
    .bind(day)
    .bind(total)
    .execute(&mut *conn)
    .await?;
    for item in items {
        sqlx::query(
            r#"
                INSERT INTO product_analytics (seller_id, product_id, product_name, total_sold, total_revenue)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (seller_id, product_id) DO UPDATE SET
                    total_sold = product_analytics.total_sold + excluded.total_sold,
                    total_revenue = product_analytics.total_revenue + excluded.total_revenue,
                    product_name = CASE
                        WHEN excluded.product_name != '' THEN excluded.product_name
                        ELSE product_analytics.product_name
                    END
            "#,
        )
        .bind(seller_id)
        .bind(&item.product_id)
        .bind(item.product_name.clone().unwrap_or_default())
        .bind(item.quantity)
        .bind(item.line_total())
        .execute(&mut *conn)
        .await?;
    }
    Ok(true)
}

/// The stored revenue rows for `[from, to]`, ascending. Zero-filling absent days is the
/// caller's concern.
pub async fn fetch_revenue_range(
    seller_id: &str,
    from: NaiveDate,
    to: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<Vec<DailyRevenue>, SellerStoreError> {
    let rows = sqlx::query_as::<_, DailyRevenue>(
        r#"
            SELECT * FROM daily_revenue
            WHERE seller_id = $1 AND day >= $2 AND day <= $3
            ORDER BY day ASC
        "#,
    )
    .bind(seller_id)
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Lifetime per-product totals for a seller, best sellers first.
pub async fn fetch_product_analytics(
    seller_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<ProductAnalytics>, SellerStoreError> {
    let rows = sqlx::query_as::<_, ProductAnalytics>(
        r#"
            SELECT * FROM product_analytics
            WHERE seller_id = $1
            ORDER BY total_sold DESC, product_id ASC
        "#,
    )
    .bind(seller_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
