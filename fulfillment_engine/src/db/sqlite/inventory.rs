use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{InventoryRecord, LineItem, OrderId, ReservationState, StockReservation},
    traits::InventoryError,
};

/// Lazily creates a ledger row for a product. An existing row is returned untouched, whatever
/// its counters say.
pub async fn ensure_product(
    product_id: &str,
    product_name: &str,
    initial_stock: i64,
    conn: &mut SqliteConnection,
) -> Result<InventoryRecord, InventoryError> {
    let status = if initial_stock > 0 { "IN_STOCK" } else { "OUT_OF_STOCK" };
    let result = sqlx::query(
        r#"
            INSERT OR IGNORE INTO inventory (product_id, product_name, available, status)
            VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(product_id)
    .bind(product_name)
    .bind(initial_stock)
    .bind(status)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 1 {
        debug!("🗃️ Product {product_id} added to the inventory ledger with {initial_stock} units");
    }
    fetch_product(product_id, conn).await?.ok_or_else(|| InventoryError::ProductNotFound(product_id.to_string()))
}

pub async fn fetch_product(
    product_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<InventoryRecord>, InventoryError> {
    let record = sqlx::query_as::<_, InventoryRecord>("SELECT * FROM inventory WHERE product_id = $1")
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

pub async fn fetch_reservations(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<StockReservation>, InventoryError> {
    let rows = sqlx::query_as::<_, StockReservation>("SELECT * FROM stock_reservations WHERE order_id = $1")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Moves each line's quantity from available to reserved and records the reservation rows.
/// Must run inside a transaction: the first line that cannot be covered aborts the whole batch.
/// If the order already holds reservations the call is a replay and nothing changes.
pub async fn reserve(
    order_id: &OrderId,
    items: &[LineItem],
    conn: &mut SqliteConnection,
) -> Result<(), InventoryError> {
    if !fetch_reservations(order_id, conn).await?.is_empty() {
        debug!("🗃️ Order {order_id} already holds reservations. Replay ignored.");
        return Ok(());
    }
    for item in items {
        let result = sqlx::query(
            r#"
                UPDATE inventory SET
                    available = available - $1,
                    reserved = reserved + $1,
                    status = CASE WHEN available - $1 > 0 THEN 'IN_STOCK' ELSE 'OUT_OF_STOCK' END,
                    updated_at = CURRENT_TIMESTAMP
                WHERE product_id = $2 AND available >= $1
            "#,
        )
        .bind(item.quantity)
        .bind(&item.product_id)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 0 {
            return match fetch_product(&item.product_id, conn).await? {
                None => Err(InventoryError::ProductNotFound(item.product_id.clone())),
                Some(record) => Err(InventoryError::InsufficientStock {
                    product_id: item.product_id.clone(),
                    requested: item.quantity,
                    available: record.available,
                }),
            };
        }
        sqlx::query("INSERT INTO stock_reservations (order_id, product_id, quantity) VALUES ($1, $2, $3)")
            .bind(order_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Converts an order's `RESERVED` lines into sold stock. Returns `false` when there is nothing
/// to convert, which is how a replayed confirmation reports itself.
pub async fn confirm(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, InventoryError> {
    settle_reservations(order_id, ReservationState::Confirmed, conn).await
}

/// Returns an order's `RESERVED` lines to available stock. Same replay semantics as [`confirm`].
pub async fn release(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, InventoryError> {
    settle_reservations(order_id, ReservationState::Released, conn).await
}

async fn settle_reservations(
    order_id: &OrderId,
    to: ReservationState,
    conn: &mut SqliteConnection,
) -> Result<bool, InventoryError> {
    let lines = fetch_reservations(order_id, conn).await?;
    let lines: Vec<_> = lines.into_iter().filter(|r| r.state == ReservationState::Reserved).collect();
    if lines.is_empty() {
        return Ok(false);
    }
    for line in &lines {
        let update = match to {
            ReservationState::Confirmed => {
                r#"
                    UPDATE inventory SET
                        reserved = reserved - $1,
                        sold = sold + $1,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE product_id = $2
                "#
            },
            _ => {
                r#"
                    UPDATE inventory SET
                        reserved = reserved - $1,
                        available = available + $1,
                        status = CASE WHEN available + $1 > 0 THEN 'IN_STOCK' ELSE 'OUT_OF_STOCK' END,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE product_id = $2
                "#
            },
        };
        sqlx::query(update).bind(line.quantity).bind(&line.product_id).execute(&mut *conn).await?;
        sqlx::query(
            r#"
                UPDATE stock_reservations SET state = $1, updated_at = CURRENT_TIMESTAMP
                WHERE order_id = $2 AND product_id = $3
            "#,
        )
        .bind(to.to_string())
        .bind(order_id)
        .bind(&line.product_id)
        .execute(&mut *conn)
        .await?;
    }
    debug!("🗃️ {} reservation lines for order {order_id} moved to {to}", lines.len());
    Ok(true)
}
