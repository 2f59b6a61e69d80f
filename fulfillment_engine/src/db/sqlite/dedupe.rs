use sqlx::SqliteConnection;

use crate::traits::SellerStoreError;

/// Claims an idempotency key. Returns `true` exactly once per `(event_type, dedupe_key)` pair;
/// every later claim sees the existing row and gets `false`. Run this inside the same
/// transaction as the effects it guards, so a failed apply releases the claim with the rollback.
pub async fn try_claim(
    event_type: &str,
    dedupe_key: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, SellerStoreError> {
    let result = sqlx::query("INSERT OR IGNORE INTO processed_events (event_type, dedupe_key) VALUES ($1, $2)")
        .bind(event_type)
        .bind(dedupe_key)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}
