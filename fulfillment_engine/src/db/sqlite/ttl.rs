use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::traits::TtlStoreError;

pub async fn set_marker(
    key: &str,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), TtlStoreError> {
    sqlx::query(
        r#"
            INSERT INTO ttl_markers (marker_key, expires_at) VALUES ($1, $2)
            ON CONFLICT (marker_key) DO UPDATE SET expires_at = excluded.expires_at
        "#,
    )
    .bind(key)
    .bind(expires_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn remove_marker(key: &str, conn: &mut SqliteConnection) -> Result<(), TtlStoreError> {
    sqlx::query("DELETE FROM ttl_markers WHERE marker_key = $1").bind(key).execute(conn).await?;
    Ok(())
}

/// Deletes every due marker and returns the claimed keys. The single DELETE..RETURNING makes
/// the claim atomic, so concurrent sweeps partition the due set instead of sharing it.
pub async fn claim_due_markers(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<String>, TtlStoreError> {
    let keys: Vec<(String,)> = sqlx::query_as("DELETE FROM ttl_markers WHERE expires_at <= $1 RETURNING marker_key")
        .bind(now)
        .fetch_all(conn)
        .await?;
    Ok(keys.into_iter().map(|(k,)| k).collect())
}
