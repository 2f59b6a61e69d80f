use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TtlStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// A durable distributed timer: a marker is a key whose only purpose is to lapse. The watchdog
/// claims due markers (each exactly once, the claim deletes the row) and dispatches on the key
/// namespace. Because the markers are ordinary rows, pending timers survive process restarts.
#[allow(async_fn_in_trait)]
pub trait TtlStore: Clone {
    /// Upsert a marker. Re-arming an existing key replaces its deadline.
    async fn set_marker(&self, key: &str, expires_at: DateTime<Utc>) -> Result<(), TtlStoreError>;

    /// Drop a marker before it lapses (e.g. the payment settled). Unknown keys are fine.
    async fn remove_marker(&self, key: &str) -> Result<(), TtlStoreError>;

    /// Claim every marker due at `now`: the rows are deleted and their keys returned. Two
    /// concurrent sweeps never claim the same key.
    async fn claim_due_markers(&self, now: DateTime<Utc>) -> Result<Vec<String>, TtlStoreError>;
}
