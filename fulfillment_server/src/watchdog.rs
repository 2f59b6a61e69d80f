use chrono::Utc;
use fulfillment_engine::{
    events::EventProducers,
    payment_id_from_marker,
    traits::{CheckoutProvider, TtlStore},
    PaymentFlowApi,
    SqliteDatabase,
};
use log::*;
use tokio::task::JoinHandle;

/// Starts the payment-expiry watchdog. Do not await the returned JoinHandle, as it will run
/// indefinitely.
///
/// Each sweep claims every due expiry marker (the claim deletes the row, so two sweeps never see
/// the same marker) and fails the corresponding payment. A payment that settled before its timer
/// fired is left untouched by [`PaymentFlowApi::handle_timeout`]. Markers from an unrecognised
/// namespace are claimed and dropped with a warning.
pub fn start_expiry_watchdog<G: CheckoutProvider + 'static>(
    db: SqliteDatabase,
    gateway: G,
    ttl_seconds: i64,
    interval_seconds: u64,
    producers: EventProducers,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(interval_seconds));
        let api = PaymentFlowApi::new(db.clone(), gateway, ttl_seconds, producers);
        info!("🕰️ Payment expiry watchdog started (sweep every {interval_seconds}s)");
        loop {
            timer.tick().await;
            trace!("🕰️ Sweeping for lapsed settlement windows");
            let keys = match db.claim_due_markers(Utc::now()).await {
                Ok(keys) => keys,
                Err(e) => {
                    error!("🕰️ Could not claim due expiry markers: {e}");
                    continue;
                },
            };
            if keys.is_empty() {
                continue;
            }
            info!("🕰️ {} settlement window(s) lapsed", keys.len());
            for key in keys {
                let Some(payment_id) = payment_id_from_marker(&key) else {
                    warn!("🕰️ Claimed a marker from an unknown namespace: {key}");
                    continue;
                };
                if let Err(e) = api.handle_timeout(payment_id).await {
                    error!("🕰️ Could not expire payment {payment_id}: {e}");
                }
            }
        }
    })
}
