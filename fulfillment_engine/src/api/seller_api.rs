use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    api::payment_objects::{RevenuePeriod, RevenueSeries},
    db_types::{DailyRevenue, OrderId, OrderSnapshot, ProductAnalytics, SnapshotStatus},
    events::{DeliverySuccessEvent, EventProducers, OrderCancelledEvent, OrderConfirmedEvent, OrderCreatedEvent},
    traits::{SellerStore, SellerStoreError},
};

/// `SellerApi` maintains the seller-facing order snapshots and the revenue/product aggregates,
/// and owns the confirm/reject decision surface.
pub struct SellerApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for SellerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SellerApi")
    }
}

impl<B> SellerApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> SellerApi<B>
where B: SellerStore
{
    /// Mirrors each created order into the seller's snapshot store. The upsert overwrites the
    /// whole row and resets the status to `PENDING`, so replays converge on the same state.
    pub async fn sync_order_from_event(&self, event: &OrderCreatedEvent) -> Result<(), SellerStoreError> {
        for order in &event.orders {
            self.db.upsert_snapshot(&order.order_id, &event.seller_id, &order.items, order.total).await?;
            debug!("🛒️ Snapshot for order {} synced for seller {}", order.order_id, event.seller_id);
        }
        Ok(())
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<OrderSnapshot>, SellerStoreError> {
        self.db.fetch_snapshot(order_id).await
    }

    /// The seller accepts a `PENDING` order. Emits one `order.confirmed` carrying the
    /// snapshot's normalized line items. Confirming twice is an `InvalidStatus` error.
    pub async fn confirm_order(&self, order_id: &OrderId) -> Result<OrderSnapshot, SellerStoreError> {
        let snapshot = self.db.advance_snapshot_status(order_id, SnapshotStatus::Confirmed).await?;
        info!("🛒️ Order {order_id} confirmed by seller {}", snapshot.seller_id);
        let event = OrderConfirmedEvent {
            order_id: snapshot.order_id.clone(),
            seller_id: snapshot.seller_id.clone(),
            total: snapshot.total,
            items: snapshot.items.0.clone(),
            confirmed_at: Utc::now(),
        };
        for emitter in &self.producers.order_confirmed {
            debug!("🛒️ Notifying order confirmed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
        Ok(snapshot)
    }

    /// The seller rejects a `PENDING` order. Emits one `order.cancelled` so the stock
    /// reservations can be returned. Rejecting a non-pending order is an `InvalidStatus` error.
    pub async fn reject_order(&self, order_id: &OrderId) -> Result<OrderSnapshot, SellerStoreError> {
        let snapshot = self.db.advance_snapshot_status(order_id, SnapshotStatus::Cancelled).await?;
        info!("🛒️ Order {order_id} rejected by seller {}", snapshot.seller_id);
        let event = OrderCancelledEvent { order_id: snapshot.order_id.clone(), total: snapshot.total };
        for emitter in &self.producers.order_cancelled {
            debug!("🛒️ Notifying order cancelled hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
        Ok(snapshot)
    }

    /// Folds a confirmed order into the aggregates for its UTC calendar day. Returns `false`
    /// when the event was already applied.
    pub async fn record_confirmed(&self, event: &OrderConfirmedEvent) -> Result<bool, SellerStoreError> {
        let day = event.confirmed_at.date_naive();
        let applied = self
            .db
            .record_sale("order.confirmed", event.order_id.as_str(), &event.seller_id, day, event.total, &event.items)
            .await?;
        if applied {
            info!("🛒️ Aggregates updated for confirmed order {} on {day}", event.order_id);
        }
        Ok(applied)
    }

    /// Folds a successful delivery into the aggregates. Same replay semantics as
    /// [`Self::record_confirmed`]; a redelivered event is a no-op, not a double count.
    pub async fn record_delivery(&self, event: &DeliverySuccessEvent) -> Result<bool, SellerStoreError> {
        let day = event.delivered_at.date_naive();
        let applied = self
            .db
            .record_sale("delivery.success", event.order_id.as_str(), &event.seller_id, day, event.total, &event.items)
            .await?;
        if applied {
            info!("🛒️ Aggregates updated for delivered order {} on {day}", event.order_id);
        }
        Ok(applied)
    }

    /// The revenue series for the trailing window, one row per calendar day including today.
    /// Days with no sales are backfilled with zero rows at read time.
    pub async fn revenue_series(
        &self,
        seller_id: &str,
        period: RevenuePeriod,
    ) -> Result<RevenueSeries, SellerStoreError> {
        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(period.days() - 1);
        let stored = self.db.fetch_revenue_range(seller_id, from, to).await?;
        let mut days = Vec::with_capacity(period.days() as usize);
        let mut stored = stored.into_iter().peekable();
        let mut day = from;
        while day <= to {
            match stored.peek() {
                Some(row) if row.day == day => {
                    days.push(stored.next().ok_or_else(|| {
                        SellerStoreError::DatabaseError("revenue row vanished while iterating".into())
                    })?);
                },
                _ => days.push(DailyRevenue::zero(seller_id, day)),
            }
            day += chrono::Duration::days(1);
        }
        Ok(RevenueSeries { seller_id: seller_id.to_string(), period, days })
    }

    pub async fn product_analytics(&self, seller_id: &str) -> Result<Vec<ProductAnalytics>, SellerStoreError> {
        self.db.fetch_product_analytics(seller_id).await
    }
}
