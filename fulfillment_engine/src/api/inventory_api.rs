use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{InventoryRecord, OrderId},
    events::OrderCreatedEvent,
    traits::{InventoryError, InventoryStore},
};

/// `InventoryApi` keeps the stock ledger honest: every mutation moves quantity between the
/// available, reserved and sold columns, never creating or destroying stock.
pub struct InventoryApi<B> {
    db: B,
}

impl<B> Debug for InventoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InventoryApi")
    }
}

impl<B> InventoryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> InventoryApi<B>
where B: InventoryStore
{
    /// Lazily registers a product in the ledger. Replaying a product-created event returns the
    /// existing row untouched.
    pub async fn ensure_product(
        &self,
        product_id: &str,
        product_name: &str,
        initial_stock: i64,
    ) -> Result<InventoryRecord, InventoryError> {
        let record = self.db.ensure_product(product_id, product_name, initial_stock).await?;
        debug!("📦️ Product {product_id} present in the ledger with {} available", record.available);
        Ok(record)
    }

    pub async fn fetch_product(&self, product_id: &str) -> Result<Option<InventoryRecord>, InventoryError> {
        self.db.fetch_product(product_id).await
    }

    /// Reserves stock for every order in a created checkout group. Each order's lines move
    /// available→reserved in one transaction; the first order that cannot be covered aborts the
    /// whole call and the error propagates to the originator.
    pub async fn reserve_stock(&self, event: &OrderCreatedEvent) -> Result<(), InventoryError> {
        for order in &event.orders {
            self.db.reserve(&order.order_id, &order.items).await?;
            debug!("📦️ Stock reserved for order {} ({} lines)", order.order_id, order.items.len());
        }
        Ok(())
    }

    /// Converts an order's reservations into sold stock. Replays report themselves as `false`
    /// and change nothing.
    pub async fn confirm_stock(&self, order_id: &OrderId) -> Result<bool, InventoryError> {
        let converted = self.db.confirm(order_id).await?;
        if converted {
            info!("📦️ Reservations for order {order_id} converted to sales");
        } else {
            debug!("📦️ Order {order_id} holds no live reservations to confirm. Replay ignored.");
        }
        Ok(converted)
    }

    /// Returns an order's reserved stock to the shelf. Used for cancellations and as the
    /// compensating action when the order group's payment fails.
    pub async fn release_stock(&self, order_id: &OrderId) -> Result<bool, InventoryError> {
        let released = self.db.release(order_id).await?;
        if released {
            info!("📦️ Reservations for order {order_id} released back to available stock");
        } else {
            debug!("📦️ Order {order_id} holds no live reservations to release. Replay ignored.");
        }
        Ok(released)
    }
}
