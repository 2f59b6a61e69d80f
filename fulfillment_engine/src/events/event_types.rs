use chrono::{DateTime, Utc};
use fulfillment_common::Vnd;
use serde::{Deserialize, Serialize};

use crate::db_types::{LineItem, OrderCode, OrderId, PaymentMethod};

//--------------------------------------    order.created      -------------------------------------------------------
/// One order inside a checkout group, with its own line items so that downstream consumers can
/// key their idempotent work by `order_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub total: Vnd,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order_code: OrderCode,
    pub user_id: String,
    pub seller_id: String,
    pub payment_method: PaymentMethod,
    pub total: Vnd,
    pub orders: Vec<CreatedOrder>,
    pub created_at: DateTime<Utc>,
}

impl OrderCreatedEvent {
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.orders.iter().map(|o| o.order_id.clone()).collect()
    }
}

//--------------------------------------   order.confirmed     -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmedEvent {
    pub order_id: OrderId,
    pub seller_id: String,
    pub total: Vnd,
    pub items: Vec<LineItem>,
    pub confirmed_at: DateTime<Utc>,
}

//--------------------------------------   order.cancelled     -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order_id: OrderId,
    pub total: Vnd,
}

//-------------------------------------- order.delivery.success ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySuccessEvent {
    pub order_id: OrderId,
    pub seller_id: String,
    pub total: Vnd,
    pub items: Vec<LineItem>,
    pub delivered_at: DateTime<Utc>,
}

//--------------------------------------  payment.qr.created   -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQrCreatedEvent {
    pub user_id: String,
    pub order_code: OrderCode,
    pub qr_code: String,
    pub checkout_url: String,
    /// Seconds until the checkout link lapses.
    pub expires_in: i64,
}

//--------------------------------------   payment.success     -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSuccessEvent {
    pub payment_id: String,
    pub user_id: String,
    pub order_ids: Vec<OrderId>,
    pub order_code: OrderCode,
    pub method: PaymentMethod,
    pub total: Vnd,
    /// The amount the gateway actually settled. May legitimately differ from `total` and is
    /// forwarded as received, never recomputed.
    pub paid_amount: Vnd,
}

//--------------------------------------    payment.failed     -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailedEvent {
    pub payment_id: String,
    pub user_id: String,
    pub order_code: OrderCode,
    /// Orders covered by the failed payment, so the compensating stock release can be wired.
    pub order_ids: Vec<OrderId>,
    pub reason: String,
}
