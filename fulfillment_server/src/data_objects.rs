use std::fmt::Display;

use fulfillment_common::Vnd;
use fulfillment_engine::{db_types::OrderId, RevenuePeriod};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The product-created notification from the catalogue service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreatedNotification {
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub stock: i64,
}

/// The cancellation-approved notification from the order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelApprovedNotification {
    pub order_id: OrderId,
}

/// Body of the customer-initiated request for a (new or existing) hosted checkout link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankingPaymentRequest {
    pub order_ids: Vec<OrderId>,
    pub order_code: i64,
    pub total: Vnd,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevenueQuery {
    #[serde(default = "default_period")]
    pub period: RevenuePeriod,
}

fn default_period() -> RevenuePeriod {
    RevenuePeriod::Week
}
