use chrono::{DateTime, Utc};
use fulfillment_common::Vnd;
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderCode, Payment, PaymentMethod, PaymentStatus};

//--------------------------------------  PaymentQueryFilter   -------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentQueryFilter {
    pub user_id: Option<String>,
    pub order_code: Option<OrderCode>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
}

impl PaymentQueryFilter {
    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_order_code(mut self, order_code: OrderCode) -> Self {
        self.order_code = Some(order_code);
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.order_code.is_none() && self.method.is_none() && self.status.is_none()
    }
}

//--------------------------------------    CheckoutStatus     -------------------------------------------------------
/// The identity-scoped projection of a payment that backs the checkout-status poll.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutStatus {
    pub payment_id: String,
    pub order_code: OrderCode,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub total: Vnd,
    pub paid_amount: Vnd,
    pub qr_code: Option<String>,
    pub checkout_url: Option<String>,
    /// Whole seconds until the checkout link lapses; clamped at zero once the window has passed
    /// or when there is no window at all.
    pub expires_in: i64,
}

impl CheckoutStatus {
    pub fn from_payment(payment: &Payment, now: DateTime<Utc>) -> Self {
        let expires_in = match (payment.status, payment.expires_at) {
            (PaymentStatus::Pending, Some(expires_at)) => (expires_at - now).num_seconds().max(0),
            _ => 0,
        };
        Self {
            payment_id: payment.id.clone(),
            order_code: payment.order_code,
            method: payment.method,
            status: payment.status,
            total: payment.total,
            paid_amount: payment.paid_amount,
            qr_code: payment.qr_code.clone(),
            checkout_url: payment.checkout_url.clone(),
            expires_in,
        }
    }
}

//--------------------------------------    GatewayCallback    -------------------------------------------------------
/// A signature-verified gateway webhook, reduced to the fields the orchestrator acts on. The
/// transport layer owns envelope parsing and signature checks; by the time this struct exists
/// the payload is trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCallback {
    pub payment_link_id: String,
    pub code: String,
    pub amount: i64,
    pub desc: String,
}

impl GatewayCallback {
    pub fn is_success(&self) -> bool {
        self.code == "00"
    }
}

//--------------------------------------     RevenuePeriod     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RevenuePeriod {
    Week,
    Month,
}

impl RevenuePeriod {
    /// The number of calendar days in the window, counting today.
    pub fn days(&self) -> i64 {
        match self {
            RevenuePeriod::Week => 7,
            RevenuePeriod::Month => 30,
        }
    }
}

//--------------------------------------     RevenueSeries     -------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct RevenueSeries {
    pub seller_id: String,
    pub period: RevenuePeriod,
    pub days: Vec<crate::db_types::DailyRevenue>,
}
