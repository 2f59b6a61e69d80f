use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use fulfillment_common::Vnd;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {0}: {1}")]
pub struct ConversionError(&'static str, String);

//--------------------------------------        OrderId        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       OrderCode       -------------------------------------------------------
/// The human-facing numeric batch identifier for a checkout. One order code may cover several
/// orders placed together, and is the idempotency key for payment creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderCode(pub i64);

impl From<i64> for OrderCode {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderCode {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The compacted code registered with the payment gateway, which caps numeric identifiers
    /// well below what the platform issues.
    pub fn gateway_code(&self) -> i64 {
        self.0 / 1000
    }
}

//--------------------------------------     PaymentMethod     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Cash on delivery. Settled out of band; the payment record exists for bookkeeping only.
    Cod,
    /// Hosted bank checkout through the payment gateway.
    Banking,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cod => write!(f, "COD"),
            PaymentMethod::Banking => write!(f, "BANKING"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(Self::Cod),
            "BANKING" => Ok(Self::Banking),
            other => Err(ConversionError("payment method", other.to_string())),
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//--------------------------------------     PaymentStatus     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// A checkout link exists and the window has not lapsed.
    Pending,
    /// Settled. Reached exactly once; replays are no-ops.
    Paid,
    /// Terminal failure: gateway decline, explicit failure webhook, or window expiry.
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Paid => write!(f, "PAID"),
            PaymentStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            other => Err(ConversionError("payment status", other.to_string())),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//--------------------------------------       LineItem        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub quantity: i64,
    pub price: Vnd,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> Vnd {
        self.price * self.quantity
    }
}

//--------------------------------------        Payment        -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub order_ids: Json<Vec<OrderId>>,
    pub order_code: OrderCode,
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    pub total: Vnd,
    pub paid_amount: Vnd,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub qr_code: Option<String>,
    pub checkout_url: Option<String>,
    pub payment_link_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewPayment       -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: String,
    pub user_id: String,
    pub order_ids: Vec<OrderId>,
    pub order_code: OrderCode,
    pub method: PaymentMethod,
    pub total: Vnd,
    pub paid_amount: Vnd,
    pub status: PaymentStatus,
    pub qr_code: Option<String>,
    pub checkout_url: Option<String>,
    pub payment_link_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

impl NewPayment {
    /// A fresh record id. Ids are opaque; only uniqueness matters.
    pub fn fresh_id() -> String {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let suffix: u64 = rng.gen();
        format!("pay_{suffix:016x}")
    }

    pub fn new(user_id: &str, order_ids: Vec<OrderId>, order_code: OrderCode, method: PaymentMethod, total: Vnd) -> Self {
        Self {
            id: Self::fresh_id(),
            user_id: user_id.to_string(),
            order_ids,
            order_code,
            method,
            total,
            paid_amount: Vnd::default(),
            status: PaymentStatus::Pending,
            qr_code: None,
            checkout_url: None,
            payment_link_id: None,
            expires_at: None,
            failure_reason: None,
        }
    }
}

//--------------------------------------     StockStatus       -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    pub fn for_available(available: i64) -> Self {
        if available > 0 {
            Self::InStock
        } else {
            Self::OutOfStock
        }
    }
}

impl Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "IN_STOCK"),
            StockStatus::OutOfStock => write!(f, "OUT_OF_STOCK"),
        }
    }
}

impl FromStr for StockStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_STOCK" => Ok(Self::InStock),
            "OUT_OF_STOCK" => Ok(Self::OutOfStock),
            other => Err(ConversionError("stock status", other.to_string())),
        }
    }
}

impl TryFrom<String> for StockStatus {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//--------------------------------------   InventoryRecord     -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryRecord {
    pub product_id: String,
    pub product_name: String,
    pub available: i64,
    pub reserved: i64,
    pub sold: i64,
    #[sqlx(try_from = "String")]
    pub status: StockStatus,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------  ReservationState     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationState {
    Reserved,
    Confirmed,
    Released,
}

impl Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationState::Reserved => write!(f, "RESERVED"),
            ReservationState::Confirmed => write!(f, "CONFIRMED"),
            ReservationState::Released => write!(f, "RELEASED"),
        }
    }
}

impl FromStr for ReservationState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESERVED" => Ok(Self::Reserved),
            "CONFIRMED" => Ok(Self::Confirmed),
            "RELEASED" => Ok(Self::Released),
            other => Err(ConversionError("reservation state", other.to_string())),
        }
    }
}

impl TryFrom<String> for ReservationState {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StockReservation {
    pub order_id: OrderId,
    pub product_id: String,
    pub quantity: i64,
    #[sqlx(try_from = "String")]
    pub state: ReservationState,
}

//--------------------------------------    SnapshotStatus     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SnapshotStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl Display for SnapshotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotStatus::Pending => write!(f, "PENDING"),
            SnapshotStatus::Confirmed => write!(f, "CONFIRMED"),
            SnapshotStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for SnapshotStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(ConversionError("snapshot status", other.to_string())),
        }
    }
}

impl TryFrom<String> for SnapshotStatus {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//--------------------------------------     OrderSnapshot     -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderSnapshot {
    pub order_id: OrderId,
    pub seller_id: String,
    pub items: Json<Vec<LineItem>>,
    pub total: Vnd,
    #[sqlx(try_from = "String")]
    pub status: SnapshotStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     DailyRevenue      -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct DailyRevenue {
    pub seller_id: String,
    pub day: NaiveDate,
    pub total_revenue: Vnd,
    pub total_orders: i64,
}

impl DailyRevenue {
    pub fn zero(seller_id: &str, day: NaiveDate) -> Self {
        Self { seller_id: seller_id.to_string(), day, total_revenue: Vnd::default(), total_orders: 0 }
    }
}

//--------------------------------------   ProductAnalytics    -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ProductAnalytics {
    pub seller_id: String,
    pub product_id: String,
    pub product_name: String,
    pub total_sold: i64,
    pub total_revenue: Vnd,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gateway_code_is_floor_division() {
        assert_eq!(OrderCode(500_123_456).gateway_code(), 500_123);
        assert_eq!(OrderCode(999).gateway_code(), 0);
    }

    #[test]
    fn enum_string_roundtrips() {
        for status in ["PENDING", "PAID", "FAILED"] {
            assert_eq!(status.parse::<PaymentStatus>().unwrap().to_string(), status);
        }
        assert!("SETTLED".parse::<PaymentStatus>().is_err());
        assert_eq!("COD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cod);
        assert_eq!("BANKING".parse::<PaymentMethod>().unwrap(), PaymentMethod::Banking);
        assert_eq!("CANCELLED".parse::<SnapshotStatus>().unwrap(), SnapshotStatus::Cancelled);
    }

    #[test]
    fn line_totals() {
        let item =
            LineItem { product_id: "p1".into(), quantity: 3, price: Vnd::from(50_000), product_name: None };
        assert_eq!(item.line_total(), Vnd::from(150_000));
    }
}
