use chrono::{DateTime, Utc};
use fulfillment_common::Vnd;
use thiserror::Error;

use crate::{
    api::PaymentQueryFilter,
    db_types::{NewPayment, OrderCode, Payment},
};

#[derive(Debug, Clone)]
pub enum InsertPaymentResult {
    Inserted(Payment),
    /// A non-terminal payment already exists for the same order code; the surviving record is
    /// returned unchanged.
    AlreadyExists(Payment),
}

/// The outcome of a guarded state transition on a payment record.
#[derive(Debug, Clone)]
pub enum PaymentTransition {
    /// The transition was applied; the updated record is returned.
    Applied(Payment),
    /// The record was already terminal. The record as it stands is returned so the caller can
    /// decide whether the replay is benign (PAID webhook twice) or noteworthy.
    AlreadyTerminal(Payment),
    NotFound,
}

#[derive(Debug, Clone, Error)]
pub enum PaymentStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Persistence behaviour for the payment orchestrator.
#[allow(async_fn_in_trait)]
pub trait PaymentStore: Clone {
    /// Insert a payment record. For BANKING payments, a unique index on `(order_code)` for
    /// non-terminal records turns a concurrent duplicate into `AlreadyExists`.
    async fn insert_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, PaymentStoreError>;

    async fn fetch_payment(&self, id: &str) -> Result<Option<Payment>, PaymentStoreError>;

    /// The non-failed BANKING payment for this order code, if any. `Failed` records are ignored
    /// so a fresh checkout can follow a terminal failure.
    async fn fetch_active_banking_payment(&self, order_code: OrderCode) -> Result<Option<Payment>, PaymentStoreError>;

    async fn fetch_payment_by_link_id(&self, payment_link_id: &str) -> Result<Option<Payment>, PaymentStoreError>;

    /// Identity-scoped lookup backing the checkout-status poll.
    async fn fetch_payment_for_user(
        &self,
        order_code: OrderCode,
        user_id: &str,
    ) -> Result<Option<Payment>, PaymentStoreError>;

    /// `PENDING → PAID` exactly once. Replays land on `AlreadyTerminal`.
    async fn mark_paid(&self, id: &str, paid_amount: Vnd, paid_at: DateTime<Utc>)
        -> Result<PaymentTransition, PaymentStoreError>;

    /// `PENDING → FAILED`, terminal. A no-op if the record already settled.
    async fn mark_failed(&self, id: &str, reason: &str) -> Result<PaymentTransition, PaymentStoreError>;

    async fn fetch_payments(&self, filter: PaymentQueryFilter) -> Result<Vec<Payment>, PaymentStoreError>;
}
