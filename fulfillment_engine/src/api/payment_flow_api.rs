use std::fmt::Debug;

use chrono::{Duration, Utc};
use fulfillment_common::Vnd;
use log::*;

use crate::{
    api::{
        errors::PaymentFlowError,
        payment_objects::{CheckoutStatus, GatewayCallback, PaymentQueryFilter},
    },
    db_types::{NewPayment, OrderCode, OrderId, Payment, PaymentMethod, PaymentStatus},
    events::{EventProducers, PaymentFailedEvent, PaymentQrCreatedEvent, PaymentSuccessEvent},
    traits::{
        CheckoutProvider, CheckoutRequest, InsertPaymentResult, PaymentStore, PaymentTransition, TtlStore,
    },
};

const EXPIRY_MARKER_PREFIX: &str = "payment:expire:";

/// The durable-timer key that arms the expiry watchdog for a payment.
pub fn expiry_marker(payment_id: &str) -> String {
    format!("{EXPIRY_MARKER_PREFIX}{payment_id}")
}

/// Extracts the payment id from a lapsed timer key, or `None` when the key belongs to another
/// namespace.
pub fn payment_id_from_marker(key: &str) -> Option<&str> {
    key.strip_prefix(EXPIRY_MARKER_PREFIX)
}

/// `PaymentFlowApi` is the primary API for the payment orchestrator. It owns payment record
/// state transitions in response to order events, gateway webhooks and expiry timeouts.
pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: G,
    /// The settlement window for a BANKING checkout, in seconds.
    ttl_seconds: i64,
    producers: EventProducers,
}

impl<B, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(db: B, gateway: G, ttl_seconds: i64, producers: EventProducers) -> Self {
        Self { db, gateway, ttl_seconds, producers }
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: PaymentStore + TtlStore,
    G: CheckoutProvider,
{
    /// Creates the payment records for a freshly placed checkout group, dispatching on the
    /// chosen method.
    ///
    /// COD settles out of band, so each created order gets one already-`PAID` bookkeeping record
    /// (`paid_amount` stays zero) and a `payment.success` is emitted per order. BANKING opens a
    /// single hosted checkout covering the whole group.
    pub async fn create_from_order(
        &self,
        event: &crate::events::OrderCreatedEvent,
    ) -> Result<Vec<Payment>, PaymentFlowError> {
        match event.payment_method {
            PaymentMethod::Cod => {
                // Replay guard: a redelivered order-created event must not mint more records.
                let existing =
                    self.db.fetch_payments(PaymentQueryFilter::default().with_order_code(event.order_code)).await?;
                let covered: Vec<OrderId> =
                    existing.iter().flat_map(|p| p.order_ids.0.iter().cloned()).collect();
                let mut records = Vec::with_capacity(event.orders.len());
                for order in &event.orders {
                    if covered.contains(&order.order_id) {
                        debug!(
                            "🔄️💰️ Order {} already has a COD payment record. Replay ignored.",
                            order.order_id
                        );
                        continue;
                    }
                    let mut payment = NewPayment::new(
                        &event.user_id,
                        vec![order.order_id.clone()],
                        event.order_code,
                        PaymentMethod::Cod,
                        order.total,
                    );
                    payment.status = PaymentStatus::Paid;
                    let record = match self.db.insert_payment(payment).await? {
                        InsertPaymentResult::Inserted(p) => p,
                        InsertPaymentResult::AlreadyExists(p) => p,
                    };
                    debug!("🔄️💰️ COD payment {} recorded for order {}", record.id, order.order_id);
                    self.call_payment_success_hook(&record).await;
                    records.push(record);
                }
                Ok(records)
            },
            PaymentMethod::Banking => {
                let payment =
                    self.create_banking(&event.user_id, event.order_ids(), event.order_code, event.total).await?;
                Ok(vec![payment])
            },
        }
    }

    /// Opens a hosted checkout for a BANKING payment.
    ///
    /// Creation is idempotent on `order_code`: if a non-failed record already exists it is
    /// returned unchanged and no second checkout is opened. On gateway refusal a terminal
    /// `FAILED` record is persisted, one `payment.failed` is emitted and the error is surfaced
    /// to the caller. On success the `PENDING` record carries the link data, the settlement
    /// window is stamped and a durable expiry timer is armed.
    pub async fn create_banking(
        &self,
        user_id: &str,
        order_ids: Vec<OrderId>,
        order_code: OrderCode,
        total: Vnd,
    ) -> Result<Payment, PaymentFlowError> {
        if let Some(existing) = self.db.fetch_active_banking_payment(order_code).await? {
            debug!(
                "🔄️💰️ Payment {} already covers order code {order_code}. Returning the existing record.",
                existing.id
            );
            return Ok(existing);
        }
        let request = CheckoutRequest {
            order_code: order_code.gateway_code(),
            amount: total,
            description: format!("Pay order {}", order_code.gateway_code()),
        };
        let link = match self.gateway.create_checkout(request).await {
            Ok(link) => link,
            Err(e) => {
                let reason = e.to_string();
                warn!("🔄️💰️ Checkout for order code {order_code} was refused: {reason}");
                let mut payment =
                    NewPayment::new(user_id, order_ids.clone(), order_code, PaymentMethod::Banking, total);
                payment.status = PaymentStatus::Failed;
                payment.failure_reason = Some(reason.clone());
                let record = match self.db.insert_payment(payment).await? {
                    InsertPaymentResult::Inserted(p) => p,
                    InsertPaymentResult::AlreadyExists(p) => p,
                };
                self.call_payment_failed_hook(&record, &reason).await;
                return Err(PaymentFlowError::CheckoutFailed(reason));
            },
        };
        let expires_at = Utc::now() + Duration::seconds(self.ttl_seconds);
        let mut payment = NewPayment::new(user_id, order_ids, order_code, PaymentMethod::Banking, total);
        payment.qr_code = Some(link.qr_code.clone());
        payment.checkout_url = Some(link.checkout_url.clone());
        payment.payment_link_id = Some(link.payment_link_id.clone());
        payment.expires_at = Some(expires_at);
        let record = match self.db.insert_payment(payment).await? {
            InsertPaymentResult::Inserted(p) => {
                self.db.set_marker(&expiry_marker(&p.id), expires_at).await?;
                let event = PaymentQrCreatedEvent {
                    user_id: p.user_id.clone(),
                    order_code: p.order_code,
                    qr_code: link.qr_code,
                    checkout_url: link.checkout_url,
                    expires_in: self.ttl_seconds,
                };
                for emitter in &self.producers.payment_qr_created {
                    emitter.publish_event(event.clone()).await;
                }
                info!("🔄️💰️ Checkout {} opened for order code {order_code}", p.id);
                p
            },
            InsertPaymentResult::AlreadyExists(p) => {
                // Lost a creation race. The surviving record's link is the one the customer
                // sees; the link opened here is simply never paid and lapses at the gateway.
                debug!("🔄️💰️ Concurrent checkout for order code {order_code}; keeping record {}", p.id);
                p
            },
        };
        Ok(record)
    }

    /// Applies a verified gateway callback to the matching payment record.
    ///
    /// Unknown `payment_link_id`s are logged and swallowed so that upstream gets its 2xx and
    /// stops retrying. A non-success result code fails the payment; a success settles it with
    /// the gateway-reported amount, forwarded as received. Either transition happens at most
    /// once; replays land on the terminal record and do nothing.
    pub async fn handle_webhook(&self, callback: GatewayCallback) -> Result<(), PaymentFlowError> {
        let Some(payment) = self.db.fetch_payment_by_link_id(&callback.payment_link_id).await? else {
            error!(
                "🔄️🛍️ Gateway webhook for unknown payment link {}. Acknowledging without side effects.",
                callback.payment_link_id
            );
            return Ok(());
        };
        if callback.is_success() {
            let paid_amount = Vnd::from(callback.amount);
            match self.db.mark_paid(&payment.id, paid_amount, Utc::now()).await? {
                PaymentTransition::Applied(paid) => {
                    self.db.remove_marker(&expiry_marker(&paid.id)).await?;
                    info!("🔄️🛍️ Payment {} settled for {paid_amount}", paid.id);
                    self.call_payment_success_hook(&paid).await;
                },
                PaymentTransition::AlreadyTerminal(p) => {
                    debug!("🔄️🛍️ Payment {} is already {}. Webhook replay ignored.", p.id, p.status);
                },
                PaymentTransition::NotFound => {
                    error!("🔄️🛍️ Payment {} disappeared while settling. This is a data race bug.", payment.id);
                },
            }
        } else {
            let reason = format!("Gateway result {}: {}", callback.code, callback.desc);
            self.fail_payment(&payment.id, &reason).await?;
        }
        Ok(())
    }

    /// The identity-scoped checkout-status projection. A payment only ever surfaces to the user
    /// who created it.
    pub async fn get_by_order_code(
        &self,
        order_code: OrderCode,
        user_id: &str,
    ) -> Result<Option<CheckoutStatus>, PaymentFlowError> {
        let payment = self.db.fetch_payment_for_user(order_code, user_id).await?;
        Ok(payment.map(|p| CheckoutStatus::from_payment(&p, Utc::now())))
    }

    /// Handles a lapsed settlement window. The payment fails if and only if it is still
    /// `PENDING`; a payment that settled before the timer fired is left untouched.
    pub async fn handle_timeout(&self, payment_id: &str) -> Result<(), PaymentFlowError> {
        debug!("🔄️🕰️ Settlement window for payment {payment_id} has lapsed");
        self.fail_payment(payment_id, "Payment window expired").await
    }

    pub async fn fetch_payments(&self, filter: PaymentQueryFilter) -> Result<Vec<Payment>, PaymentFlowError> {
        Ok(self.db.fetch_payments(filter).await?)
    }

    async fn fail_payment(&self, payment_id: &str, reason: &str) -> Result<(), PaymentFlowError> {
        match self.db.mark_failed(payment_id, reason).await? {
            PaymentTransition::Applied(failed) => {
                self.db.remove_marker(&expiry_marker(&failed.id)).await?;
                info!("🔄️❌️ Payment {} failed: {reason}", failed.id);
                self.call_payment_failed_hook(&failed, reason).await;
            },
            PaymentTransition::AlreadyTerminal(p) => {
                debug!("🔄️❌️ Payment {} is already {}. Nothing to fail.", p.id, p.status);
            },
            PaymentTransition::NotFound => {
                warn!("🔄️❌️ Asked to fail payment {payment_id}, but it does not exist");
            },
        }
        Ok(())
    }

    async fn call_payment_success_hook(&self, payment: &Payment) {
        let event = PaymentSuccessEvent {
            payment_id: payment.id.clone(),
            user_id: payment.user_id.clone(),
            order_ids: payment.order_ids.0.clone(),
            order_code: payment.order_code,
            method: payment.method,
            total: payment.total,
            paid_amount: payment.paid_amount,
        };
        for emitter in &self.producers.payment_success {
            debug!("🔄️💰️ Notifying payment success hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    async fn call_payment_failed_hook(&self, payment: &Payment, reason: &str) {
        let event = PaymentFailedEvent {
            payment_id: payment.id.clone(),
            user_id: payment.user_id.clone(),
            order_code: payment.order_code,
            order_ids: payment.order_ids.0.clone(),
            reason: reason.to_string(),
        };
        for emitter in &self.producers.payment_failed {
            debug!("🔄️❌️ Notifying payment failed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}
