//! End-to-end flows for the payment orchestrator against a real (in-memory) database and a
//! scripted gateway.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::{Duration, Utc};
use fulfillment_common::Vnd;
use fulfillment_engine::{
    db_types::{LineItem, NewPayment, OrderCode, PaymentMethod, PaymentStatus},
    events::{CreatedOrder, EventHandler, EventProducers, OrderCreatedEvent, PaymentFailedEvent, PaymentSuccessEvent},
    expiry_marker,
    payment_id_from_marker,
    traits::{
        CheckoutLink, CheckoutProvider, CheckoutProviderError, CheckoutRequest, PaymentStore, TtlStore,
    },
    GatewayCallback, PaymentFlowApi, PaymentFlowError, PaymentQueryFilter, SqliteDatabase,
};

const TTL_SECONDS: i64 = 900;

async fn new_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    SqliteDatabase::new("sqlite::memory:", 1).await.unwrap()
}

#[derive(Clone, Default)]
struct ScriptedGateway {
    decline: bool,
    calls: Arc<AtomicUsize>,
}

impl CheckoutProvider for ScriptedGateway {
    async fn create_checkout(&self, request: CheckoutRequest) -> Result<CheckoutLink, CheckoutProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.decline {
            return Err(CheckoutProviderError::Declined("merchant quota exceeded".into()));
        }
        Ok(CheckoutLink {
            payment_link_id: format!("link-{}", request.order_code),
            checkout_url: format!("https://pay.example.com/{}", request.order_code),
            qr_code: format!("qr-{}", request.order_code),
        })
    }
}

/// An event counter wired into one producer slot. Call `finish` after dropping the api to let
/// the dispatch loop drain, then read the count.
struct FailureCounter {
    handler: EventHandler<PaymentFailedEvent>,
    count: Arc<AtomicUsize>,
}

impl FailureCounter {
    fn new() -> Self {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let handler = EventHandler::new(
            8,
            Arc::new(move |_e: PaymentFailedEvent| {
                let c = c.clone();
                Box::pin(async move {
                    c.fetch_add(1, Ordering::SeqCst);
                })
            }),
        );
        Self { handler, count }
    }

    fn producers(&self) -> EventProducers {
        let mut producers = EventProducers::default();
        producers.payment_failed.push(self.handler.subscribe());
        producers
    }

    async fn finish(self) -> usize {
        self.handler.start_handler().await;
        self.count.load(Ordering::SeqCst)
    }
}

struct SuccessCounter {
    handler: EventHandler<PaymentSuccessEvent>,
    count: Arc<AtomicUsize>,
}

impl SuccessCounter {
    fn new() -> Self {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let handler = EventHandler::new(
            8,
            Arc::new(move |_e: PaymentSuccessEvent| {
                let c = c.clone();
                Box::pin(async move {
                    c.fetch_add(1, Ordering::SeqCst);
                })
            }),
        );
        Self { handler, count }
    }

    fn producers(&self) -> EventProducers {
        let mut producers = EventProducers::default();
        producers.payment_success.push(self.handler.subscribe());
        producers
    }

    async fn finish(self) -> usize {
        self.handler.start_handler().await;
        self.count.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn banking_checkout_is_idempotent_per_order_code() {
    let db = new_db().await;
    let gateway = ScriptedGateway::default();
    let calls = gateway.calls.clone();
    let api = PaymentFlowApi::new(db, gateway, TTL_SECONDS, EventProducers::default());

    let code = OrderCode(42_000);
    let first = api.create_banking("user-1", vec!["o1".into()], code, Vnd::from(250_000)).await.unwrap();
    let second = api.create_banking("user-1", vec!["o1".into()], code, Vnd::from(250_000)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.status, PaymentStatus::Pending);
    assert_eq!(first.payment_link_id.as_deref(), Some("link-42"));
}

#[tokio::test]
async fn full_banking_settlement_scenario() {
    let db = new_db().await;
    let gateway = ScriptedGateway::default();
    let successes = SuccessCounter::new();
    let api = PaymentFlowApi::new(db.clone(), gateway, TTL_SECONDS, successes.producers());

    // The concrete worked example: platform code 500123456 compacts to gateway code 500123.
    let code = OrderCode(500_123_456);
    let payment = api
        .create_banking("user-7", vec!["o1".into(), "o2".into()], code, Vnd::from(2_500_000))
        .await
        .unwrap();
    assert_eq!(payment.payment_link_id.as_deref(), Some("link-500123"));
    assert!(payment.expires_at.is_some());

    // The durable expiry timer was armed for this payment.
    let due = db.claim_due_markers(Utc::now() + Duration::seconds(TTL_SECONDS + 1)).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(payment_id_from_marker(&due[0]), Some(payment.id.as_str()));
    // Re-arm it: the settlement below must be able to disarm a live marker.
    db.set_marker(&expiry_marker(&payment.id), payment.expires_at.unwrap()).await.unwrap();

    // The gateway settles a different amount than the platform total; it is forwarded verbatim.
    let callback = GatewayCallback {
        payment_link_id: "link-500123".into(),
        code: "00".into(),
        amount: 2_400_000,
        desc: "success".into(),
    };
    api.handle_webhook(callback.clone()).await.unwrap();
    let settled = db.fetch_payment(&payment.id).await.unwrap().unwrap();
    assert_eq!(settled.status, PaymentStatus::Paid);
    assert_eq!(settled.paid_amount, Vnd::from(2_400_000));
    assert_eq!(settled.total, Vnd::from(2_500_000));

    // Replayed webhook: no second transition, no second event.
    api.handle_webhook(callback).await.unwrap();
    let after_replay = db.fetch_payment(&payment.id).await.unwrap().unwrap();
    assert_eq!(after_replay.paid_amount, Vnd::from(2_400_000));

    // The status projection is identity-scoped and terminal windows report zero.
    let status = api.get_by_order_code(code, "user-7").await.unwrap().unwrap();
    assert_eq!(status.status, PaymentStatus::Paid);
    assert_eq!(status.expires_in, 0);
    assert!(api.get_by_order_code(code, "somebody-else").await.unwrap().is_none());

    drop(api);
    assert_eq!(successes.finish().await, 1);
}

#[tokio::test]
async fn webhook_for_unknown_link_is_acknowledged_without_side_effects() {
    let db = new_db().await;
    let failures = FailureCounter::new();
    let api = PaymentFlowApi::new(db, ScriptedGateway::default(), TTL_SECONDS, failures.producers());

    let callback =
        GatewayCallback { payment_link_id: "link-nowhere".into(), code: "00".into(), amount: 1, desc: "ok".into() };
    api.handle_webhook(callback).await.unwrap();

    drop(api);
    assert_eq!(failures.finish().await, 0);
}

#[tokio::test]
async fn declined_checkout_persists_terminal_failure() {
    let db = new_db().await;
    let gateway = ScriptedGateway { decline: true, ..Default::default() };
    let failures = FailureCounter::new();
    let api = PaymentFlowApi::new(db.clone(), gateway, TTL_SECONDS, failures.producers());

    let code = OrderCode(9_000);
    let err = api.create_banking("user-1", vec!["o9".into()], code, Vnd::from(100_000)).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::CheckoutFailed(_)));

    let stored = db
        .fetch_payments(PaymentQueryFilter::default().with_order_code(code))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, PaymentStatus::Failed);
    assert!(stored[0].failure_reason.as_deref().unwrap().contains("quota"));

    // A failed record does not block a fresh attempt.
    let retry_gateway = ScriptedGateway::default();
    let retry = PaymentFlowApi::new(db, retry_gateway, TTL_SECONDS, EventProducers::default());
    let payment = retry.create_banking("user-1", vec!["o9".into()], code, Vnd::from(100_000)).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);

    drop(api);
    assert_eq!(failures.finish().await, 1);
}

#[tokio::test]
async fn expiry_fails_only_unsettled_payments() {
    let db = new_db().await;
    let failures = FailureCounter::new();
    let api = PaymentFlowApi::new(db.clone(), ScriptedGateway::default(), TTL_SECONDS, failures.producers());

    let lapsing = api.create_banking("user-1", vec!["a1".into()], OrderCode(1_000), Vnd::from(10_000)).await.unwrap();
    let settling = api.create_banking("user-1", vec!["b1".into()], OrderCode(2_000), Vnd::from(20_000)).await.unwrap();

    let callback = GatewayCallback {
        payment_link_id: settling.payment_link_id.clone().unwrap(),
        code: "00".into(),
        amount: 20_000,
        desc: "success".into(),
    };
    api.handle_webhook(callback).await.unwrap();

    api.handle_timeout(&lapsing.id).await.unwrap();
    api.handle_timeout(&settling.id).await.unwrap();
    // Redelivered timeout for an already failed payment is also a no-op.
    api.handle_timeout(&lapsing.id).await.unwrap();

    assert_eq!(db.fetch_payment(&lapsing.id).await.unwrap().unwrap().status, PaymentStatus::Failed);
    assert_eq!(db.fetch_payment(&settling.id).await.unwrap().unwrap().status, PaymentStatus::Paid);

    drop(api);
    assert_eq!(failures.finish().await, 1);
}

#[tokio::test]
async fn abandoned_checkout_ends_in_exactly_one_failure() {
    let db = new_db().await;
    let failures = FailureCounter::new();
    let api = PaymentFlowApi::new(db.clone(), ScriptedGateway::default(), TTL_SECONDS, failures.producers());

    let payment = api.create_banking("user-1", vec!["o1".into()], OrderCode(77_000), Vnd::from(90_000)).await.unwrap();

    // Nobody pays. The watchdog sweep claims the lapsed marker exactly once.
    let after_window = Utc::now() + Duration::seconds(TTL_SECONDS + 5);
    let due = db.claim_due_markers(after_window).await.unwrap();
    assert_eq!(due.len(), 1);
    for key in &due {
        let id = payment_id_from_marker(key).unwrap();
        api.handle_timeout(id).await.unwrap();
    }
    // A second sweep finds nothing: the claim deleted the marker.
    assert!(db.claim_due_markers(after_window).await.unwrap().is_empty());

    assert_eq!(db.fetch_payment(&payment.id).await.unwrap().unwrap().status, PaymentStatus::Failed);
    drop(api);
    assert_eq!(failures.finish().await, 1);
}

#[tokio::test]
async fn cod_orders_get_one_settled_record_each() {
    let db = new_db().await;
    let successes = SuccessCounter::new();
    let api = PaymentFlowApi::new(db.clone(), ScriptedGateway::default(), TTL_SECONDS, successes.producers());

    let item = |pid: &str| LineItem {
        product_id: pid.into(),
        quantity: 1,
        price: Vnd::from(80_000),
        product_name: None,
    };
    let event = OrderCreatedEvent {
        order_code: OrderCode(33_000),
        user_id: "user-3".into(),
        seller_id: "seller-1".into(),
        payment_method: PaymentMethod::Cod,
        total: Vnd::from(160_000),
        orders: vec![
            CreatedOrder { order_id: "o1".into(), total: Vnd::from(80_000), items: vec![item("p1")] },
            CreatedOrder { order_id: "o2".into(), total: Vnd::from(80_000), items: vec![item("p2")] },
        ],
        created_at: Utc::now(),
    };
    let records = api.create_from_order(&event).await.unwrap();
    // A redelivered order-created event mints nothing further.
    let replay = api.create_from_order(&event).await.unwrap();
    assert!(replay.is_empty());

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.status, PaymentStatus::Paid);
        assert_eq!(record.method, PaymentMethod::Cod);
        assert!(record.paid_amount.is_zero());
        assert_eq!(record.order_ids.0.len(), 1);
    }
    drop(api);
    assert_eq!(successes.finish().await, 2);
}

#[tokio::test]
async fn payment_queries_filter_by_status_and_user() {
    let db = new_db().await;
    let mut paid = NewPayment::new("user-1", vec!["o1".into()], OrderCode(1_000), PaymentMethod::Cod, Vnd::from(10));
    paid.status = PaymentStatus::Paid;
    let pending =
        NewPayment::new("user-2", vec!["o2".into()], OrderCode(2_000), PaymentMethod::Banking, Vnd::from(20));
    db.insert_payment(paid).await.unwrap();
    db.insert_payment(pending).await.unwrap();

    let api = PaymentFlowApi::new(db, ScriptedGateway::default(), TTL_SECONDS, EventProducers::default());
    let only_paid = api.fetch_payments(PaymentQueryFilter::default().with_status(PaymentStatus::Paid)).await.unwrap();
    assert_eq!(only_paid.len(), 1);
    assert_eq!(only_paid[0].user_id, "user-1");

    let for_user = api.fetch_payments(PaymentQueryFilter::default().with_user_id("user-2")).await.unwrap();
    assert_eq!(for_user.len(), 1);
    assert_eq!(for_user[0].method, PaymentMethod::Banking);

    let everything = api.fetch_payments(PaymentQueryFilter::default()).await.unwrap();
    assert_eq!(everything.len(), 2);
}
