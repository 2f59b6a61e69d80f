//! Endpoint tests against a fully wired app with an in-memory database and a scripted gateway.

use actix_web::{http::StatusCode, test, web, App};
use chrono::Utc;
use fulfillment_common::{Secret, Vnd};
use fulfillment_engine::{
    db_types::{LineItem, OrderCode, OrderId, PaymentMethod},
    events::{CreatedOrder, DeliverySuccessEvent, EventProducers, OrderCreatedEvent},
    test_utils::new_test_database,
    traits::{CheckoutLink, CheckoutProvider, CheckoutProviderError, CheckoutRequest},
    InventoryApi,
    PaymentFlowApi,
    SellerApi,
    SqliteDatabase,
};
use payos_tools::{webhook_signature, PayOsConfig, WebhookBody, WebhookData, WebhookEnvelope};
use serde_json::Value;

use crate::{
    data_objects::{JsonResponse, ProductCreatedNotification},
    routes::{
        health,
        CancelApprovedWebhookRoute,
        ConfirmOrderRoute,
        CreateBankingPaymentRoute,
        DeliverySuccessWebhookRoute,
        MyPaymentsRoute,
        OrderCreatedWebhookRoute,
        PaymentByOrderCodeRoute,
        PayosWebhookRoute,
        ProductCreatedWebhookRoute,
        RejectOrderRoute,
        RevenueRoute,
        SellerProductsRoute,
    },
};

const CHECKSUM_KEY: &str = "endpoint-test-checksum-key";

#[derive(Clone)]
struct StubGateway;

impl CheckoutProvider for StubGateway {
    async fn create_checkout(&self, request: CheckoutRequest) -> Result<CheckoutLink, CheckoutProviderError> {
        Ok(CheckoutLink {
            payment_link_id: format!("link-{}", request.order_code),
            checkout_url: format!("https://pay.test/{}", request.order_code),
            qr_code: "qr-data".to_string(),
        })
    }
}

fn test_payos_config() -> PayOsConfig {
    PayOsConfig { checksum_key: Secret::new(CHECKSUM_KEY.to_string()), ..Default::default() }
}

macro_rules! test_app {
    ($db:expr) => {{
        let producers = EventProducers::default();
        let payments = PaymentFlowApi::new($db.clone(), StubGateway, 900, producers.clone());
        let inventory = InventoryApi::new($db.clone());
        let sellers = SellerApi::new($db.clone(), producers);
        test::init_service(
            App::new()
                .app_data(web::Data::new(payments))
                .app_data(web::Data::new(inventory))
                .app_data(web::Data::new(sellers))
                .app_data(web::Data::new(test_payos_config()))
                .service(health)
                .service(OrderCreatedWebhookRoute::<SqliteDatabase, SqliteDatabase, SqliteDatabase, StubGateway>::new())
                .service(ProductCreatedWebhookRoute::<SqliteDatabase>::new())
                .service(DeliverySuccessWebhookRoute::<SqliteDatabase>::new())
                .service(CancelApprovedWebhookRoute::<SqliteDatabase>::new())
                .service(PayosWebhookRoute::<SqliteDatabase, StubGateway>::new())
                .service(MyPaymentsRoute::<SqliteDatabase, StubGateway>::new())
                .service(PaymentByOrderCodeRoute::<SqliteDatabase, StubGateway>::new())
                .service(CreateBankingPaymentRoute::<SqliteDatabase, StubGateway>::new())
                .service(ConfirmOrderRoute::<SqliteDatabase>::new())
                .service(RejectOrderRoute::<SqliteDatabase>::new())
                .service(RevenueRoute::<SqliteDatabase>::new())
                .service(SellerProductsRoute::<SqliteDatabase>::new()),
        )
        .await
    }};
}

fn line_items() -> Vec<LineItem> {
    vec![LineItem {
        product_id: "p-1".to_string(),
        quantity: 2,
        price: Vnd::from(1_250_000),
        product_name: Some("Ceramic teapot".to_string()),
    }]
}

fn order_event(method: PaymentMethod) -> OrderCreatedEvent {
    OrderCreatedEvent {
        order_code: OrderCode(500_123_456),
        user_id: "alice".to_string(),
        seller_id: "seller-1".to_string(),
        payment_method: method,
        total: Vnd::from(2_500_000),
        orders: vec![CreatedOrder {
            order_id: OrderId("o-1".to_string()),
            total: Vnd::from(2_500_000),
            items: line_items(),
        }],
        created_at: Utc::now(),
    }
}

async fn seed_product(db: &SqliteDatabase, stock: i64) {
    InventoryApi::new(db.clone())
        .ensure_product("p-1", "Ceramic teapot", stock)
        .await
        .expect("could not seed the product ledger");
}

#[actix_web::test]
async fn health_is_open() {
    let db = new_test_database().await;
    let app = test_app!(db);
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn product_webhook_registers_once() {
    let db = new_test_database().await;
    let app = test_app!(db);
    let body = ProductCreatedNotification {
        product_id: "p-1".to_string(),
        product_name: "Ceramic teapot".to_string(),
        stock: 10,
    };
    let req = test::TestRequest::post().uri("/webhook/product_created").set_json(&body).to_request();
    let ack: JsonResponse = test::call_and_read_body_json(&app, req).await;
    assert!(ack.success, "{}", ack.message);

    // A replayed notification is acknowledged and leaves the ledger untouched.
    let mut replay = body.clone();
    replay.stock = 999;
    let req = test::TestRequest::post().uri("/webhook/product_created").set_json(&replay).to_request();
    let ack: JsonResponse = test::call_and_read_body_json(&app, req).await;
    assert!(ack.success);
    let record = InventoryApi::new(db.clone()).fetch_product("p-1").await.unwrap().unwrap();
    assert_eq!(record.available, 10);
}

#[actix_web::test]
async fn request_reply_endpoints_require_a_principal() {
    let db = new_test_database().await;
    let app = test_app!(db);
    let req = test::TestRequest::get().uri("/payments").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn cod_order_lands_as_a_settled_payment() {
    let db = new_test_database().await;
    let app = test_app!(db);
    seed_product(&db, 10).await;

    let req =
        test::TestRequest::post().uri("/webhook/order_created").set_json(order_event(PaymentMethod::Cod)).to_request();
    let ack: JsonResponse = test::call_and_read_body_json(&app, req).await;
    assert!(ack.success, "{}", ack.message);

    let req = test::TestRequest::get().uri("/payments").insert_header(("X-User-Id", "alice")).to_request();
    let payments: Value = test::call_and_read_body_json(&app, req).await;
    let payments = payments.as_array().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["status"], "PAID");
    assert_eq!(payments[0]["method"], "COD");
}

#[actix_web::test]
async fn oversell_is_acknowledged_but_rejected() {
    let db = new_test_database().await;
    let app = test_app!(db);
    seed_product(&db, 1).await;

    let req =
        test::TestRequest::post().uri("/webhook/order_created").set_json(order_event(PaymentMethod::Cod)).to_request();
    let resp = test::call_service(&app, req).await;
    // Webhooks always acknowledge; the failure rides in the body.
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: JsonResponse = test::read_body_json(resp).await;
    assert!(!ack.success);

    let req = test::TestRequest::get().uri("/payments").insert_header(("X-User-Id", "alice")).to_request();
    let payments: Value = test::call_and_read_body_json(&app, req).await;
    assert!(payments.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn banking_order_opens_a_checkout_the_owner_can_poll() {
    let db = new_test_database().await;
    let app = test_app!(db);
    seed_product(&db, 10).await;

    let req = test::TestRequest::post()
        .uri("/webhook/order_created")
        .set_json(order_event(PaymentMethod::Banking))
        .to_request();
    let ack: JsonResponse = test::call_and_read_body_json(&app, req).await;
    assert!(ack.success, "{}", ack.message);

    // The owner sees the pending checkout, with the gateway-compacted code on the link.
    let req = test::TestRequest::get()
        .uri("/payments/order/500123456")
        .insert_header(("X-User-Id", "alice"))
        .to_request();
    let status: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status["status"], "PENDING");
    assert_eq!(status["checkout_url"], "https://pay.test/500123");
    assert!(status["expires_in"].as_i64().unwrap() > 0);

    // Anyone else reads not-found.
    let req = test::TestRequest::get()
        .uri("/payments/order/500123456")
        .insert_header(("X-User-Id", "mallory"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn banking_checkout_endpoint_is_idempotent() {
    let db = new_test_database().await;
    let app = test_app!(db);
    let body = serde_json::json!({ "order_ids": ["o-1"], "order_code": 500_123_456i64, "total": 2_500_000 });

    let req = test::TestRequest::post().uri("/payments/banking").set_json(&body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/payments/banking")
        .insert_header(("X-User-Id", "alice"))
        .set_json(&body)
        .to_request();
    let first: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first["status"], "PENDING");
    assert_eq!(first["checkout_url"], "https://pay.test/500123");

    // Asking again returns the surviving record instead of opening a second checkout.
    let req = test::TestRequest::post()
        .uri("/payments/banking")
        .insert_header(("X-User-Id", "alice"))
        .set_json(&body)
        .to_request();
    let second: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(second["payment_id"], first["payment_id"]);
}

#[actix_web::test]
async fn signed_gateway_webhook_settles_the_payment() {
    let db = new_test_database().await;
    let app = test_app!(db);
    seed_product(&db, 10).await;
    let req = test::TestRequest::post()
        .uri("/webhook/order_created")
        .set_json(order_event(PaymentMethod::Banking))
        .to_request();
    let _: JsonResponse = test::call_and_read_body_json(&app, req).await;

    let data = WebhookData {
        payment_link_id: "link-500123".to_string(),
        code: "00".to_string(),
        amount: 2_500_000,
        desc: "success".to_string(),
    };
    let signature = webhook_signature(CHECKSUM_KEY, &data);
    let envelope = WebhookEnvelope { body: Some(WebhookBody { data: Some(data), signature: Some(signature) }) };
    let req = test::TestRequest::post().uri("/webhook/payos").set_json(&envelope).to_request();
    let ack: JsonResponse = test::call_and_read_body_json(&app, req).await;
    assert!(ack.success, "{}", ack.message);

    let req = test::TestRequest::get()
        .uri("/payments/order/500123456")
        .insert_header(("X-User-Id", "alice"))
        .to_request();
    let status: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status["status"], "PAID");
    assert_eq!(status["paid_amount"], 2_500_000);
    assert_eq!(status["expires_in"], 0);
}

#[actix_web::test]
async fn tampered_gateway_webhook_changes_nothing() {
    let db = new_test_database().await;
    let app = test_app!(db);
    seed_product(&db, 10).await;
    let req = test::TestRequest::post()
        .uri("/webhook/order_created")
        .set_json(order_event(PaymentMethod::Banking))
        .to_request();
    let _: JsonResponse = test::call_and_read_body_json(&app, req).await;

    let data = WebhookData {
        payment_link_id: "link-500123".to_string(),
        code: "00".to_string(),
        amount: 2_500_000,
        desc: "success".to_string(),
    };
    let mut signature = webhook_signature(CHECKSUM_KEY, &data);
    signature.replace_range(..4, "0000");
    let envelope = WebhookEnvelope { body: Some(WebhookBody { data: Some(data), signature: Some(signature) }) };
    let req = test::TestRequest::post().uri("/webhook/payos").set_json(&envelope).to_request();
    let resp = test::call_service(&app, req).await;
    // Acknowledged so the gateway stops retrying, but flagged as a failure.
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: JsonResponse = test::read_body_json(resp).await;
    assert!(!ack.success);

    let req = test::TestRequest::get()
        .uri("/payments/order/500123456")
        .insert_header(("X-User-Id", "alice"))
        .to_request();
    let status: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status["status"], "PENDING");
}

#[actix_web::test]
async fn seller_decision_is_single_shot() {
    let db = new_test_database().await;
    let app = test_app!(db);
    seed_product(&db, 10).await;
    let req =
        test::TestRequest::post().uri("/webhook/order_created").set_json(order_event(PaymentMethod::Cod)).to_request();
    let _: JsonResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/orders/o-1/confirm")
        .insert_header(("X-User-Id", "seller-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let snapshot: Value = test::read_body_json(resp).await;
    assert_eq!(snapshot["status"], "CONFIRMED");

    // The order left PENDING, so the opposite decision conflicts.
    let req = test::TestRequest::post()
        .uri("/orders/o-1/reject")
        .insert_header(("X-User-Id", "seller-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn another_sellers_order_cannot_be_decided() {
    let db = new_test_database().await;
    let app = test_app!(db);
    seed_product(&db, 10).await;
    let req =
        test::TestRequest::post().uri("/webhook/order_created").set_json(order_event(PaymentMethod::Cod)).to_request();
    let _: JsonResponse = test::call_and_read_body_json(&app, req).await;

    // The order belongs to seller-1; anyone else reads not-found and changes nothing.
    for action in ["confirm", "reject"] {
        let req = test::TestRequest::post()
            .uri(&format!("/orders/o-1/{action}"))
            .insert_header(("X-User-Id", "seller-2"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    // The order is still PENDING, so its own seller can decide it.
    let req = test::TestRequest::post()
        .uri("/orders/o-1/confirm")
        .insert_header(("X-User-Id", "seller-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn unknown_order_decision_is_not_found() {
    let db = new_test_database().await;
    let app = test_app!(db);
    let req = test::TestRequest::post()
        .uri("/orders/no-such-order/confirm")
        .insert_header(("X-User-Id", "seller-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delivery_feeds_the_seller_analytics() {
    let db = new_test_database().await;
    let app = test_app!(db);

    let event = DeliverySuccessEvent {
        order_id: OrderId("o-9".to_string()),
        seller_id: "seller-1".to_string(),
        total: Vnd::from(2_500_000),
        items: line_items(),
        delivered_at: Utc::now(),
    };
    let req = test::TestRequest::post().uri("/webhook/delivery_success").set_json(&event).to_request();
    let ack: JsonResponse = test::call_and_read_body_json(&app, req).await;
    assert!(ack.success, "{}", ack.message);

    // A replay acknowledges without counting twice.
    let req = test::TestRequest::post().uri("/webhook/delivery_success").set_json(&event).to_request();
    let ack: JsonResponse = test::call_and_read_body_json(&app, req).await;
    assert!(ack.success);

    let req = test::TestRequest::get()
        .uri("/analytics/revenue?period=WEEK")
        .insert_header(("X-User-Id", "seller-1"))
        .to_request();
    let series: Value = test::call_and_read_body_json(&app, req).await;
    let days = series["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[6]["total_revenue"], 2_500_000);
    assert_eq!(days[6]["total_orders"], 1);
    // The six earlier days are zero-backfilled.
    assert!(days[..6].iter().all(|d| d["total_revenue"] == 0));

    let req = test::TestRequest::get()
        .uri("/analytics/products")
        .insert_header(("X-User-Id", "seller-1"))
        .to_request();
    let products: Value = test::call_and_read_body_json(&app, req).await;
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["product_id"], "p-1");
    assert_eq!(products[0]["total_sold"], 2);
}

#[actix_web::test]
async fn approved_cancellation_returns_reserved_stock() {
    let db = new_test_database().await;
    let app = test_app!(db);
    seed_product(&db, 10).await;
    let req =
        test::TestRequest::post().uri("/webhook/order_created").set_json(order_event(PaymentMethod::Cod)).to_request();
    let _: JsonResponse = test::call_and_read_body_json(&app, req).await;

    let body = serde_json::json!({ "order_id": "o-1" });
    let req = test::TestRequest::post().uri("/webhook/cancel_approved").set_json(&body).to_request();
    let ack: JsonResponse = test::call_and_read_body_json(&app, req).await;
    assert!(ack.success, "{}", ack.message);

    // A second approval finds nothing left to release, but still acknowledges.
    let req = test::TestRequest::post().uri("/webhook/cancel_approved").set_json(&body).to_request();
    let ack: JsonResponse = test::call_and_read_body_json(&app, req).await;
    assert!(ack.success);
}
