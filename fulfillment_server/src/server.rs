use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use fulfillment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    InventoryApi,
    PaymentFlowApi,
    SellerApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::payos::PayOsProvider,
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
    watchdog::start_expiry_watchdog,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = PayOsProvider::new(config.payos.clone())?;
    let handlers = EventHandlers::new(128, create_saga_hooks(db.clone()));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    start_expiry_watchdog(
        db.clone(),
        gateway.clone(),
        config.payment_ttl_seconds,
        config.watchdog_interval_seconds,
        producers.clone(),
    );
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Wires the saga's follow-up actions onto the event channels.
///
/// * `order.confirmed` converts the order's reservations into sales and folds the order into
///   the seller aggregates.
/// * `order.cancelled` returns the order's reserved stock.
/// * `payment.failed` is the compensating action: every order covered by the failed payment has
///   its reserved stock released.
/// * `payment.success` and `payment.qr.created` feed the notification log; the customer-facing
///   push channel picks them up from there.
pub fn create_saga_hooks(db: SqliteDatabase) -> EventHooks {
    let mut hooks = EventHooks::default();
    let confirm_db = db.clone();
    hooks.on_order_confirmed(move |event| {
        let inventory = InventoryApi::new(confirm_db.clone());
        let sellers = SellerApi::new(confirm_db.clone(), EventProducers::default());
        Box::pin(async move {
            if let Err(e) = inventory.confirm_stock(&event.order_id).await {
                error!("📬️ Could not convert reservations for confirmed order {}. {e}", event.order_id);
            }
            if let Err(e) = sellers.record_confirmed(&event).await {
                error!("📬️ Could not update aggregates for confirmed order {}. {e}", event.order_id);
            }
        })
    });
    let cancel_db = db.clone();
    hooks.on_order_cancelled(move |event| {
        let inventory = InventoryApi::new(cancel_db.clone());
        Box::pin(async move {
            if let Err(e) = inventory.release_stock(&event.order_id).await {
                error!("📬️ Could not release stock for cancelled order {}. {e}", event.order_id);
            }
        })
    });
    let failed_db = db.clone();
    hooks.on_payment_failed(move |event| {
        let inventory = InventoryApi::new(failed_db.clone());
        Box::pin(async move {
            info!(
                "📬️ Payment {} failed ({}). Releasing stock for {} order(s).",
                event.payment_id,
                event.reason,
                event.order_ids.len()
            );
            for order_id in &event.order_ids {
                if let Err(e) = inventory.release_stock(order_id).await {
                    error!("📬️ Compensating release failed for order {order_id}. {e}");
                }
            }
        })
    });
    hooks.on_payment_success(move |event| {
        Box::pin(async move {
            info!(
                "📬️ Payment {} settled for user {}: {} paid on order code {}",
                event.payment_id, event.user_id, event.paid_amount, event.order_code
            );
        })
    });
    hooks.on_payment_qr_created(move |event| {
        Box::pin(async move {
            info!(
                "📬️ Checkout link for order code {} issued to user {} (lapses in {}s)",
                event.order_code, event.user_id, event.expires_in
            );
        })
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PayOsProvider,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let payments_api =
            PaymentFlowApi::new(db.clone(), gateway.clone(), config.payment_ttl_seconds, producers.clone());
        let inventory_api = InventoryApi::new(db.clone());
        let seller_api = SellerApi::new(db.clone(), producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ofs::access_log"))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(inventory_api))
            .app_data(web::Data::new(seller_api))
            .app_data(web::Data::new(config.payos.clone()))
            .service(health)
            .service(OrderCreatedWebhookRoute::<SqliteDatabase, SqliteDatabase, SqliteDatabase, PayOsProvider>::new())
            .service(ProductCreatedWebhookRoute::<SqliteDatabase>::new())
            .service(DeliverySuccessWebhookRoute::<SqliteDatabase>::new())
            .service(CancelApprovedWebhookRoute::<SqliteDatabase>::new())
            .service(PayosWebhookRoute::<SqliteDatabase, PayOsProvider>::new())
            .service(MyPaymentsRoute::<SqliteDatabase, PayOsProvider>::new())
            .service(PaymentByOrderCodeRoute::<SqliteDatabase, PayOsProvider>::new())
            .service(CreateBankingPaymentRoute::<SqliteDatabase, PayOsProvider>::new())
            .service(ConfirmOrderRoute::<SqliteDatabase>::new())
            .service(RejectOrderRoute::<SqliteDatabase>::new())
            .service(RevenueRoute::<SqliteDatabase>::new())
            .service(SellerProductsRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
