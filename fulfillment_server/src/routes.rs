//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Webhook endpoints always answer in the 200 range, even when the notification could not be
//! applied. Upstream services treat any non-2xx as "delivery failed" and retry; a replayed
//! notification lands on the engine's idempotency guards, but a permanently failing one would
//! retry forever. The `success` flag in the response body carries the real outcome.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use fulfillment_engine::{
    db_types::{OrderCode, OrderId},
    events::{DeliverySuccessEvent, OrderCreatedEvent},
    traits::{CheckoutProvider, InventoryStore, PaymentBackend, SellerStore},
    CheckoutStatus,
    InventoryApi,
    PaymentFlowApi,
    PaymentQueryFilter,
    SellerApi,
};
use log::*;
use payos_tools::{PayOsConfig, WebhookEnvelope};

use crate::{
    data_objects::{BankingPaymentRequest, CancelApprovedNotification, JsonResponse, ProductCreatedNotification, RevenueQuery},
    errors::ServerError,
    helpers::get_user_id,
    integrations::payos::verified_callback,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------   Order created  ----------------------------------------------------
route!(order_created_webhook => Post "/webhook/order_created" impl InventoryStore, SellerStore, PaymentBackend, CheckoutProvider);
/// Entry point of the saga. Reserves stock for every order in the checkout group, mirrors the
/// orders into the seller snapshots, and opens the payment leg. If the stock cannot be covered
/// the saga stops here and nothing downstream runs.
pub async fn order_created_webhook<BInv, BSel, BPay, G>(
    body: web::Json<OrderCreatedEvent>,
    inventory: web::Data<InventoryApi<BInv>>,
    sellers: web::Data<SellerApi<BSel>>,
    payments: web::Data<PaymentFlowApi<BPay, G>>,
) -> HttpResponse
where
    BInv: InventoryStore,
    BSel: SellerStore,
    BPay: PaymentBackend,
    G: CheckoutProvider,
{
    let event = body.into_inner();
    trace!("📬️ Received order created webhook for order code {}", event.order_code);
    if let Err(e) = inventory.reserve_stock(&event).await {
        warn!("📬️ Could not reserve stock for order code {}. {e}", event.order_code);
        return HttpResponse::Ok().json(JsonResponse::failure(e));
    }
    if let Err(e) = sellers.sync_order_from_event(&event).await {
        warn!("📬️ Could not sync seller snapshots for order code {}. {e}", event.order_code);
        return HttpResponse::Ok().json(JsonResponse::failure(e));
    }
    let result = match payments.create_from_order(&event).await {
        Ok(records) => {
            info!("📬️ Order code {} processed. {} payment record(s).", event.order_code, records.len());
            JsonResponse::success("Order processed successfully.")
        },
        Err(e) => {
            warn!("📬️ Payment leg failed for order code {}. {e}", event.order_code);
            JsonResponse::failure(e)
        },
    };
    HttpResponse::Ok().json(result)
}

//----------------------------------------  Product created  ---------------------------------------------------
route!(product_created_webhook => Post "/webhook/product_created" impl InventoryStore);
pub async fn product_created_webhook<B>(
    body: web::Json<ProductCreatedNotification>,
    inventory: web::Data<InventoryApi<B>>,
) -> HttpResponse
where
    B: InventoryStore,
{
    let product = body.into_inner();
    debug!("📬️ Received product created webhook for product {} ({})", product.product_name, product.product_id);
    let result = match inventory.ensure_product(&product.product_id, &product.product_name, product.stock).await {
        Ok(record) => JsonResponse::success(format!("Product {} registered.", record.product_id)),
        Err(e) => {
            warn!("📬️ Could not register product {}. {e}", product.product_id);
            JsonResponse::failure(e)
        },
    };
    HttpResponse::Ok().json(result)
}

//---------------------------------------  Delivery success  ---------------------------------------------------
route!(delivery_success_webhook => Post "/webhook/delivery_success" impl SellerStore);
/// Folds a completed delivery into the seller aggregates. Replays acknowledge without counting
/// twice.
pub async fn delivery_success_webhook<B>(
    body: web::Json<DeliverySuccessEvent>,
    sellers: web::Data<SellerApi<B>>,
) -> HttpResponse
where
    B: SellerStore,
{
    let event = body.into_inner();
    trace!("📬️ Received delivery success webhook for order {}", event.order_id);
    let result = match sellers.record_delivery(&event).await {
        Ok(true) => JsonResponse::success("Delivery recorded."),
        Ok(false) => JsonResponse::success("Delivery was already recorded."),
        Err(e) => {
            warn!("📬️ Could not record delivery for order {}. {e}", event.order_id);
            JsonResponse::failure(e)
        },
    };
    HttpResponse::Ok().json(result)
}

//---------------------------------------  Cancel approved  ----------------------------------------------------
route!(cancel_approved_webhook => Post "/webhook/cancel_approved" impl InventoryStore);
/// A customer-requested cancellation was approved upstream; return the order's reserved stock.
pub async fn cancel_approved_webhook<B>(
    body: web::Json<CancelApprovedNotification>,
    inventory: web::Data<InventoryApi<B>>,
) -> HttpResponse
where
    B: InventoryStore,
{
    let notification = body.into_inner();
    trace!("📬️ Received cancel approved webhook for order {}", notification.order_id);
    let result = match inventory.release_stock(&notification.order_id).await {
        Ok(true) => JsonResponse::success("Stock released."),
        Ok(false) => JsonResponse::success("No live reservations to release."),
        Err(e) => {
            warn!("📬️ Could not release stock for order {}. {e}", notification.order_id);
            JsonResponse::failure(e)
        },
    };
    HttpResponse::Ok().json(result)
}

//----------------------------------------  Gateway webhook  ---------------------------------------------------
route!(payos_webhook => Post "/webhook/payos" impl PaymentBackend, CheckoutProvider);
/// The payment gateway reports a checkout outcome. The payload signature is verified before
/// anything is acted on; a rejected payload is acknowledged (so the gateway stops retrying) but
/// changes nothing.
pub async fn payos_webhook<B, G>(
    body: web::Json<WebhookEnvelope>,
    api: web::Data<PaymentFlowApi<B, G>>,
    config: web::Data<PayOsConfig>,
) -> HttpResponse
where
    B: PaymentBackend,
    G: CheckoutProvider,
{
    trace!("🛍️️ Received gateway webhook");
    let callback = match verified_callback(config.get_ref(), body.into_inner()) {
        Ok(callback) => callback,
        Err(e) => {
            warn!("🛍️️ Rejected gateway webhook. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure(e));
        },
    };
    let result = match api.handle_webhook(callback).await {
        Ok(()) => JsonResponse::success("Webhook processed."),
        Err(e) => {
            warn!("🛍️️ Could not apply gateway webhook. {e}");
            JsonResponse::failure(e)
        },
    };
    HttpResponse::Ok().json(result)
}

//----------------------------------------   My payments  ------------------------------------------------------
route!(my_payments => Get "/payments" impl PaymentBackend, CheckoutProvider);
/// The caller's own payment records, optionally narrowed by `order_code`, `method` or `status`
/// query parameters. The `user_id` filter is always forced to the authenticated principal.
pub async fn my_payments<B, G>(
    req: HttpRequest,
    query: web::Query<PaymentQueryFilter>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    G: CheckoutProvider,
{
    let user_id = get_user_id(&req)?;
    trace!("💻️ GET payments for user {user_id}");
    let filter = query.into_inner().with_user_id(&user_id);
    let payments = api.fetch_payments(filter).await?;
    Ok(HttpResponse::Ok().json(payments))
}

//--------------------------------------  Checkout status poll  ------------------------------------------------
route!(payment_by_order_code => Get "/payments/order/{order_code}" impl PaymentBackend, CheckoutProvider);
/// The checkout-status projection the storefront polls while the shopper sits on the QR screen.
/// Scoped to the authenticated principal; someone else's order code reads as not found.
pub async fn payment_by_order_code<B, G>(
    req: HttpRequest,
    path: web::Path<i64>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    G: CheckoutProvider,
{
    let user_id = get_user_id(&req)?;
    let order_code = OrderCode::from(path.into_inner());
    trace!("💻️ GET payment status for order code {order_code} (user {user_id})");
    let status = api
        .get_by_order_code(order_code, &user_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No payment for order code {order_code}")))?;
    Ok(HttpResponse::Ok().json(status))
}

//---------------------------------------  Banking checkout  ---------------------------------------------------
route!(create_banking_payment => Post "/payments/banking" impl PaymentBackend, CheckoutProvider);
/// Opens (or returns the already-open) hosted checkout for the caller's order group.
pub async fn create_banking_payment<B, G>(
    req: HttpRequest,
    body: web::Json<BankingPaymentRequest>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    G: CheckoutProvider,
{
    let user_id = get_user_id(&req)?;
    let request = body.into_inner();
    debug!("💻️ POST banking checkout for order code {} (user {user_id})", request.order_code);
    let payment = api
        .create_banking(&user_id, request.order_ids, OrderCode::from(request.order_code), request.total)
        .await?;
    Ok(HttpResponse::Ok().json(CheckoutStatus::from_payment(&payment, Utc::now())))
}

//----------------------------------------  Seller decision  ---------------------------------------------------
/// The decision endpoints are scoped to the order's own seller. A mismatched principal reads as
/// not-found, the same way [`payment_by_order_code`] hides other users' payments.
async fn check_order_owner<B: SellerStore>(
    api: &SellerApi<B>,
    order_id: &OrderId,
    seller_id: &str,
) -> Result<(), ServerError> {
    match api.fetch_order(order_id).await? {
        Some(snapshot) if snapshot.seller_id == seller_id => Ok(()),
        Some(_) => {
            debug!("💻️ Seller {seller_id} asked about order {order_id}, which belongs to someone else");
            Err(ServerError::NoRecordFound(format!("No order {order_id} for this seller")))
        },
        None => Err(ServerError::NoRecordFound(format!("No order {order_id} for this seller"))),
    }
}

route!(confirm_order => Post "/orders/{order_id}/confirm" impl SellerStore);
pub async fn confirm_order<B>(
    req: HttpRequest,
    path: web::Path<String>,
    api: web::Data<SellerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SellerStore,
{
    let seller_id = get_user_id(&req)?;
    let order_id = OrderId(path.into_inner());
    debug!("💻️ POST confirm order {order_id} (seller {seller_id})");
    check_order_owner(&api, &order_id, &seller_id).await?;
    let snapshot = api.confirm_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

route!(reject_order => Post "/orders/{order_id}/reject" impl SellerStore);
pub async fn reject_order<B>(
    req: HttpRequest,
    path: web::Path<String>,
    api: web::Data<SellerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SellerStore,
{
    let seller_id = get_user_id(&req)?;
    let order_id = OrderId(path.into_inner());
    debug!("💻️ POST reject order {order_id} (seller {seller_id})");
    check_order_owner(&api, &order_id, &seller_id).await?;
    let snapshot = api.reject_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

//-----------------------------------------   Analytics   ------------------------------------------------------
route!(revenue => Get "/analytics/revenue" impl SellerStore);
/// The trailing revenue series for the authenticated seller, zero-backfilled so the storefront
/// chart always gets one row per day.
pub async fn revenue<B>(
    req: HttpRequest,
    query: web::Query<RevenueQuery>,
    api: web::Data<SellerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SellerStore,
{
    let seller_id = get_user_id(&req)?;
    let period = query.into_inner().period;
    trace!("💻️ GET revenue series for seller {seller_id} ({period:?})");
    let series = api.revenue_series(&seller_id, period).await?;
    Ok(HttpResponse::Ok().json(series))
}

route!(seller_products => Get "/analytics/products" impl SellerStore);
pub async fn seller_products<B>(
    req: HttpRequest,
    api: web::Data<SellerApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SellerStore,
{
    let seller_id = get_user_id(&req)?;
    trace!("💻️ GET product analytics for seller {seller_id}");
    let analytics = api.product_analytics(&seller_id).await?;
    Ok(HttpResponse::Ok().json(analytics))
}
