use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderCancelledEvent,
    OrderConfirmedEvent,
    PaymentFailedEvent,
    PaymentQrCreatedEvent,
    PaymentSuccessEvent,
};

/// The producer ends of every saga event channel. APIs receive a clone of this and publish
/// fire-and-forget; an empty producer list simply means nobody subscribed.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_confirmed: Vec<EventProducer<OrderConfirmedEvent>>,
    pub order_cancelled: Vec<EventProducer<OrderCancelledEvent>>,
    pub payment_success: Vec<EventProducer<PaymentSuccessEvent>>,
    pub payment_failed: Vec<EventProducer<PaymentFailedEvent>>,
    pub payment_qr_created: Vec<EventProducer<PaymentQrCreatedEvent>>,
}

pub struct EventHandlers {
    pub on_order_confirmed: Option<EventHandler<OrderConfirmedEvent>>,
    pub on_order_cancelled: Option<EventHandler<OrderCancelledEvent>>,
    pub on_payment_success: Option<EventHandler<PaymentSuccessEvent>>,
    pub on_payment_failed: Option<EventHandler<PaymentFailedEvent>>,
    pub on_payment_qr_created: Option<EventHandler<PaymentQrCreatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_confirmed: hooks.on_order_confirmed.map(|f| EventHandler::new(buffer_size, f)),
            on_order_cancelled: hooks.on_order_cancelled.map(|f| EventHandler::new(buffer_size, f)),
            on_payment_success: hooks.on_payment_success.map(|f| EventHandler::new(buffer_size, f)),
            on_payment_failed: hooks.on_payment_failed.map(|f| EventHandler::new(buffer_size, f)),
            on_payment_qr_created: hooks.on_payment_qr_created.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_confirmed {
            result.order_confirmed.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_cancelled {
            result.order_cancelled.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_success {
            result.payment_success.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_failed {
            result.payment_failed.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_qr_created {
            result.payment_qr_created.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_confirmed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_cancelled {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_success {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_failed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_qr_created {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_confirmed: Option<Handler<OrderConfirmedEvent>>,
    pub on_order_cancelled: Option<Handler<OrderCancelledEvent>>,
    pub on_payment_success: Option<Handler<PaymentSuccessEvent>>,
    pub on_payment_failed: Option<Handler<PaymentFailedEvent>>,
    pub on_payment_qr_created: Option<Handler<PaymentQrCreatedEvent>>,
}

macro_rules! hook_setter {
    ($name:ident, $event:ty) => {
        pub fn $name<F>(&mut self, f: F) -> &mut Self
        where F: (Fn($event) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
            self.$name = Some(Arc::new(f));
            self
        }
    };
}

impl EventHooks {
    hook_setter!(on_order_confirmed, OrderConfirmedEvent);

    hook_setter!(on_order_cancelled, OrderCancelledEvent);

    hook_setter!(on_payment_success, PaymentSuccessEvent);

    hook_setter!(on_payment_failed, PaymentFailedEvent);

    hook_setter!(on_payment_qr_created, PaymentQrCreatedEvent);
}
