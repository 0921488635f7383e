use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    AwaitingRiderEvent,
    EventHandler,
    EventProducer,
    Handler,
    NewSellerOrderEvent,
    PaymentConfirmedEvent,
    RiderAssignedEvent,
};

/// The producer ends of the event channels, held by the flow API. Each list may be empty (nobody subscribed) or
/// carry several producers; publishing walks all of them.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_confirmed_producer: Vec<EventProducer<PaymentConfirmedEvent>>,
    pub new_seller_order_producer: Vec<EventProducer<NewSellerOrderEvent>>,
    pub rider_assigned_producer: Vec<EventProducer<RiderAssignedEvent>>,
    pub awaiting_rider_producer: Vec<EventProducer<AwaitingRiderEvent>>,
}

pub struct EventHandlers {
    pub on_payment_confirmed: Option<EventHandler<PaymentConfirmedEvent>>,
    pub on_new_seller_order: Option<EventHandler<NewSellerOrderEvent>>,
    pub on_rider_assigned: Option<EventHandler<RiderAssignedEvent>>,
    pub on_awaiting_rider: Option<EventHandler<AwaitingRiderEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_confirmed = hooks.on_payment_confirmed.map(|f| EventHandler::new(buffer_size, f));
        let on_new_seller_order = hooks.on_new_seller_order.map(|f| EventHandler::new(buffer_size, f));
        let on_rider_assigned = hooks.on_rider_assigned.map(|f| EventHandler::new(buffer_size, f));
        let on_awaiting_rider = hooks.on_awaiting_rider.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_confirmed, on_new_seller_order, on_rider_assigned, on_awaiting_rider }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_confirmed {
            result.payment_confirmed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_new_seller_order {
            result.new_seller_order_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_rider_assigned {
            result.rider_assigned_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_awaiting_rider {
            result.awaiting_rider_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_confirmed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_new_seller_order {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_rider_assigned {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_awaiting_rider {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

/// Async closures to run in response to fulfilment events. Register the ones you care about, build [`EventHandlers`]
/// from the set, and hand the resulting [`EventProducers`] to the flow API.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_confirmed: Option<Handler<PaymentConfirmedEvent>>,
    pub on_new_seller_order: Option<Handler<NewSellerOrderEvent>>,
    pub on_rider_assigned: Option<Handler<RiderAssignedEvent>>,
    pub on_awaiting_rider: Option<Handler<AwaitingRiderEvent>>,
}

impl EventHooks {
    pub fn on_payment_confirmed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentConfirmedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_confirmed = Some(Arc::new(f));
        self
    }

    pub fn on_new_seller_order<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NewSellerOrderEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_new_seller_order = Some(Arc::new(f));
        self
    }

    pub fn on_rider_assigned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RiderAssignedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_rider_assigned = Some(Arc::new(f));
        self
    }

    pub fn on_awaiting_rider<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(AwaitingRiderEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_awaiting_rider = Some(Arc::new(f));
        self
    }
}
