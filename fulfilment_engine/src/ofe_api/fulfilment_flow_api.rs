use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Delivery, Order, OrderId, SellerGroup},
    events::{
        AwaitingRiderEvent,
        EventProducers,
        NewSellerOrderEvent,
        PaymentConfirmedEvent,
        RiderAssignedEvent,
    },
    fulfilment::{classify, plan_groups, AssignmentResult, DispatchStrategy},
    traits::{FulfilmentDatabase, FulfilmentError},
};

/// What processing a payment-completion event produced.
#[derive(Debug, Clone)]
pub enum FulfilmentOutcome {
    /// The order was grouped, classified and (where direct) handed to the assignment step.
    Processed { order: Order, groups: Vec<SellerGroup>, assignment: AssignmentResult },
    /// The order had already been grouped, so this invocation changed nothing. Webhook deliveries are not
    /// deduplicated upstream; this is what keeps redelivery harmless.
    AlreadyProcessed { order: Order },
}

/// `FulfilmentFlowApi` is the primary API for turning a confirmed payment into per-seller groups and a delivery
/// assignment. It drives the payment-confirmation sequence end to end: mark paid, group by seller, classify, assign
/// or defer, and notify the affected parties along the way.
pub struct FulfilmentFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for FulfilmentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FulfilmentFlowApi")
    }
}

impl<B> FulfilmentFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> FulfilmentFlowApi<B>
where B: FulfilmentDatabase
{
    /// Process a payment-completion event for the given order.
    ///
    /// The steps run strictly in sequence, each awaiting durably-committed state before the next reads it:
    /// 1. Load the order and its lines. An unknown order or one with zero lines is fatal for this invocation.
    /// 2. If the order is already grouped, return [`FulfilmentOutcome::AlreadyProcessed`] with no side effects.
    /// 3. Mark the order paid, attaching the delivery address and phone, and notify the buyer.
    /// 4. Split the lines into seller groups, persist them atomically, and notify each seller.
    /// 5. Classify the order and either dispatch a rider directly or park it for hub consolidation.
    ///
    /// Notification emission is best-effort and never rolls back committed state.
    pub async fn process_paid_order(
        &self,
        order_id: &OrderId,
        address: Option<&str>,
        phone: Option<&str>,
    ) -> Result<FulfilmentOutcome, FulfilmentError> {
        let order = self.db.fetch_order(order_id).await?.ok_or_else(|| FulfilmentError::OrderNotFound(order_id.clone()))?;
        let existing = self.db.fetch_seller_groups(order_id).await?;
        if !existing.is_empty() {
            debug!("🔄️📦️ Order {order_id} has already been processed ({} groups). Skipping.", existing.len());
            return Ok(FulfilmentOutcome::AlreadyProcessed { order });
        }
        let lines = self.db.fetch_order_lines(order_id).await?;
        // planning is pure, so a fatal empty order is caught before anything is mutated
        let plan = plan_groups(order_id, &lines)?;

        let order = self.db.mark_order_paid(order_id, address, phone).await?;
        self.call_payment_confirmed_hook(&order).await;

        let groups = match self.db.create_seller_groups(order_id, &plan).await {
            Ok(groups) => groups,
            // a concurrent webhook redelivery beat us to the grouping transaction
            Err(FulfilmentError::OrderAlreadyGrouped(_)) => {
                warn!("🔄️📦️ Order {order_id} was grouped concurrently. Treating this delivery as a duplicate.");
                return Ok(FulfilmentOutcome::AlreadyProcessed { order });
            },
            Err(e) => return Err(e),
        };
        self.call_new_seller_order_hook(&groups).await;

        let strategy = classify(plan.is_food_order, groups.len());
        info!("🔄️📦️ Order {order_id}: {} seller groups, strategy: {strategy}", groups.len());
        let assignment = match strategy {
            DispatchStrategy::Direct(_) => self.dispatch_direct(&order).await?,
            DispatchStrategy::HubConsolidation => {
                self.db.defer_for_consolidation(order_id).await?;
                AssignmentResult::Deferred
            },
        };
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| FulfilmentError::OrderNotFound(order_id.clone()))?;
        debug!("🔄️📦️ Order {order_id} processing complete");
        Ok(FulfilmentOutcome::Processed { order, groups, assignment })
    }

    /// Re-run classification and assignment for an order whose earlier direct dispatch found no rider.
    ///
    /// Grouping is not repeated; the committed seller groups and food flag are re-read and fed straight back into the
    /// classifier. Calling this when the order already has an active delivery is an error, so a successful earlier
    /// attempt can never be duplicated.
    pub async fn retry_dispatch(&self, order_id: &OrderId) -> Result<AssignmentResult, FulfilmentError> {
        let order = self.db.fetch_order(order_id).await?.ok_or_else(|| FulfilmentError::OrderNotFound(order_id.clone()))?;
        if !order.is_paid {
            return Err(FulfilmentError::OrderNotPaid(order_id.clone()));
        }
        let groups = self.db.fetch_seller_groups(order_id).await?;
        if groups.is_empty() {
            return Err(FulfilmentError::OrderNotGrouped(order_id.clone()));
        }
        match classify(order.is_food_order, groups.len()) {
            DispatchStrategy::Direct(_) => {
                if self.db.fetch_active_delivery(order_id).await?.is_some() {
                    return Err(FulfilmentError::DeliveryAlreadyExists(order_id.clone()));
                }
                self.dispatch_direct(&order).await
            },
            DispatchStrategy::HubConsolidation => {
                self.db.defer_for_consolidation(order_id).await?;
                Ok(AssignmentResult::Deferred)
            },
        }
    }

    /// Direct-dispatch execution, shared by the food-priority and single-seller rules: claim the first available
    /// rider, create the delivery (committing `InTransit` atomically with it), and notify the buyer afterwards.
    ///
    /// When no rider is available, the order is left exactly as it was. That condition used to be invisible; here it
    /// is returned as [`AssignmentResult::AwaitingRider`] and surfaced through the `awaiting-rider` alert hook so
    /// operations can see stalled orders.
    async fn dispatch_direct(&self, order: &Order) -> Result<AssignmentResult, FulfilmentError> {
        let rider = match self.db.claim_available_rider().await? {
            Some(rider) => rider,
            None => {
                warn!("🔄️🛵️ No rider available for order {}. Order left awaiting dispatch.", order.order_id);
                self.call_awaiting_rider_hook(order).await;
                return Ok(AssignmentResult::AwaitingRider);
            },
        };
        let delivery = self.db.create_delivery(order, rider.id).await?;
        info!("🔄️🛵️ Order {} assigned to rider {} ({})", order.order_id, rider.id, rider.display_name);
        self.call_rider_assigned_hook(order, &delivery).await;
        Ok(AssignmentResult::Assigned { delivery })
    }

    async fn call_payment_confirmed_hook(&self, order: &Order) {
        for emitter in &self.producers.payment_confirmed_producer {
            trace!("🔄️📬️ Notifying payment-success subscribers for order {}", order.order_id);
            emitter.publish_event(PaymentConfirmedEvent::new(order.clone())).await;
        }
    }

    async fn call_new_seller_order_hook(&self, groups: &[SellerGroup]) {
        for emitter in &self.producers.new_seller_order_producer {
            for group in groups {
                let event = NewSellerOrderEvent {
                    order_id: group.order_id.clone(),
                    store_id: group.store_id,
                    seller_id: group.seller_id,
                    subtotal: group.subtotal,
                };
                emitter.publish_event(event).await;
            }
        }
    }

    async fn call_rider_assigned_hook(&self, order: &Order, delivery: &Delivery) {
        for emitter in &self.producers.rider_assigned_producer {
            emitter.publish_event(RiderAssignedEvent::new(order, delivery.clone())).await;
        }
    }

    async fn call_awaiting_rider_hook(&self, order: &Order) {
        for emitter in &self.producers.awaiting_rider_producer {
            emitter.publish_event(AwaitingRiderEvent::new(order.clone())).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
