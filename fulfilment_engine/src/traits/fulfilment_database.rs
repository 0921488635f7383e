use thiserror::Error;

use crate::{
    db_types::{Delivery, Order, OrderId, OrderStatusType, Rider, SellerGroup},
    fulfilment::GroupingPlan,
    traits::{OrderManagement, OrderQueryError},
};

/// The mutating operations a backend must provide to drive the fulfilment flow.
///
/// This behaviour includes:
/// * Marking orders as paid when the payment webhook fires.
/// * Persisting the seller-group fan-out of a paid order atomically.
/// * Claiming riders and creating delivery records for direct dispatch.
/// * Parking multi-seller orders for hub consolidation.
#[allow(async_fn_in_trait)]
pub trait FulfilmentDatabase: Clone + OrderManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Mark the order as paid, attaching the delivery address and contact phone captured by the payment provider.
    ///
    /// This call is idempotent: re-marking an already-paid order changes nothing and returns the current row.
    async fn mark_order_paid(
        &self,
        order_id: &OrderId,
        address: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Order, FulfilmentError>;

    /// Persist a grouping plan in a single atomic transaction:
    /// * one seller-group row per basket,
    /// * every line item relinked to its group,
    /// * the order's `is_food_order` flag updated.
    ///
    /// A failure anywhere rolls the whole transaction back; partial grouping must never be observable. If any group
    /// already exists for the order, the call fails with [`FulfilmentError::OrderAlreadyGrouped`] and changes
    /// nothing, which is what makes webhook redelivery safe.
    async fn create_seller_groups(
        &self,
        order_id: &OrderId,
        plan: &GroupingPlan,
    ) -> Result<Vec<SellerGroup>, FulfilmentError>;

    /// Claim the first available rider, flipping their availability flag in the same statement that selects them so
    /// two concurrent orders can never claim the same rider. Returns `None` when no rider is available.
    ///
    /// Selection is deliberately "first available found": no proximity, load or rating weighting.
    async fn claim_available_rider(&self) -> Result<Option<Rider>, FulfilmentError>;

    /// Atomically create a delivery for the order (`Assigned`, fee = the order's shipping fee, assigned now) and move
    /// the order to `InTransit`.
    ///
    /// Fails with [`FulfilmentError::DeliveryAlreadyExists`] if the order already has an active delivery; at most one
    /// non-cancelled delivery may exist per order.
    async fn create_delivery(&self, order: &Order, rider_id: i64) -> Result<Delivery, FulfilmentError>;

    /// Park a multi-seller order for hub consolidation: `status = Processing`, `is_ready_for_dispatch = false`.
    /// No delivery is created and no rider is assigned. The downstream hub-readiness workflow picks it up from here.
    async fn defer_for_consolidation(&self, order_id: &OrderId) -> Result<Order, FulfilmentError>;

    /// Update only the order's status. The engine itself writes `Processing` and `InTransit` through the calls above;
    /// this exists for the surrounding workflows.
    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatusType) -> Result<Order, FulfilmentError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), FulfilmentError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum FulfilmentError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} has no line items. It must never have reached fulfilment")]
    EmptyOrder(OrderId),
    #[error("Order {0} has not been paid, so it cannot be fulfilled")]
    OrderNotPaid(OrderId),
    #[error("Order {0} has already been split into seller groups")]
    OrderAlreadyGrouped(OrderId),
    #[error("Order {0} has not been grouped yet, so dispatch cannot be retried")]
    OrderNotGrouped(OrderId),
    #[error("Order {0} already has an active delivery")]
    DeliveryAlreadyExists(OrderId),
    #[error("{0}")]
    QueryError(#[from] OrderQueryError),
}

impl From<sqlx::Error> for FulfilmentError {
    fn from(e: sqlx::Error) -> Self {
        FulfilmentError::DatabaseError(e.to_string())
    }
}
