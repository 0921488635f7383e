use thiserror::Error;

use crate::db_types::{Delivery, Order, OrderId, OrderLine, Rider, SellerGroup};

/// Read-only access to orders and their fulfilment state. Used by the flow API to load its inputs, and by tests and
/// dashboards to observe what the engine has committed.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetch the order row for the given public order id, if it exists.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError>;

    /// Fetch the order's line items, each joined against its product's store (store id, seller id and food flag).
    /// Lines are returned in insertion order.
    async fn fetch_order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLine>, OrderQueryError>;

    /// Fetch the seller groups created for the order, in creation order. Empty if grouping has not run yet.
    async fn fetch_seller_groups(&self, order_id: &OrderId) -> Result<Vec<SellerGroup>, OrderQueryError>;

    /// Fetch the order's active delivery, i.e. the most recent one that has not been cancelled.
    async fn fetch_active_delivery(&self, order_id: &OrderId) -> Result<Option<Delivery>, OrderQueryError>;

    /// Fetch a rider by id.
    async fn fetch_rider(&self, rider_id: i64) -> Result<Option<Rider>, OrderQueryError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderQueryError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderDoesNotExist(OrderId),
}

impl From<sqlx::Error> for OrderQueryError {
    fn from(e: sqlx::Error) -> Self {
        OrderQueryError::DatabaseError(e.to_string())
    }
}
