use mkt_common::Money;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db_types::{Delivery, Order, OrderId};

/// The buyer's payment has been confirmed and the order accepted for fulfilment.
///
/// Pushed to channel `user-{buyer_id}` as `payment-success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentConfirmedEvent {
    pub order: Order,
}

impl PaymentConfirmedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }

    pub fn channel(&self) -> String {
        format!("user-{}", self.order.buyer_id)
    }

    pub fn payload(&self) -> serde_json::Value {
        json!({
            "orderId": self.order.order_id,
            "message": format!("Payment received for order {}", self.order.order_id),
        })
    }
}

/// A seller has received a new (paid) slice of an order.
///
/// Pushed to channel `seller-{seller_id}` as `new-order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSellerOrderEvent {
    pub order_id: OrderId,
    pub store_id: i64,
    pub seller_id: i64,
    pub subtotal: Money,
}

impl NewSellerOrderEvent {
    pub fn channel(&self) -> String {
        format!("seller-{}", self.seller_id)
    }

    pub fn payload(&self) -> serde_json::Value {
        json!({
            "orderId": self.order_id,
            "storeId": self.store_id,
            "subtotal": self.subtotal,
        })
    }
}

/// A rider has been assigned to carry the order.
///
/// Pushed to channel `user-{buyer_id}` as `rider-assigned`, after the delivery and status change have committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderAssignedEvent {
    pub order_id: OrderId,
    pub buyer_id: i64,
    pub rider_id: i64,
    pub delivery: Delivery,
}

impl RiderAssignedEvent {
    pub fn new(order: &Order, delivery: Delivery) -> Self {
        Self { order_id: order.order_id.clone(), buyer_id: order.buyer_id, rider_id: delivery.rider_id, delivery }
    }

    pub fn channel(&self) -> String {
        format!("user-{}", self.buyer_id)
    }

    pub fn payload(&self) -> serde_json::Value {
        json!({
            "orderId": self.order_id,
            "riderId": self.rider_id,
        })
    }
}

/// Direct dispatch wanted a rider but none was available. This is an operational alert, not a user notification: the
/// order is stalled until dispatch is retried, and somebody should know about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwaitingRiderEvent {
    pub order: Order,
}

impl AwaitingRiderEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}
