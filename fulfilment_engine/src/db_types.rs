use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use mkt_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        -------------------------------------------------------
/// The public order identifier assigned at checkout. Distinct from the internal row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// The order lifecycle. The fulfilment engine only ever writes `Processing` (hub deferral) or `InTransit` (direct
/// dispatch); the remaining transitions belong to the seller- and rider-facing dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created and is awaiting payment or dispatch.
    Pending,
    /// A multi-seller order waiting for its seller groups to be consolidated at the hub.
    Processing,
    /// The seller has handed the parcel over, but no rider is carrying it yet.
    Shipped,
    /// A rider has been assigned and the order is on its way to the buyer.
    InTransit,
    /// The order has been delivered.
    Delivered,
    /// The order has been cancelled by the buyer or an admin.
    Cancelled,
    /// The order was delivered and subsequently returned.
    Returned,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "Pending",
            OrderStatusType::Processing => "Processing",
            OrderStatusType::Shipped => "Shipped",
            OrderStatusType::InTransit => "InTransit",
            OrderStatusType::Delivered => "Delivered",
            OrderStatusType::Cancelled => "Cancelled",
            OrderStatusType::Returned => "Returned",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "InTransit" => Ok(Self::InTransit),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            "Returned" => Ok(Self::Returned),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//-------------------------------------- DeliveryStatusType    -------------------------------------------------------
/// Lifecycle of a delivery record. The engine only drives `(none) -> Assigned`; later transitions are owned by the
/// rider workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DeliveryStatusType {
    Pending,
    Assigned,
    InTransit,
    Delivered,
    Cancelled,
}

impl Display for DeliveryStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryStatusType::Pending => "Pending",
            DeliveryStatusType::Assigned => "Assigned",
            DeliveryStatusType::InTransit => "InTransit",
            DeliveryStatusType::Delivered => "Delivered",
            DeliveryStatusType::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for DeliveryStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Assigned" => Ok(Self::Assigned),
            "InTransit" => Ok(Self::InTransit),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid delivery status: {s}"))),
        }
    }
}

impl From<String> for DeliveryStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid delivery status: {value}. But this conversion cannot fail. Defaulting to Pending");
            DeliveryStatusType::Pending
        })
    }
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub buyer_id: i64,
    /// Denormalised convenience reference for single-seller orders.
    pub primary_store_id: Option<i64>,
    pub delivery_address: Option<String>,
    pub contact_phone: Option<String>,
    pub payment_method: String,
    pub distance_km: f64,
    pub shipping_fee: Money,
    pub total: Money,
    pub is_paid: bool,
    pub is_food_order: bool,
    pub is_ready_for_dispatch: bool,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderLine        -------------------------------------------------------
/// One purchased line item, joined against its product's store. This is the shape the grouping step works over: each
/// line carries the owning store, the store's seller, and the store's food flag.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i64,
    /// Unit price captured at checkout.
    pub unit_price: Money,
    /// Null until grouping has run; thereafter the id of the seller group owning this line.
    pub seller_group_id: Option<i64>,
    pub store_id: i64,
    pub seller_id: i64,
    pub store_is_food: bool,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------     SellerGroup       -------------------------------------------------------
/// One seller's slice of an order. Unique per `(order_id, store_id)`, which is what makes grouping idempotent.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SellerGroup {
    pub id: i64,
    pub order_id: OrderId,
    pub store_id: i64,
    pub seller_id: i64,
    pub subtotal: Money,
    /// Allocated separately from the order-level fee; may remain zero until shipping settlement runs.
    pub shipping_fee: Money,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      Delivery         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Delivery {
    pub id: i64,
    pub order_id: OrderId,
    pub rider_id: i64,
    pub fee: Money,
    pub status: DeliveryStatusType,
    pub assigned_at: DateTime<Utc>,
}

//--------------------------------------        Rider          -------------------------------------------------------
/// A courier. The availability flag is owned by the rider dashboard; the engine only consumes it as a selection
/// filter, and flips it when claiming the rider for a delivery.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Rider {
    pub id: i64,
    pub display_name: String,
    pub is_available: bool,
}
