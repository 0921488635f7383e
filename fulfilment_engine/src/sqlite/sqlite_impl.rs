//! `SqliteDatabase` is the concrete SQLite backend for the fulfilment engine.
//!
//! It implements the [`FulfilmentDatabase`] and [`OrderManagement`] traits on top of the free-function query layer in
//! [`super::db`], composing those functions inside transactions wherever the contract demands atomicity.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, deliveries, new_pool, orders, riders, seller_groups};
use crate::{
    db_types::{Delivery, Order, OrderId, OrderLine, OrderStatusType, Rider, SellerGroup},
    fulfilment::GroupingPlan,
    traits::{FulfilmentDatabase, FulfilmentError, OrderManagement, OrderQueryError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl FulfilmentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn mark_order_paid(
        &self,
        order_id: &OrderId,
        address: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Order, FulfilmentError> {
        // explicit commit, so the write is durable before the grouping transaction takes its read snapshot
        let mut tx = self.pool.begin().await?;
        let order = orders::mark_paid(order_id, address, phone, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Persists a grouping plan in a single transaction: one group row per basket, every line relinked to its group,
    /// and the order's food flag set. A failure anywhere rolls the whole lot back, so partial grouping is never
    /// observable. If the order already has groups, nothing is written and `OrderAlreadyGrouped` is returned.
    async fn create_seller_groups(
        &self,
        order_id: &OrderId,
        plan: &GroupingPlan,
    ) -> Result<Vec<SellerGroup>, FulfilmentError> {
        let mut tx = self.pool.begin().await?;
        let existing = seller_groups::fetch_seller_groups(order_id, &mut tx).await?;
        if !existing.is_empty() {
            debug!("🗃️ Order {order_id} already has {} seller groups. Refusing to group again.", existing.len());
            return Err(FulfilmentError::OrderAlreadyGrouped(order_id.clone()));
        }
        let mut groups = Vec::with_capacity(plan.baskets.len());
        for basket in &plan.baskets {
            let group = seller_groups::insert_group(order_id, basket, &mut tx).await?;
            seller_groups::relink_items(group.id, &basket.item_ids, &mut tx).await?;
            groups.push(group);
        }
        orders::set_food_flag(order_id, plan.is_food_order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} split into {} seller groups", groups.len());
        Ok(groups)
    }

    async fn claim_available_rider(&self) -> Result<Option<Rider>, FulfilmentError> {
        let mut tx = self.pool.begin().await?;
        let rider = riders::claim_available_rider(&mut tx).await?;
        tx.commit().await?;
        Ok(rider)
    }

    /// Creates the delivery and moves the order to `InTransit` in one transaction, so a crash between the two can
    /// never leave a delivery without the matching order status, or vice versa.
    async fn create_delivery(&self, order: &Order, rider_id: i64) -> Result<Delivery, FulfilmentError> {
        let mut tx = self.pool.begin().await?;
        if deliveries::fetch_active_delivery(&order.order_id, &mut tx).await?.is_some() {
            return Err(FulfilmentError::DeliveryAlreadyExists(order.order_id.clone()));
        }
        let delivery = deliveries::insert_delivery(&order.order_id, rider_id, order.shipping_fee, &mut tx).await?;
        orders::update_order_status(&order.order_id, OrderStatusType::InTransit, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} is now InTransit with rider {rider_id}", order.order_id);
        Ok(delivery)
    }

    async fn defer_for_consolidation(&self, order_id: &OrderId) -> Result<Order, FulfilmentError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::defer_for_consolidation(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} parked as Processing pending hub consolidation");
        Ok(order)
    }

    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatusType) -> Result<Order, FulfilmentError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_status(order_id, status, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), FulfilmentError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLine>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let lines = orders::fetch_order_lines(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_seller_groups(&self, order_id: &OrderId) -> Result<Vec<SellerGroup>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let groups = seller_groups::fetch_seller_groups(order_id, &mut conn).await?;
        Ok(groups)
    }

    async fn fetch_active_delivery(&self, order_id: &OrderId) -> Result<Option<Delivery>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let delivery = deliveries::fetch_active_delivery(order_id, &mut conn).await?;
        Ok(delivery)
    }

    async fn fetch_rider(&self, rider_id: i64) -> Result<Option<Rider>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let rider = riders::fetch_rider(rider_id, &mut conn).await?;
        Ok(rider)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from `MKT_DATABASE_URL` (or the default).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
