use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderId, OrderLine, OrderStatusType},
    traits::FulfilmentError,
};

/// Returns the order row for the given public `order_id`, if it exists.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches the order's line items joined against their product's store. This is the shape the grouping stage
/// consumes: every line carries its store id, the store's owner (the seller) and the store's food flag.
pub async fn fetch_order_lines(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderLine>, sqlx::Error> {
    let lines = sqlx::query_as(
        r#"
        SELECT
            order_items.id AS id,
            order_items.order_id AS order_id,
            order_items.product_id AS product_id,
            order_items.variant_id AS variant_id,
            order_items.quantity AS quantity,
            order_items.unit_price AS unit_price,
            order_items.seller_group_id AS seller_group_id,
            stores.id AS store_id,
            stores.owner_id AS seller_id,
            stores.is_food AS store_is_food
        FROM order_items
            JOIN products ON order_items.product_id = products.id
            JOIN stores ON products.store_id = stores.id
        WHERE order_items.order_id = $1
        ORDER BY order_items.id ASC"#,
    )
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

/// Marks the order as paid and attaches the delivery address and contact phone captured at payment time. Idempotent:
/// an already-paid order is returned unchanged.
pub async fn mark_paid(
    order_id: &OrderId,
    address: Option<&str>,
    phone: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Order, FulfilmentError> {
    let existing = fetch_order_by_order_id(order_id, conn).await?;
    let order = existing.ok_or_else(|| FulfilmentError::OrderNotFound(order_id.clone()))?;
    if order.is_paid {
        trace!("🗃️ Order {order_id} is already marked as paid. Nothing to do.");
        return Ok(order);
    }
    let order: Order = sqlx::query_as(
        r#"
        UPDATE orders SET
            is_paid = 1,
            delivery_address = COALESCE($1, delivery_address),
            contact_phone = COALESCE($2, contact_phone),
            updated_at = CURRENT_TIMESTAMP
        WHERE order_id = $3
        RETURNING *"#,
    )
    .bind(address)
    .bind(phone)
    .bind(order_id.as_str())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {order_id} marked as paid");
    Ok(order)
}

/// Persists the order-level food flag computed during grouping.
pub async fn set_food_flag(
    order_id: &OrderId,
    is_food_order: bool,
    conn: &mut SqliteConnection,
) -> Result<(), FulfilmentError> {
    let rows = sqlx::query(
        "UPDATE orders SET is_food_order = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2",
    )
    .bind(is_food_order)
    .bind(order_id.as_str())
    .execute(conn)
    .await?
    .rows_affected();
    if rows == 0 {
        return Err(FulfilmentError::OrderNotFound(order_id.clone()));
    }
    Ok(())
}

pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, FulfilmentError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 RETURNING *",
    )
    .bind(status.to_string())
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| FulfilmentError::OrderNotFound(order_id.clone()))
}

/// Parks a multi-seller order for hub consolidation: `Processing` and explicitly not ready for dispatch. The flag is
/// flipped back by the (separate) hub-readiness workflow, never by this engine.
pub async fn defer_for_consolidation(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Order, FulfilmentError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET
            status = 'Processing',
            is_ready_for_dispatch = 0,
            updated_at = CURRENT_TIMESTAMP
        WHERE order_id = $1
        RETURNING *"#,
    )
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| FulfilmentError::OrderNotFound(order_id.clone()))
}
