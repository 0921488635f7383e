use log::debug;
use mkt_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Delivery, OrderId},
    traits::FulfilmentError,
};

/// Fetches the order's active delivery, i.e. the most recent non-cancelled one.
pub async fn fetch_active_delivery(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Delivery>, sqlx::Error> {
    let delivery = sqlx::query_as(
        "SELECT * FROM deliveries WHERE order_id = $1 AND status != 'Cancelled' ORDER BY assigned_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(delivery)
}

/// Inserts a new delivery in `Assigned` state, stamped now. The caller is responsible for wrapping this in the same
/// transaction as the order's move to `InTransit`.
pub async fn insert_delivery(
    order_id: &OrderId,
    rider_id: i64,
    fee: Money,
    conn: &mut SqliteConnection,
) -> Result<Delivery, FulfilmentError> {
    let delivery: Delivery = sqlx::query_as(
        r#"
        INSERT INTO deliveries (order_id, rider_id, fee, status, assigned_at)
        VALUES ($1, $2, $3, 'Assigned', CURRENT_TIMESTAMP)
        RETURNING *"#,
    )
    .bind(order_id.as_str())
    .bind(rider_id)
    .bind(fee)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Delivery {} created: order {order_id} assigned to rider {rider_id}", delivery.id);
    Ok(delivery)
}
