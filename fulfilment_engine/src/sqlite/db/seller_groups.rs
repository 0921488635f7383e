use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{OrderId, SellerGroup},
    fulfilment::SellerBasket,
    traits::FulfilmentError,
};

/// Fetches the seller groups for an order, in creation order. Empty if grouping has not run.
pub async fn fetch_seller_groups(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<SellerGroup>, sqlx::Error> {
    let groups = sqlx::query_as("SELECT * FROM seller_groups WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(groups)
}

/// Inserts one seller group for a basket. The `(order_id, store_id)` unique index is the idempotency key: trying to
/// group the same order twice trips the constraint rather than duplicating rows.
pub async fn insert_group(
    order_id: &OrderId,
    basket: &SellerBasket,
    conn: &mut SqliteConnection,
) -> Result<SellerGroup, FulfilmentError> {
    let group: SellerGroup = sqlx::query_as(
        r#"
        INSERT INTO seller_groups (order_id, store_id, seller_id, subtotal, shipping_fee)
        VALUES ($1, $2, $3, $4, 0)
        RETURNING *"#,
    )
    .bind(order_id.as_str())
    .bind(basket.store_id)
    .bind(basket.seller_id)
    .bind(basket.subtotal)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        // a grouping race lost to a concurrent redelivery lands here, not in the pre-insert existence check
        if matches!(&e, sqlx::Error::Database(de) if de.is_unique_violation()) {
            FulfilmentError::OrderAlreadyGrouped(order_id.clone())
        } else {
            e.into()
        }
    })?;
    debug!("🗃️ Seller group {} created for order {order_id}, store {}", group.id, basket.store_id);
    Ok(group)
}

/// Relinks the basket's line items to their freshly-created group. Errors if any item id is missing, since a basket
/// that does not match the order's items exactly means the grouping plan is stale.
pub async fn relink_items(
    group_id: i64,
    item_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<(), FulfilmentError> {
    for item_id in item_ids {
        let rows = sqlx::query("UPDATE order_items SET seller_group_id = $1 WHERE id = $2")
            .bind(group_id)
            .bind(item_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(FulfilmentError::DatabaseError(format!(
                "Order item {item_id} does not exist; cannot link it to seller group {group_id}"
            )));
        }
    }
    trace!("🗃️ {} items linked to seller group {group_id}", item_ids.len());
    Ok(())
}
