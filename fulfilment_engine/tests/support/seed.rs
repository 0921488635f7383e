//! Fixture helpers for the fulfilment flow tests. The store/product/rider CRUD belongs to the dashboards, so the
//! tests seed those tables directly.
use mkt_common::Money;
use sqlx::SqlitePool;

pub async fn seed_store(pool: &SqlitePool, owner_id: i64, name: &str, is_food: bool) -> i64 {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO stores (owner_id, name, is_food) VALUES ($1, $2, $3) RETURNING id")
        .bind(owner_id)
        .bind(name)
        .bind(is_food)
        .fetch_one(pool)
        .await
        .expect("Error seeding store");
    id
}

pub async fn seed_product(pool: &SqlitePool, store_id: i64, name: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO products (store_id, name) VALUES ($1, $2) RETURNING id")
        .bind(store_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("Error seeding product");
    id
}

pub async fn seed_rider(pool: &SqlitePool, name: &str, available: bool) -> i64 {
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO riders (display_name, is_available) VALUES ($1, $2) RETURNING id")
            .bind(name)
            .bind(available)
            .fetch_one(pool)
            .await
            .expect("Error seeding rider");
    id
}

pub async fn seed_order(pool: &SqlitePool, order_id: &str, buyer_id: i64, shipping_fee: Money, total: Money) {
    sqlx::query(
        "INSERT INTO orders (order_id, buyer_id, payment_method, distance_km, shipping_fee, total) VALUES ($1, $2, \
         'card', 2.5, $3, $4)",
    )
    .bind(order_id)
    .bind(buyer_id)
    .bind(shipping_fee)
    .bind(total)
    .execute(pool)
    .await
    .expect("Error seeding order");
}

pub async fn seed_item(pool: &SqlitePool, order_id: &str, product_id: i64, qty: i64, unit_price: Money) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(qty)
    .bind(unit_price)
    .fetch_one(pool)
    .await
    .expect("Error seeding order item");
    id
}
