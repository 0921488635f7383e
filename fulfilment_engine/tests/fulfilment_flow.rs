//! End-to-end tests for the payment-confirmation fulfilment flow, run against a freshly-migrated SQLite database per
//! test.
use fulfilment_engine::{
    db_types::{DeliveryStatusType, OrderStatusType},
    events::EventProducers,
    fulfilment::{plan_groups, AssignmentResult},
    sqlite::db::seller_groups,
    FulfilmentError,
    FulfilmentFlowApi,
    FulfilmentOutcome,
    OrderManagement,
    SqliteDatabase,
};
use log::*;
use mkt_common::Money;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::support::{
    prepare_env::{prepare_test_env, random_db_path},
    seed::{seed_item, seed_order, seed_product, seed_rider, seed_store},
};

mod support;

async fn setup() -> FulfilmentFlowApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    FulfilmentFlowApi::new(db, EventProducers::default())
}

async fn tear_down(mut api: FulfilmentFlowApi<SqliteDatabase>) {
    use fulfilment_engine::FulfilmentDatabase;
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

#[tokio::test]
async fn multi_seller_order_is_grouped_and_parked_for_the_hub() {
    let api = setup().await;
    let pool = api.db().pool().clone();
    let store_a = seed_store(&pool, 100, "Atlas Books", false).await;
    let store_b = seed_store(&pool, 200, "Birch Homeware", false).await;
    let p1 = seed_product(&pool, store_a, "Paperback").await;
    let p2 = seed_product(&pool, store_a, "Hardcover").await;
    let p3 = seed_product(&pool, store_b, "Candle").await;
    seed_order(&pool, "ord-2001", 42, Money::from_whole(5), Money::from_whole(65)).await;
    seed_item(&pool, "ord-2001", p1, 1, Money::from_whole(10)).await;
    seed_item(&pool, "ord-2001", p3, 2, Money::from_whole(15)).await;
    seed_item(&pool, "ord-2001", p2, 1, Money::from_whole(20)).await;
    seed_rider(&pool, "Remy", true).await;

    let oid = "ord-2001".parse().unwrap();
    let outcome = api.process_paid_order(&oid, Some("12 Harbour Lane"), None).await.expect("Error processing order");
    let FulfilmentOutcome::Processed { order, groups, assignment } = outcome else {
        panic!("Expected a fresh processing outcome");
    };

    // one group per distinct store, with the store's owner as seller
    assert_eq!(groups.len(), 2);
    let group_a = groups.iter().find(|g| g.store_id == store_a).unwrap();
    let group_b = groups.iter().find(|g| g.store_id == store_b).unwrap();
    assert_eq!(group_a.seller_id, 100);
    assert_eq!(group_b.seller_id, 200);
    assert_eq!(group_a.subtotal, Money::from_whole(30));
    assert_eq!(group_b.subtotal, Money::from_whole(30));

    // every line is linked to exactly one group, and that group's store matches the line's store
    let lines = api.db().fetch_order_lines(&oid).await.unwrap();
    assert_eq!(lines.len(), 3);
    for line in &lines {
        let group = groups.iter().find(|g| Some(g.id) == line.seller_group_id).expect("line not linked to any group");
        assert_eq!(group.store_id, line.store_id);
    }

    // multi-seller, not food: parked for hub consolidation, rider untouched, no delivery
    assert_eq!(assignment, AssignmentResult::Deferred);
    assert_eq!(order.status, OrderStatusType::Processing);
    assert!(!order.is_ready_for_dispatch);
    assert!(!order.is_food_order);
    assert!(order.is_paid);
    assert_eq!(order.delivery_address.as_deref(), Some("12 Harbour Lane"));
    assert!(api.db().fetch_active_delivery(&oid).await.unwrap().is_none());
    tear_down(api).await;
}

#[tokio::test]
async fn food_order_dispatches_directly_despite_two_sellers() {
    let api = setup().await;
    let pool = api.db().pool().clone();
    let store_a = seed_store(&pool, 100, "Atlas Books", false).await;
    let store_b = seed_store(&pool, 200, "Basil Kitchen", true).await;
    let p1 = seed_product(&pool, store_a, "Paperback").await;
    let p2 = seed_product(&pool, store_b, "Laksa").await;
    seed_order(&pool, "ord-2002", 42, Money::from_whole(5), Money::from_whole(60)).await;
    seed_item(&pool, "ord-2002", p1, 2, Money::from_whole(20)).await;
    seed_item(&pool, "ord-2002", p2, 1, Money::from_whole(15)).await;
    let rider = seed_rider(&pool, "Remy", true).await;

    let oid = "ord-2002".parse().unwrap();
    let outcome = api.process_paid_order(&oid, None, None).await.expect("Error processing order");
    let FulfilmentOutcome::Processed { order, groups, assignment } = outcome else {
        panic!("Expected a fresh processing outcome");
    };

    assert_eq!(groups.len(), 2);
    assert_eq!(groups.iter().find(|g| g.store_id == store_a).unwrap().subtotal, Money::from_whole(40));
    assert_eq!(groups.iter().find(|g| g.store_id == store_b).unwrap().subtotal, Money::from_whole(15));
    // a single food line makes the entire order a food order, overriding the seller-count rule
    assert!(order.is_food_order);
    assert_eq!(order.status, OrderStatusType::InTransit);
    let AssignmentResult::Assigned { delivery } = assignment else {
        panic!("Expected a rider to be assigned");
    };
    assert_eq!(delivery.rider_id, rider);
    assert_eq!(delivery.fee, Money::from_whole(5));
    assert_eq!(delivery.status, DeliveryStatusType::Assigned);
    // the claim flipped the rider's availability
    assert!(!api.db().fetch_rider(rider).await.unwrap().unwrap().is_available);
    tear_down(api).await;
}

#[tokio::test]
async fn single_seller_order_dispatches_directly() {
    let api = setup().await;
    let pool = api.db().pool().clone();
    let store = seed_store(&pool, 100, "Atlas Books", false).await;
    let p1 = seed_product(&pool, store, "Paperback").await;
    seed_order(&pool, "ord-2003", 7, Money::from_whole(3), Money::from_whole(13)).await;
    seed_item(&pool, "ord-2003", p1, 1, Money::from_whole(10)).await;
    seed_rider(&pool, "Remy", true).await;

    let oid = "ord-2003".parse().unwrap();
    let outcome = api.process_paid_order(&oid, None, None).await.expect("Error processing order");
    let FulfilmentOutcome::Processed { order, groups, assignment } = outcome else {
        panic!("Expected a fresh processing outcome");
    };
    assert_eq!(groups.len(), 1);
    assert!(matches!(assignment, AssignmentResult::Assigned { .. }));
    assert_eq!(order.status, OrderStatusType::InTransit);
    tear_down(api).await;
}

#[tokio::test]
async fn no_rider_leaves_the_order_untouched_and_dispatch_can_be_retried() {
    let api = setup().await;
    let pool = api.db().pool().clone();
    let store = seed_store(&pool, 100, "Atlas Books", false).await;
    let p1 = seed_product(&pool, store, "Paperback").await;
    seed_order(&pool, "ord-2004", 7, Money::from_whole(3), Money::from_whole(13)).await;
    seed_item(&pool, "ord-2004", p1, 1, Money::from_whole(10)).await;

    let oid = "ord-2004".parse().unwrap();
    let outcome = api.process_paid_order(&oid, None, None).await.expect("Error processing order");
    let FulfilmentOutcome::Processed { order, assignment, .. } = outcome else {
        panic!("Expected a fresh processing outcome");
    };
    // no rider: no delivery, no status change, but the condition is visible in the result
    assert_eq!(assignment, AssignmentResult::AwaitingRider);
    assert_eq!(order.status, OrderStatusType::Pending);
    assert!(api.db().fetch_active_delivery(&oid).await.unwrap().is_none());

    // a rider comes online; retrying assigns without re-running grouping
    let rider = seed_rider(&pool, "Remy", true).await;
    let result = api.retry_dispatch(&oid).await.expect("Error retrying dispatch");
    let AssignmentResult::Assigned { delivery } = result else {
        panic!("Expected the retry to assign the new rider");
    };
    assert_eq!(delivery.rider_id, rider);
    assert_eq!(api.db().fetch_seller_groups(&oid).await.unwrap().len(), 1);

    // a further retry must not create a second delivery
    let err = api.retry_dispatch(&oid).await.unwrap_err();
    assert!(matches!(err, FulfilmentError::DeliveryAlreadyExists(_)));
    tear_down(api).await;
}

#[tokio::test]
async fn webhook_redelivery_is_idempotent() {
    let api = setup().await;
    let pool = api.db().pool().clone();
    let store = seed_store(&pool, 100, "Atlas Books", false).await;
    let p1 = seed_product(&pool, store, "Paperback").await;
    seed_order(&pool, "ord-2005", 7, Money::from_whole(3), Money::from_whole(13)).await;
    seed_item(&pool, "ord-2005", p1, 1, Money::from_whole(10)).await;
    seed_rider(&pool, "Remy", true).await;

    let oid = "ord-2005".parse().unwrap();
    let first = api.process_paid_order(&oid, None, None).await.expect("Error processing order");
    assert!(matches!(first, FulfilmentOutcome::Processed { .. }));
    let second = api.process_paid_order(&oid, None, None).await.expect("Error reprocessing order");
    assert!(matches!(second, FulfilmentOutcome::AlreadyProcessed { .. }));

    // no duplicate groups, no duplicate deliveries
    assert_eq!(api.db().fetch_seller_groups(&oid).await.unwrap().len(), 1);
    let delivery = api.db().fetch_active_delivery(&oid).await.unwrap().expect("delivery missing");
    assert_eq!(delivery.status, DeliveryStatusType::Assigned);
    tear_down(api).await;
}

#[tokio::test]
async fn two_orders_never_claim_the_same_rider() {
    let api = setup().await;
    let pool = api.db().pool().clone();
    let store = seed_store(&pool, 100, "Atlas Books", false).await;
    let p1 = seed_product(&pool, store, "Paperback").await;
    seed_order(&pool, "ord-2006", 7, Money::from_whole(3), Money::from_whole(13)).await;
    seed_item(&pool, "ord-2006", p1, 1, Money::from_whole(10)).await;
    seed_order(&pool, "ord-2007", 8, Money::from_whole(3), Money::from_whole(13)).await;
    seed_item(&pool, "ord-2007", p1, 1, Money::from_whole(10)).await;
    seed_rider(&pool, "Remy", true).await;

    let first = api.process_paid_order(&"ord-2006".parse().unwrap(), None, None).await.unwrap();
    let second = api.process_paid_order(&"ord-2007".parse().unwrap(), None, None).await.unwrap();
    let FulfilmentOutcome::Processed { assignment: a1, .. } = first else { panic!("expected processing") };
    let FulfilmentOutcome::Processed { assignment: a2, .. } = second else { panic!("expected processing") };
    assert!(matches!(a1, AssignmentResult::Assigned { .. }));
    // the only rider is claimed; the second order waits instead of double-booking
    assert_eq!(a2, AssignmentResult::AwaitingRider);
    tear_down(api).await;
}

#[tokio::test]
async fn each_backend_write_is_committed_before_the_next_step_reads() {
    use fulfilment_engine::FulfilmentDatabase;
    let api = setup().await;
    let pool = api.db().pool().clone();
    let store = seed_store(&pool, 100, "Atlas Books", false).await;
    let p1 = seed_product(&pool, store, "Paperback").await;
    seed_order(&pool, "ord-2009", 7, Money::from_whole(3), Money::from_whole(13)).await;
    seed_item(&pool, "ord-2009", p1, 1, Money::from_whole(10)).await;
    seed_rider(&pool, "Remy", true).await;

    // drive the backend directly, step after step: every mutation must be durably committed by the time the
    // following step opens its own transaction, or that transaction's write fails with a locked database
    let oid = "ord-2009".parse().unwrap();
    let db = api.db();
    let order = db.mark_order_paid(&oid, None, None).await.expect("Error marking order paid");
    assert!(order.is_paid);
    let lines = db.fetch_order_lines(&oid).await.unwrap();
    let plan = plan_groups(&oid, &lines).unwrap();
    let groups = db.create_seller_groups(&oid, &plan).await.expect("Error creating seller groups");
    assert_eq!(groups.len(), 1);
    let parked = db.defer_for_consolidation(&oid).await.expect("Error deferring order");
    assert_eq!(parked.status, OrderStatusType::Processing);
    let rider = db.claim_available_rider().await.expect("Error claiming rider").expect("No rider claimed");
    let delivery = db.create_delivery(&parked, rider.id).await.expect("Error creating delivery");
    assert_eq!(delivery.rider_id, rider.id);
    tear_down(api).await;
}

#[tokio::test]
async fn losing_the_grouping_race_reports_already_grouped() {
    let api = setup().await;
    let pool = api.db().pool().clone();
    let store = seed_store(&pool, 100, "Atlas Books", false).await;
    let p1 = seed_product(&pool, store, "Paperback").await;
    seed_order(&pool, "ord-2010", 7, Money::from_whole(3), Money::from_whole(13)).await;
    seed_item(&pool, "ord-2010", p1, 1, Money::from_whole(10)).await;
    seed_rider(&pool, "Remy", true).await;

    let oid = "ord-2010".parse().unwrap();
    api.process_paid_order(&oid, None, None).await.expect("Error processing order");

    // a competing insert for the same (order, store) trips the unique index; the loser must see
    // OrderAlreadyGrouped, not a bare database error, so the flow can treat it as a duplicate delivery
    let lines = api.db().fetch_order_lines(&oid).await.unwrap();
    let plan = plan_groups(&oid, &lines).unwrap();
    let mut conn = pool.acquire().await.unwrap();
    let err = seller_groups::insert_group(&oid, &plan.baskets[0], &mut conn).await.unwrap_err();
    assert!(matches!(err, FulfilmentError::OrderAlreadyGrouped(_)));
    assert_eq!(api.db().fetch_seller_groups(&oid).await.unwrap().len(), 1);
    tear_down(api).await;
}

#[tokio::test]
async fn unknown_and_empty_orders_are_fatal() {
    let api = setup().await;
    let pool = api.db().pool().clone();

    let err = api.process_paid_order(&"ord-none".parse().unwrap(), None, None).await.unwrap_err();
    assert!(matches!(err, FulfilmentError::OrderNotFound(_)));

    // an order with zero line items must never be fulfilled, and must not be marked paid by the attempt
    seed_order(&pool, "ord-2008", 7, Money::from_whole(3), Money::from_whole(0)).await;
    let oid = "ord-2008".parse().unwrap();
    let err = api.process_paid_order(&oid, None, None).await.unwrap_err();
    assert!(matches!(err, FulfilmentError::EmptyOrder(_)));
    let order = api.db().fetch_order(&oid).await.unwrap().unwrap();
    assert!(!order.is_paid);
    tear_down(api).await;
}
